use crate::common::{create_test_registry, TestSetup, CF_ACCOUNT, CF_TOKEN, READER_KEY};
use page_harvest::storage::{ContentStore, QueueStatus};
use page_harvest::{BackendKind, CrawlOutcome, HarvestError};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE_URL: &str = "https://example.gov.ph/notice";

fn browser_path() -> String {
    format!("/accounts/{}/browser-rendering/json", CF_ACCOUNT)
}

#[tokio::test]
async fn test_browser_backend_saves_extracted_content() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let (registry, _config, _dir) = create_test_registry(&TestSetup::new(&uri));

    Mock::given(method("POST"))
        .and(path(browser_path()))
        .and(header("authorization", format!("Bearer {}", CF_TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "errors": [],
            "messages": [],
            "result": {
                "title": "Advisory",
                "content": "Office closed on Monday",
                "links": [
                    {"name": "Home", "friendly_name": "Agency Home", "link": "https://example.gov.ph/"},
                    {"name": "Advisories", "link": "https://example.gov.ph/advisories"}
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = registry.fetch_and_save(PAGE_URL, Some("cfbrowser")).await;
    assert!(outcome.is_success(), "unexpected outcome: {:?}", outcome);
    assert_eq!(outcome.backend(), BackendKind::BrowserRendering);

    let data = outcome.data().unwrap();
    assert_eq!(data.title, "Advisory");
    assert_eq!(data.links_summary[0].friendly_name.as_deref(), Some("Agency Home"));

    let response = outcome.to_response();
    assert_eq!(response.crawler, "cfbrowser");
    // The provider returns no id, so one is generated
    assert_eq!(response.id.as_deref(), Some(data.id.as_str()));

    let stored = registry
        .get_content_by_url(PAGE_URL, Some("cfbrowser"))
        .expect("record stored");
    assert_eq!(stored.content, "Office closed on Monday");
    assert_eq!(stored.links_summary.len(), 2);

    let store = registry.store().lock().unwrap();
    assert_eq!(store.count_queue_by_status(QueueStatus::Pending).unwrap(), 2);
}

#[tokio::test]
async fn test_browser_logical_failure_is_fetch_failure() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let (registry, _config, _dir) = create_test_registry(&TestSetup::new(&uri));

    Mock::given(method("POST"))
        .and(path(browser_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "errors": [{"code": 2001, "message": "Rendering quota exceeded"}],
            "result": null
        })))
        .mount(&server)
        .await;

    let outcome = registry.fetch_and_save(PAGE_URL, Some("cfbrowser")).await;
    match &outcome {
        CrawlOutcome::FetchFailed { backend, error } => {
            assert_eq!(*backend, BackendKind::BrowserRendering);
            assert_eq!(error, "Cloudflare Browser API error: Rendering quota exceeded");
        }
        other => panic!("expected FetchFailed, got {:?}", other),
    }
    assert_eq!(registry.store().lock().unwrap().count_pages().unwrap(), 0);
}

#[tokio::test]
async fn test_browser_http_error_is_fetch_failure() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let (registry, _config, _dir) = create_test_registry(&TestSetup::new(&uri));

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let record = registry
        .fetch_content(PAGE_URL, Some("cfbrowser"))
        .await
        .expect("only missing credentials are returned as Err");

    assert!(record.is_error());
    assert_eq!(record.title, "Error");
    assert_eq!(record.content, "");
    assert!(record.links_summary.is_empty());
    assert_eq!(
        record.error_message(),
        Some("Cloudflare Browser API error: 403 Forbidden")
    );

    // Saving an error record is refused
    let saved = registry.save_content(&record, Some("cfbrowser"));
    assert!(!saved.success);
    assert!(saved.id.is_none());
}

#[tokio::test]
async fn test_default_backend_switch_routes_requests() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let (registry, _config, _dir) = create_test_registry(&TestSetup::new(&uri));

    Mock::given(method("POST"))
        .and(path(browser_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "result": {"title": "Via browser", "content": "b", "links": []}
        })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header("authorization", format!("Bearer {}", READER_KEY).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "Via reader",
            "content": "r",
            "links_summary": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(registry.default_backend(), BackendKind::Reader);
    assert!(registry.set_default_backend("cfbrowser"));
    assert_eq!(registry.default_backend(), BackendKind::BrowserRendering);

    // Unknown names leave the default alone
    assert!(!registry.set_default_backend("puppeteer"));
    assert_eq!(registry.default_backend(), BackendKind::BrowserRendering);

    let by_default = registry.fetch_and_save("https://example.gov.ph/a", None).await;
    assert_eq!(by_default.data().unwrap().title, "Via browser");

    // Unknown per-call names resolve to the current default
    let by_unknown = registry
        .fetch_and_save("https://example.gov.ph/b", Some("puppeteer"))
        .await;
    assert_eq!(by_unknown.backend(), BackendKind::BrowserRendering);

    // An explicit known name still wins over the default
    let explicit = registry
        .fetch_and_save("https://example.gov.ph/c", Some("jina"))
        .await;
    assert_eq!(explicit.backend(), BackendKind::Reader);
    assert_eq!(explicit.data().unwrap().title, "Via reader");
}

#[tokio::test]
async fn test_fetch_content_reports_missing_credentials() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let mut setup = TestSetup::new(&uri);
    setup.with_credentials = false;
    let (registry, _config, _dir) = create_test_registry(&setup);

    let result = registry.fetch_content(PAGE_URL, Some("jina")).await;
    assert!(matches!(
        result,
        Err(HarvestError::MissingCredentials {
            backend: BackendKind::Reader,
            ..
        })
    ));
}
