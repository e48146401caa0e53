use crate::common::{create_test_registry, TestSetup, READER_KEY};
use page_harvest::storage::{open_storage, ContentStore, QueueStatus};
use page_harvest::{BackendKind, CrawlOutcome, CrawlState};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE_URL: &str = "https://example.gov.ph/";

fn reader_body(id: &str, content: &str, links: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "title": "Department Notice",
        "content": content,
        "links_summary": links,
    })
}

/// Mounts a reader mock that checks the bearer key and reader headers
async fn mount_reader(server: &MockServer, body: serde_json::Value, times: Option<u64>) {
    let mock = Mock::given(method("GET"))
        .and(header("authorization", format!("Bearer {}", READER_KEY).as_str()))
        .and(header("x-with-links-summary", "true"))
        .and(header("x-retain-images", "none"))
        .and(header("x-proxy", "ph"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body));

    match times {
        Some(n) => mock.up_to_n_times(n).mount(server).await,
        None => mock.mount(server).await,
    }
}

#[tokio::test]
async fn test_fetch_and_save_end_to_end() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let (registry, config, _dir) = create_test_registry(&TestSetup::new(&uri));

    mount_reader(
        &server,
        reader_body(
            "jina-page-1",
            "Hello",
            json!([
                {"name": "Home", "link": "https://example.gov.ph/home"},
                {"name": "Email us", "link": "mailto:info@example.gov.ph"},
                {"name": "Relative", "link": "/contact"}
            ]),
        ),
        None,
    )
    .await;

    let outcome = registry.fetch_and_save(PAGE_URL, None).await;
    assert!(outcome.is_success(), "unexpected outcome: {:?}", outcome);
    assert_eq!(outcome.state(), CrawlState::Saved);
    assert_eq!(outcome.backend(), BackendKind::Reader);

    let response = outcome.to_response();
    assert_eq!(response.message, "Successfully fetched and saved content");
    assert_eq!(response.id.as_deref(), Some("jina-page-1"));
    assert_eq!(response.crawler, "jina");

    let store = registry.store().lock().unwrap();

    let page = store.get_page(PAGE_URL).unwrap().expect("page stored");
    assert_eq!(page.id, "jina-page-1");
    assert_eq!(page.title, "Department Notice");
    assert_eq!(page.raw_content, "Hello");
    assert_eq!(page.cleaned_content, "Hello");
    assert_eq!(page.status, "completed");
    assert_eq!(page.content_hash, "8b1a9953c4611296a827abf8c47804d7");

    // Every link is stored, in extraction order
    let links = store.get_links(&page.id).unwrap();
    assert_eq!(links.len(), 3);
    assert_eq!(links[0].target_url, "https://example.gov.ph/home");
    assert_eq!(links[0].anchor_text, "Home");
    assert_eq!(links[0].position_in_page, 0);
    assert_eq!(links[1].position_in_page, 1);
    assert_eq!(links[2].target_url, "/contact");

    // Only absolute http(s) targets are queued
    let entry = store
        .get_queue_entry("https://example.gov.ph/home")
        .unwrap()
        .expect("home queued");
    assert_eq!(entry.status, QueueStatus::Pending);
    assert_eq!(entry.priority, 0);
    assert!(store.get_queue_entry("mailto:info@example.gov.ph").unwrap().is_none());
    assert!(store.get_queue_entry("/contact").unwrap().is_none());
    assert_eq!(store.count_queue_by_status(QueueStatus::Pending).unwrap(), 1);
    drop(store);

    // The stored record survives reopening the database file
    drop(registry);
    let reopened = open_storage(Path::new(&config.storage.database_path)).unwrap();
    let record = reopened.get_by_url(PAGE_URL).unwrap().expect("record stored");
    assert_eq!(record.id, "jina-page-1");
    assert_eq!(record.content, "Hello");
    assert_eq!(record.links_summary.len(), 3);
    assert_eq!(record.links_summary[0].link, "https://example.gov.ph/home");
    assert!(record.error.is_none());
}

#[tokio::test]
async fn test_refetch_updates_page_in_place() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let (registry, _config, _dir) = create_test_registry(&TestSetup::new(&uri));

    mount_reader(
        &server,
        reader_body(
            "first-id",
            "v1",
            json!([
                {"name": "A", "link": "https://example.gov.ph/a"},
                {"name": "B", "link": "https://example.gov.ph/b"},
                {"name": "C", "link": "https://example.gov.ph/c"}
            ]),
        ),
        Some(1),
    )
    .await;
    mount_reader(
        &server,
        reader_body(
            "second-id",
            "v2",
            json!([{"name": "D", "link": "https://example.gov.ph/d"}]),
        ),
        None,
    )
    .await;

    let first = registry.fetch_and_save(PAGE_URL, None).await;
    let second = registry.fetch_and_save(PAGE_URL, None).await;
    assert!(first.is_success());
    assert!(second.is_success());

    // The page keeps the id it was created with
    assert_eq!(first.to_response().id.as_deref(), Some("first-id"));
    assert_eq!(second.to_response().id.as_deref(), Some("first-id"));

    let store = registry.store().lock().unwrap();
    assert_eq!(store.count_pages().unwrap(), 1);

    let page = store.get_page(PAGE_URL).unwrap().unwrap();
    assert_eq!(page.raw_content, "v2");
    assert!(page.updated_at >= page.created_at);

    // Replace retention drops the first link set
    let record = store.get_by_url(PAGE_URL).unwrap().unwrap();
    assert_eq!(record.links_summary.len(), 1);
    assert_eq!(record.links_summary[0].link, "https://example.gov.ph/d");
    assert_eq!(store.count_links().unwrap(), 1);

    // Queue entries from the first crawl remain
    assert_eq!(store.count_queue_by_status(QueueStatus::Pending).unwrap(), 4);
}

#[tokio::test]
async fn test_accumulate_retention_keeps_link_history() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let mut setup = TestSetup::new(&uri);
    setup.link_retention = "accumulate";
    let (registry, _config, _dir) = create_test_registry(&setup);

    mount_reader(
        &server,
        reader_body("p", "v1", json!([{"name": "A", "link": "https://example.gov.ph/a"}])),
        Some(1),
    )
    .await;
    mount_reader(
        &server,
        reader_body("p", "v2", json!([{"name": "B", "link": "https://example.gov.ph/b"}])),
        None,
    )
    .await;

    assert!(registry.fetch_and_save(PAGE_URL, None).await.is_success());
    // Link rows from separate crawls must not share a timestamp
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    assert!(registry.fetch_and_save(PAGE_URL, None).await.is_success());

    let store = registry.store().lock().unwrap();
    assert_eq!(store.count_links().unwrap(), 2);

    let record = store.get_by_url(PAGE_URL).unwrap().unwrap();
    assert_eq!(record.links_summary.len(), 1);
    assert_eq!(record.links_summary[0].link, "https://example.gov.ph/b");
}

#[tokio::test]
async fn test_accumulate_recrawl_without_links_reads_empty() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let mut setup = TestSetup::new(&uri);
    setup.link_retention = "accumulate";
    let (registry, _config, _dir) = create_test_registry(&setup);

    mount_reader(
        &server,
        reader_body("p", "v1", json!([{"name": "Old", "link": "https://old.ph/"}])),
        Some(1),
    )
    .await;
    mount_reader(&server, reader_body("p", "v2", json!([])), None).await;

    assert!(registry.fetch_and_save(PAGE_URL, None).await.is_success());
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    assert!(registry.fetch_and_save(PAGE_URL, None).await.is_success());

    let record = registry
        .get_content_by_url(PAGE_URL, None)
        .expect("record stored");
    assert_eq!(record.content, "v2");
    assert!(record.links_summary.is_empty());
}

#[tokio::test]
async fn test_reused_upstream_id_saves_both_pages() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let (registry, _config, _dir) = create_test_registry(&TestSetup::new(&uri));

    mount_reader(&server, reader_body("same", "Body", json!([])), None).await;

    let first = registry.fetch_and_save("https://a.gov.ph/", None).await;
    let second = registry.fetch_and_save("https://b.gov.ph/", None).await;
    assert_eq!(first.state(), CrawlState::Saved);
    assert_eq!(second.state(), CrawlState::Saved, "unexpected outcome: {:?}", second);

    let store = registry.store().lock().unwrap();
    assert_eq!(store.count_pages().unwrap(), 2);

    let a = store.get_page("https://a.gov.ph/").unwrap().unwrap();
    let b = store.get_page("https://b.gov.ph/").unwrap().unwrap();
    assert_eq!(a.id, "same");
    assert_ne!(b.id, a.id);
}

#[tokio::test]
async fn test_upstream_error_skips_save() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let (registry, _config, _dir) = create_test_registry(&TestSetup::new(&uri));

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = registry.fetch_and_save(PAGE_URL, None).await;
    assert!(matches!(outcome, CrawlOutcome::FetchFailed { .. }));
    assert_eq!(outcome.state(), CrawlState::FetchFailed);

    let response = outcome.to_response();
    assert!(!response.success);
    assert_eq!(response.message, "Failed to fetch content from crawler");
    assert_eq!(
        response.error.as_deref(),
        Some("Jina API error: 500 Internal Server Error")
    );
    assert!(response.id.is_none());
    assert!(response.data.is_none());

    let store = registry.store().lock().unwrap();
    assert_eq!(store.count_pages().unwrap(), 0);
    assert!(store.get_by_url(PAGE_URL).unwrap().is_none());
}

#[tokio::test]
async fn test_malformed_upstream_body_is_fetch_failure() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let (registry, _config, _dir) = create_test_registry(&TestSetup::new(&uri));

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let outcome = registry.fetch_and_save(PAGE_URL, None).await;
    assert_eq!(outcome.state(), CrawlState::FetchFailed);
    assert_eq!(registry.store().lock().unwrap().count_pages().unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_link_targets_queued_once() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let (registry, _config, _dir) = create_test_registry(&TestSetup::new(&uri));

    // Both pages link to the same target
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "Shared",
            "content": "body",
            "links_summary": [{"name": "News", "link": "https://example.gov.ph/news"}]
        })))
        .mount(&server)
        .await;

    let first = registry.fetch_and_save("https://example.gov.ph/one", None).await;
    let second = registry.fetch_and_save("https://example.gov.ph/two", None).await;
    assert!(first.is_success());
    assert!(second.is_success());

    let store = registry.store().lock().unwrap();
    assert_eq!(store.count_pages().unwrap(), 2);
    assert_eq!(store.count_links().unwrap(), 2);
    assert_eq!(store.count_queue_by_status(QueueStatus::Pending).unwrap(), 1);

    let pending = store.pending_queue(10).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].url, "https://example.gov.ph/news");
}

#[tokio::test]
async fn test_missing_credentials_abort_before_upstream_call() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let mut setup = TestSetup::new(&uri);
    setup.with_credentials = false;
    let (registry, _config, _dir) = create_test_registry(&setup);

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = registry.fetch_and_save(PAGE_URL, None).await;
    assert!(matches!(
        outcome,
        CrawlOutcome::Aborted {
            backend: BackendKind::Reader,
            ..
        }
    ));

    let response = outcome.to_response();
    assert!(!response.success);
    assert_eq!(response.message, "Error in fetch and save operation");
    assert!(response.error.unwrap().contains("credentials not configured"));

    let outcome = registry.fetch_and_save(PAGE_URL, Some("cfbrowser")).await;
    assert!(matches!(
        outcome,
        CrawlOutcome::Aborted {
            backend: BackendKind::BrowserRendering,
            ..
        }
    ));
}

#[tokio::test]
async fn test_concurrent_fetches_share_one_store() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let (registry, _config, _dir) = create_test_registry(&TestSetup::new(&uri));

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "Page",
            "content": "body",
            "links_summary": [{"name": "Hub", "link": "https://example.gov.ph/hub"}]
        })))
        .mount(&server)
        .await;

    let registry = Arc::new(registry);
    let mut handles = Vec::new();
    for i in 0..5 {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            let url = format!("https://example.gov.ph/page/{}", i);
            registry.fetch_and_save(&url, None).await
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().is_success());
    }

    let store = registry.store().lock().unwrap();
    assert_eq!(store.count_pages().unwrap(), 5);
    assert_eq!(store.count_links().unwrap(), 5);
    assert_eq!(store.count_queue_by_status(QueueStatus::Pending).unwrap(), 1);
}
