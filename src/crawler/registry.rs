//! Backend registry and fetch-and-save orchestration

use crate::backend::{build_http_client, Backend, BackendKind, Provider, SharedStore};
use crate::backend::{BrowserRenderingClient, ReaderClient};
use crate::config::{Config, LinkRetention};
use crate::content::ContentRecord;
use crate::crawler::{CrawlOutcome, CrawlState};
use crate::storage::{open_storage, SaveResult};
use crate::url::validate_target_url;
use crate::HarvestError;
use reqwest::Client;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

/// Owns one backend per provider plus the process-wide default selection
///
/// The default can be switched at runtime through a shared reference, so a
/// registry behind an `Arc` serves concurrent callers without extra locking.
pub struct Registry {
    reader: Backend,
    browser: Backend,
    default: AtomicU8,
    store: SharedStore,
}

impl Registry {
    pub fn new(
        reader: ReaderClient,
        browser: BrowserRenderingClient,
        client: Client,
        store: SharedStore,
        link_retention: LinkRetention,
        default: BackendKind,
    ) -> Self {
        Self {
            reader: Backend::new(
                Provider::Reader(reader),
                client.clone(),
                Arc::clone(&store),
                link_retention,
            ),
            browser: Backend::new(
                Provider::BrowserRendering(browser),
                client,
                Arc::clone(&store),
                link_retention,
            ),
            default: AtomicU8::new(default.to_u8()),
            store,
        }
    }

    /// Builds both backends over an existing store
    pub fn from_config(config: &Config, store: SharedStore) -> Result<Self, HarvestError> {
        let client = build_http_client(&config.user_agent)?;

        Ok(Self::new(
            ReaderClient::from_config(&config.reader),
            BrowserRenderingClient::from_config(&config.browser_rendering),
            client,
            store,
            config.crawler.link_retention,
            config.crawler.default_backend,
        ))
    }

    /// Opens the configured database and builds both backends over it
    pub fn open(config: &Config) -> Result<Self, HarvestError> {
        let storage = open_storage(Path::new(&config.storage.database_path))?;
        Self::from_config(config, Arc::new(Mutex::new(storage)))
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn backend(&self, kind: BackendKind) -> &Backend {
        match kind {
            BackendKind::Reader => &self.reader,
            BackendKind::BrowserRendering => &self.browser,
        }
    }

    pub fn default_backend(&self) -> BackendKind {
        BackendKind::from_u8(self.default.load(Ordering::Relaxed))
    }

    /// Switches the process-wide default
    ///
    /// Unknown names are logged and leave the default unchanged.
    pub fn set_default_backend(&self, name: &str) -> bool {
        match BackendKind::from_name(name) {
            Some(kind) => {
                self.default.store(kind.to_u8(), Ordering::Relaxed);
                tracing::info!("Default crawler set to: {}", kind);
                true
            }
            None => {
                tracing::warn!(
                    "Unknown crawler type: {}, keeping {}",
                    name,
                    self.default_backend()
                );
                false
            }
        }
    }

    /// Looks up a backend by name, falling back to the current default
    pub fn resolve(&self, name: Option<&str>) -> &Backend {
        match name {
            Some(name) => match BackendKind::from_name(name) {
                Some(kind) => self.backend(kind),
                None => {
                    let fallback = self.default_backend();
                    tracing::warn!("Unknown crawler type: {}, using {}", name, fallback);
                    self.backend(fallback)
                }
            },
            None => self.backend(self.default_backend()),
        }
    }

    pub async fn fetch_content(
        &self,
        url: &str,
        backend: Option<&str>,
    ) -> Result<ContentRecord, HarvestError> {
        self.resolve(backend).fetch_content(url).await
    }

    pub fn save_content(&self, record: &ContentRecord, backend: Option<&str>) -> SaveResult {
        self.resolve(backend).save_content(record)
    }

    pub fn get_content_by_url(&self, url: &str, backend: Option<&str>) -> Option<ContentRecord> {
        self.resolve(backend).get_content_by_url(url)
    }

    /// Fetches `url` and persists the result
    ///
    /// The backend is resolved once, so a concurrent default switch cannot
    /// split one call across two providers. Targets that are not absolute
    /// http(s) URLs abort before any upstream call. Nothing is saved when the
    /// fetch yields an error record.
    pub async fn fetch_and_save(&self, url: &str, backend: Option<&str>) -> CrawlOutcome {
        let backend = self.resolve(backend);
        let kind = backend.kind();

        match run_pipeline(backend, url).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Error in fetch and save for {} via {}: {}", url, kind, e);
                CrawlOutcome::Aborted {
                    backend: kind,
                    error: e.to_string(),
                }
            }
        }
    }
}

async fn run_pipeline(backend: &Backend, url: &str) -> Result<CrawlOutcome, HarvestError> {
    let kind = backend.kind();
    validate_target_url(url)?;

    let state = CrawlState::Fetching;
    let data = backend.fetch_content(url).await?;

    if let Some(error) = data.error_message() {
        state.transition(CrawlState::FetchFailed)?;
        tracing::warn!("Fetch of {} via {} failed: {}", url, kind, error);
        return Ok(CrawlOutcome::FetchFailed {
            backend: kind,
            error: error.to_string(),
        });
    }

    let state = state
        .transition(CrawlState::Fetched)?
        .transition(CrawlState::Saving)?;

    let saved = backend.save_content(&data);
    match saved.id {
        Some(page_id) if saved.success => {
            state.transition(CrawlState::Saved)?;
            Ok(CrawlOutcome::Saved {
                backend: kind,
                data,
                page_id,
            })
        }
        _ => {
            state.transition(CrawlState::SaveFailed)?;
            Ok(CrawlOutcome::SaveFailed {
                backend: kind,
                data,
                error: saved.message,
            })
        }
    }
}
