//! Content Fetcher: turns a run target into an ordered [`SiteSnapshot`].
//!
//! Filesystem targets are read directly (a single file, a `sitemap.xml`, or
//! a directory walk). HTTP targets use `/sitemap.xml` when it lists pages and
//! crawl breadth-first from the entry page otherwise. Every status seen while
//! fetching lands in the shared [`StatusCache`].

pub mod cache;
pub mod http_client;
mod local;
pub mod probe;
mod remote;
pub mod resolve;
pub mod sitemap;
pub mod types;

use reqwest::Url;
use sitegate_core::config::FetchConfig;
use sitegate_core::errors::{ConfigError, FetchError};
use sitegate_core::fetch_span;
use sitegate_core::traits::CancellationToken;

pub use cache::StatusCache;
pub use http_client::{HttpClient, HttpClientConfig, HttpResponse};
pub use probe::{LinkProbe, ProbeResult, SiteProbe};
pub use resolve::{resolve_href, ProbeTarget, ResolvedLink};
pub use types::{Discovery, Page, ProbeOutcome, SiteRoot, SiteSnapshot, UnreachablePage};

/// Source of the pages a run scans.
pub trait ContentSource: Send + Sync {
    fn load(&self, root: &SiteRoot, cancel: &CancellationToken) -> Result<SiteSnapshot, FetchError>;
}

/// The default source: filesystem or HTTP.
pub struct ContentFetcher {
    config: FetchConfig,
    http: Option<HttpClient>,
    cache: StatusCache,
}

impl ContentFetcher {
    pub fn new(config: FetchConfig, http: Option<HttpClient>, cache: StatusCache) -> Self {
        Self {
            config,
            http,
            cache,
        }
    }

    /// Parse `fetch.base_url`, the public URL of a local tree.
    pub fn base_url(config: &FetchConfig) -> Result<Option<Url>, ConfigError> {
        config
            .base_url
            .as_deref()
            .map(|raw| {
                Url::parse(raw).map_err(|e| ConfigError::ValidationFailed {
                    field: "fetch.base_url".to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()
    }
}

impl ContentSource for ContentFetcher {
    fn load(&self, root: &SiteRoot, cancel: &CancellationToken) -> Result<SiteSnapshot, FetchError> {
        let _span = fetch_span!(root).entered();
        match root {
            SiteRoot::Local { dir, entry } => {
                let path = entry.as_deref().unwrap_or(dir);
                let mut snapshot = local::load_local(path, &self.config, cancel)?;
                snapshot.base_url = Self::base_url(&self.config).ok().flatten();
                Ok(snapshot)
            }
            SiteRoot::Remote(url) => {
                let client = self
                    .http
                    .as_ref()
                    .ok_or_else(|| FetchError::Client("no HTTP client configured".to_string()))?;
                remote::load_remote(url, client, &self.config, &self.cache, cancel)
            }
        }
    }
}
