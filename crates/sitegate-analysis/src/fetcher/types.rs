//! Fetched site model.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use reqwest::Url;
use serde::Serialize;
use sitegate_core::errors::ConfigError;

/// One fetched page.
#[derive(Debug, Clone)]
pub struct Page {
    /// Root-relative path for filesystem pages, absolute URL for HTTP pages.
    pub url: String,
    pub raw_html: String,
    pub status: u16,
    /// Response headers with lowercase names. `None` for filesystem pages.
    pub headers: Option<BTreeMap<String, String>>,
}

impl Page {
    pub fn local(url: impl Into<String>, raw_html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            raw_html: raw_html.into(),
            status: 200,
            headers: None,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()?
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_http(&self) -> bool {
        self.headers.is_some()
    }
}

/// Where the site lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteRoot {
    /// A directory tree. `entry` is set when the target named a single file.
    Local { dir: PathBuf, entry: Option<PathBuf> },
    Remote(Url),
}

impl SiteRoot {
    /// Interpret a run target. Anything with an http(s) scheme is remote,
    /// other schemes are rejected, everything else is a filesystem path.
    pub fn parse(target: &str) -> Result<Self, ConfigError> {
        let trimmed = target.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            let url = Url::parse(trimmed).map_err(|e| ConfigError::InvalidTarget {
                target: trimmed.to_string(),
                message: e.to_string(),
            })?;
            if url.host_str().is_none() {
                return Err(ConfigError::InvalidTarget {
                    target: trimmed.to_string(),
                    message: "URL has no host".to_string(),
                });
            }
            return Ok(Self::Remote(url));
        }
        if let Some((scheme, _)) = trimmed.split_once("://") {
            return Err(ConfigError::InvalidTarget {
                target: trimmed.to_string(),
                message: format!("unsupported scheme '{scheme}'"),
            });
        }
        Ok(Self::Local {
            dir: PathBuf::from(trimmed),
            entry: None,
        })
    }
}

impl fmt::Display for SiteRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { dir, entry: None } => write!(f, "{}", dir.display()),
            Self::Local {
                entry: Some(entry), ..
            } => write!(f, "{}", entry.display()),
            Self::Remote(url) => f.write_str(url.as_str()),
        }
    }
}

/// How the pages of a snapshot were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Discovery {
    SingleFile,
    Sitemap,
    Walk,
    Crawl,
}

impl Discovery {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SingleFile => "single file",
            Self::Sitemap => "sitemap",
            Self::Walk => "directory walk",
            Self::Crawl => "crawl",
        }
    }
}

/// A page listed by the sitemap that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreachablePage {
    pub url: String,
    pub reason: String,
}

/// Everything the layers scan.
#[derive(Debug, Clone)]
pub struct SiteSnapshot {
    pub root: SiteRoot,
    pub pages: Vec<Page>,
    pub discovery: Discovery,
    pub unreachable: Vec<UnreachablePage>,
    /// Public URL of a local tree, used to map absolute self-links.
    pub base_url: Option<Url>,
}

impl SiteSnapshot {
    pub fn new(root: SiteRoot, pages: Vec<Page>, discovery: Discovery) -> Self {
        Self {
            root,
            pages,
            discovery,
            unreachable: Vec::new(),
            base_url: None,
        }
    }
}

/// Result of checking one link target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Terminal 2xx/3xx, or an existing file.
    Reachable { status: u16 },
    HttpError { status: u16 },
    Missing,
    Failed { reason: String },
    /// Not checked (external checking disabled, or cancelled).
    Skipped,
}

impl ProbeOutcome {
    pub fn from_status(status: u16) -> Self {
        if (200..400).contains(&status) {
            Self::Reachable { status }
        } else {
            Self::HttpError { status }
        }
    }

    pub fn is_broken(&self) -> bool {
        matches!(
            self,
            Self::HttpError { .. } | Self::Missing | Self::Failed { .. }
        )
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reachable { status } => write!(f, "HTTP {status}"),
            Self::HttpError { status } => write!(f, "HTTP {status}"),
            Self::Missing => f.write_str("file not found"),
            Self::Failed { reason } => f.write_str(reason),
            Self::Skipped => f.write_str("not checked"),
        }
    }
}
