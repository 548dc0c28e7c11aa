//! Link target probing.

use std::path::Path;

use super::http_client::HttpClient;
use super::resolve::{served_file, ProbeTarget};
use super::{ProbeOutcome, StatusCache};

/// Outcome of one probe plus, when asked for and available, the HTML body.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub outcome: ProbeOutcome,
    pub body: Option<String>,
}

impl ProbeResult {
    pub fn outcome(outcome: ProbeOutcome) -> Self {
        Self {
            outcome,
            body: None,
        }
    }
}

/// Checks whether a link target resolves.
pub trait LinkProbe: Send + Sync {
    /// Probe `target`. With `want_body`, HTML targets are fetched in full so
    /// the caller can follow their links.
    fn probe(&self, target: &ProbeTarget, want_body: bool) -> ProbeResult;
}

/// Probes files on disk and URLs over HTTP, recording every outcome in the
/// shared status cache.
pub struct SiteProbe {
    http: Option<HttpClient>,
    cache: StatusCache,
    extensions: Vec<String>,
}

impl SiteProbe {
    pub fn new(http: Option<HttpClient>, cache: StatusCache, extensions: Vec<String>) -> Self {
        Self {
            http,
            cache,
            extensions,
        }
    }

    fn is_page_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
    }

    fn probe_file(&self, path: &Path, want_body: bool) -> ProbeResult {
        let Some(file) = served_file(path) else {
            return ProbeResult::outcome(ProbeOutcome::Missing);
        };
        let body = if want_body && self.is_page_file(&file) {
            match std::fs::read(&file) {
                Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
                Err(e) => {
                    return ProbeResult::outcome(ProbeOutcome::Failed {
                        reason: e.to_string(),
                    })
                }
            }
        } else {
            None
        };
        ProbeResult {
            outcome: ProbeOutcome::Reachable { status: 200 },
            body,
        }
    }

    fn probe_url(&self, url: &reqwest::Url, want_body: bool) -> ProbeResult {
        let Some(client) = &self.http else {
            return ProbeResult::outcome(ProbeOutcome::Failed {
                reason: "HTTP client unavailable".to_string(),
            });
        };
        let response = if want_body {
            client.get(url)
        } else {
            client.head(url)
        };
        match response {
            Ok(resp) => {
                let outcome = ProbeOutcome::from_status(resp.status);
                let body = (want_body && resp.is_success() && resp.is_html())
                    .then_some(resp.body)
                    .flatten();
                ProbeResult { outcome, body }
            }
            Err(reason) => ProbeResult::outcome(ProbeOutcome::Failed { reason }),
        }
    }
}

impl LinkProbe for SiteProbe {
    fn probe(&self, target: &ProbeTarget, want_body: bool) -> ProbeResult {
        if !want_body {
            if let Some(outcome) = self.cache.get(target.key()) {
                tracing::trace!(target = target.key(), "status cache hit");
                return ProbeResult::outcome(outcome);
            }
        }
        let result = match target {
            ProbeTarget::File { path, .. } => self.probe_file(path, want_body),
            ProbeTarget::Url(url) => self.probe_url(url, want_body),
        };
        self.cache.insert(target.key(), result.outcome.clone());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_probes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("blog")).unwrap();
        std::fs::write(dir.path().join("blog/index.html"), "<a href=x>").unwrap();
        std::fs::write(dir.path().join("logo.png"), [0u8, 1, 2]).unwrap();

        let cache = StatusCache::new();
        let probe = SiteProbe::new(None, cache.clone(), vec!["html".into()]);
        let target = |rel: &str| ProbeTarget::File {
            path: dir.path().join(rel),
            key: format!("/{rel}"),
        };

        let blog = probe.probe(&target("blog"), true);
        assert_eq!(blog.outcome, ProbeOutcome::Reachable { status: 200 });
        assert_eq!(blog.body.as_deref(), Some("<a href=x>"));

        let logo = probe.probe(&target("logo.png"), true);
        assert!(logo.body.is_none());
        assert!(!logo.outcome.is_broken());

        assert_eq!(probe.probe(&target("nope.html"), false).outcome, ProbeOutcome::Missing);
        assert_eq!(cache.get("/nope.html"), Some(ProbeOutcome::Missing));
    }

    #[test]
    fn url_without_client_fails() {
        let probe = SiteProbe::new(None, StatusCache::new(), Vec::new());
        let url = reqwest::Url::parse("https://example.org/").unwrap();
        assert!(probe.probe(&ProbeTarget::Url(url), false).outcome.is_broken());
    }
}
