//! Blocking HTTP client with retry, exponential backoff, timeout, and gzip.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, Url};
use sitegate_core::config::FetchConfig;
use sitegate_core::errors::FetchError;

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retries after the first attempt for transport errors and 5xx.
    pub max_retries: u32,
    /// Initial backoff duration (doubles each retry).
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from(&FetchConfig::default())
    }
}

impl From<&FetchConfig> for HttpClientConfig {
    fn from(config: &FetchConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.effective_request_timeout_secs()),
            max_retries: config.effective_max_retries(),
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
            user_agent: config.effective_user_agent(),
        }
    }
}

/// A response with its body read (GET on HTML/XML) or dropped (HEAD, other types).
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Final URL after redirects.
    pub url: Url,
    pub status: u16,
    /// Header names lowercased.
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    /// Whether the body is an HTML document. A missing content type counts.
    pub fn is_html(&self) -> bool {
        self.content_type().map_or(true, |ct| {
            let ct = ct.to_ascii_lowercase();
            ct.contains("text/html") || ct.contains("application/xhtml")
        })
    }
}

/// Thread-safe HTTP client shared by the fetcher and the link probes.
#[derive(Debug, Clone)]
pub struct HttpClient {
    config: HttpClientConfig,
    client: Client,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .gzip(true)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { config, client })
    }

    /// GET a URL, reading the body of HTML and XML responses.
    pub fn get(&self, url: &Url) -> Result<HttpResponse, String> {
        let resp = self.send_with_retry(|| self.client.request(Method::GET, url.clone()))?;
        let mut out = Self::convert(&resp);
        let readable = out.content_type().map_or(true, |ct| {
            let ct = ct.to_ascii_lowercase();
            ct.contains("html") || ct.contains("xml") || ct.starts_with("text/")
        });
        if readable {
            out.body = Some(resp.text().map_err(|e| e.to_string())?);
        }
        Ok(out)
    }

    /// HEAD a URL, falling back to GET when the server rejects HEAD.
    pub fn head(&self, url: &Url) -> Result<HttpResponse, String> {
        let resp = self.send_with_retry(|| self.client.request(Method::HEAD, url.clone()))?;
        let out = Self::convert(&resp);
        if matches!(out.status, 403 | 404 | 405 | 501) {
            tracing::debug!(url = %url, status = out.status, "HEAD rejected, retrying with GET");
            let resp = self.send_with_retry(|| self.client.request(Method::GET, url.clone()))?;
            return Ok(Self::convert(&resp));
        }
        Ok(out)
    }

    /// Unified retry loop for any request.
    fn send_with_retry(&self, build: impl Fn() -> RequestBuilder) -> Result<Response, String> {
        let mut backoff = self.config.initial_backoff;
        let mut last_err = String::new();

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::debug!(
                    "http: retry attempt {}/{} after {:?}",
                    attempt,
                    self.config.max_retries,
                    backoff
                );
                std::thread::sleep(backoff);
                backoff = (backoff * 2).min(self.config.max_backoff);
            }

            match build().send() {
                Ok(resp) if resp.status().is_server_error() && attempt < self.config.max_retries => {
                    last_err = format!("HTTP {}", resp.status().as_u16());
                }
                Ok(resp) => return Ok(resp),
                Err(e) if e.is_builder() || e.is_redirect() => return Err(e.to_string()),
                Err(e) => last_err = e.to_string(),
            }
        }

        Err(last_err)
    }

    fn convert(resp: &Response) -> HttpResponse {
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        HttpResponse {
            url: resp.url().clone(),
            status: resp.status().as_u16(),
            headers,
            body: None,
        }
    }
}
