//! HTTP(S) sites: sitemap first, breadth-first crawl otherwise.

use std::collections::VecDeque;

use reqwest::Url;
use rustc_hash::FxHashSet;
use sitegate_core::config::FetchConfig;
use sitegate_core::errors::FetchError;
use sitegate_core::traits::{Cancellable, CancellationToken};
use xxhash_rust::xxh3::xxh3_64;

use super::http_client::{HttpClient, HttpResponse};
use super::resolve::same_origin;
use super::sitemap::parse_sitemap;
use super::{Discovery, Page, ProbeOutcome, SiteRoot, SiteSnapshot, StatusCache, UnreachablePage};
use crate::markup::anchors;

struct Crawler<'a> {
    origin: &'a Url,
    client: &'a HttpClient,
    cache: &'a StatusCache,
    max_pages: usize,
    pages: Vec<Page>,
    /// xxh3 of every page body kept so far; identical bodies under a
    /// second URL (`/` and `/index.html`) are not scanned twice.
    bodies: FxHashSet<u64>,
}

impl<'a> Crawler<'a> {
    fn full(&self) -> bool {
        self.pages.len() >= self.max_pages
    }

    /// GET a URL and record its status. Returns the response on success.
    fn fetch(&self, url: &Url) -> Result<HttpResponse, String> {
        match self.client.get(url) {
            Ok(resp) => {
                self.cache
                    .insert(normalized(url), ProbeOutcome::from_status(resp.status));
                Ok(resp)
            }
            Err(reason) => {
                self.cache.insert(
                    normalized(url),
                    ProbeOutcome::Failed {
                        reason: reason.clone(),
                    },
                );
                Err(reason)
            }
        }
    }

    /// Keep a successful HTML response as a page. Returns false for
    /// non-HTML bodies and duplicates.
    fn keep(&mut self, url: &Url, resp: HttpResponse) -> bool {
        if !resp.is_success() || !resp.is_html() {
            return false;
        }
        let Some(body) = resp.body else {
            return false;
        };
        if !self.bodies.insert(xxh3_64(body.as_bytes())) {
            tracing::debug!(url = %url, "duplicate page body skipped");
            return false;
        }
        self.pages.push(Page {
            url: normalized(url),
            raw_html: body,
            status: resp.status,
            headers: Some(resp.headers),
        });
        true
    }

    fn same_origin_links(&self, html: &str, page: &Url) -> Vec<Url> {
        anchors(html)
            .into_iter()
            .filter_map(|a| page.join(&a.href).ok())
            .filter(|u| same_origin(u, self.origin))
            .map(|mut u| {
                u.set_fragment(None);
                u
            })
            .collect()
    }
}

pub(crate) fn load_remote(
    entry: &Url,
    client: &HttpClient,
    config: &FetchConfig,
    cache: &StatusCache,
    cancel: &CancellationToken,
) -> Result<SiteSnapshot, FetchError> {
    let target = entry.to_string();
    let mut crawler = Crawler {
        origin: entry,
        client,
        cache,
        max_pages: config.effective_max_pages(),
        pages: Vec::new(),
        bodies: FxHashSet::default(),
    };

    let first = crawler.fetch(entry).map_err(|reason| FetchError::Unreachable {
        target: target.clone(),
        reason,
    })?;
    if !first.is_success() {
        return Err(FetchError::Unreachable {
            target,
            reason: format!("HTTP {}", first.status),
        });
    }
    if !crawler.keep(entry, first) {
        return Err(FetchError::Empty { target });
    }

    let listed = sitemap_urls(&crawler, entry);
    let mut unreachable = Vec::new();
    let discovery = if listed.is_empty() {
        crawl(&mut crawler, entry, cancel);
        Discovery::Crawl
    } else {
        let mut seen: FxHashSet<String> = FxHashSet::default();
        seen.insert(normalized(entry));
        for url in listed {
            if crawler.full() || cancel.is_cancelled() {
                break;
            }
            if !seen.insert(normalized(&url)) {
                continue;
            }
            match crawler.fetch(&url) {
                Ok(resp) if resp.is_success() => {
                    crawler.keep(&url, resp);
                }
                Ok(resp) => unreachable.push(UnreachablePage {
                    url: url.to_string(),
                    reason: format!("HTTP {}", resp.status),
                }),
                Err(reason) => unreachable.push(UnreachablePage {
                    url: url.to_string(),
                    reason,
                }),
            }
        }
        Discovery::Sitemap
    };

    tracing::info!(
        pages = crawler.pages.len(),
        discovery = discovery.as_str(),
        "fetched remote site"
    );
    let mut snapshot = SiteSnapshot::new(SiteRoot::Remote(entry.clone()), crawler.pages, discovery);
    snapshot.unreachable = unreachable;
    Ok(snapshot)
}

/// Same-origin page URLs listed by `/sitemap.xml`, following one level of
/// sitemap index.
fn sitemap_urls(crawler: &Crawler<'_>, entry: &Url) -> Vec<Url> {
    let Ok(sitemap_url) = entry.join("/sitemap.xml") else {
        return Vec::new();
    };
    let Some(doc) = fetch_sitemap(crawler, &sitemap_url) else {
        return Vec::new();
    };

    let mut locs = doc.urls;
    for nested in doc.sitemaps.iter().filter_map(|s| Url::parse(s).ok()) {
        if let Some(child) = fetch_sitemap(crawler, &nested) {
            locs.extend(child.urls);
        }
    }
    locs.iter()
        .filter_map(|loc| entry.join(loc).ok())
        .filter(|u| same_origin(u, crawler.origin))
        .collect()
}

fn fetch_sitemap(crawler: &Crawler<'_>, url: &Url) -> Option<super::sitemap::SitemapDoc> {
    match crawler.client.get(url) {
        Ok(resp) if resp.is_success() => resp.body.map(|xml| parse_sitemap(&xml)),
        Ok(resp) => {
            tracing::debug!(url = %url, status = resp.status, "no sitemap");
            None
        }
        Err(reason) => {
            tracing::debug!(url = %url, "sitemap fetch failed: {reason}");
            None
        }
    }
}

fn crawl(crawler: &mut Crawler<'_>, entry: &Url, cancel: &CancellationToken) {
    let mut visited: FxHashSet<String> = FxHashSet::default();
    visited.insert(normalized(entry));
    let mut queue: VecDeque<Url> = VecDeque::new();
    if let Some(first) = crawler.pages.first() {
        queue.extend(crawler.same_origin_links(&first.raw_html, entry));
    }

    while let Some(url) = queue.pop_front() {
        if crawler.full() || cancel.is_cancelled() {
            break;
        }
        if !visited.insert(normalized(&url)) {
            continue;
        }
        let Ok(resp) = crawler.fetch(&url) else {
            continue;
        };
        if crawler.keep(&url, resp) {
            if let Some(page) = crawler.pages.last() {
                let links = crawler.same_origin_links(&page.raw_html, &url);
                queue.extend(links);
            }
        }
    }
}

/// Cache and page key of a URL: fragment removed.
pub(crate) fn normalized(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.to_string()
}
