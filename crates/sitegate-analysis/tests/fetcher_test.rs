//! Content fetcher and link probe behavior against disk trees and a local
//! HTTP server.

mod common;

use common::{page, serve, write_tree, Route};
use sitegate_analysis::fetcher::{
    ContentFetcher, ContentSource, Discovery, HttpClient, HttpClientConfig, LinkProbe,
    ProbeOutcome, ProbeTarget, SiteProbe, SiteRoot, SiteSnapshot, StatusCache,
};
use sitegate_core::config::FetchConfig;
use sitegate_core::errors::FetchError;
use sitegate_core::traits::CancellationToken;

fn fetch(target: &str, config: FetchConfig) -> Result<SiteSnapshot, FetchError> {
    let http = HttpClient::new(HttpClientConfig::from(&config)).unwrap();
    let fetcher = ContentFetcher::new(config, Some(http), StatusCache::new());
    let root = SiteRoot::parse(target).unwrap();
    fetcher.load(&root, &CancellationToken::new())
}

fn urls(snapshot: &SiteSnapshot) -> Vec<&str> {
    snapshot.pages.iter().map(|p| p.url.as_str()).collect()
}

#[test]
fn directory_walk_is_sorted_and_filtered() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(
        dir.path(),
        &[
            ("index.html", &page("Home", "<p>home</p>")),
            ("b/page.htm", &page("B", "<p>b</p>")),
            ("b/style.css", "p { color: red }"),
            (".drafts/wip.html", &page("WIP", "<p>wip</p>")),
        ],
    );

    let snapshot = fetch(dir.path().to_str().unwrap(), FetchConfig::default()).unwrap();
    assert_eq!(snapshot.discovery, Discovery::Walk);
    assert_eq!(urls(&snapshot), ["/b/page.htm", "/index.html"]);
}

#[test]
fn walk_honors_max_pages() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(
        dir.path(),
        &[("a.html", "<p>a</p>"), ("b.html", "<p>b</p>"), ("c.html", "<p>c</p>")],
    );
    let config = FetchConfig {
        max_pages: Some(2),
        ..Default::default()
    };
    let snapshot = fetch(dir.path().to_str().unwrap(), config).unwrap();
    assert_eq!(urls(&snapshot), ["/a.html", "/b.html"]);
}

#[test]
fn local_sitemap_takes_precedence() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(
        dir.path(),
        &[
            ("index.html", "<p>home</p>"),
            ("about/index.html", "<p>about</p>"),
            (
                "sitemap.xml",
                r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.org/about/</loc></url>
  <url><loc>https://example.org/retired.html</loc></url>
</urlset>"#,
            ),
        ],
    );
    let snapshot = fetch(dir.path().to_str().unwrap(), FetchConfig::default()).unwrap();
    assert_eq!(snapshot.discovery, Discovery::Sitemap);
    assert_eq!(urls(&snapshot), ["/about/index.html"]);
    assert_eq!(snapshot.unreachable.len(), 1);
    assert_eq!(snapshot.unreachable[0].url, "https://example.org/retired.html");
}

#[test]
fn sitemap_entries_cannot_leave_the_site_root() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(
        dir.path(),
        &[
            ("secret.html", "<p>not part of the site</p>"),
            ("site/index.html", "<p>home</p>"),
            (
                "site/sitemap.xml",
                "<urlset><url><loc>/index.html</loc></url><url><loc>../secret.html</loc></url></urlset>",
            ),
        ],
    );
    let site = dir.path().join("site");
    let snapshot = fetch(site.to_str().unwrap(), FetchConfig::default()).unwrap();
    assert_eq!(snapshot.discovery, Discovery::Sitemap);
    assert_eq!(urls(&snapshot), ["/index.html"]);
    assert_eq!(snapshot.unreachable.len(), 1);
    assert_eq!(snapshot.unreachable[0].url, "../secret.html");
    assert!(snapshot.unreachable[0].reason.contains("outside the site root"));
}

#[test]
fn single_file_target() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path(), &[("landing.html", "<h1>Hi</h1>")]);
    let file = dir.path().join("landing.html");
    let snapshot = fetch(file.to_str().unwrap(), FetchConfig::default()).unwrap();
    assert_eq!(snapshot.discovery, Discovery::SingleFile);
    assert_eq!(urls(&snapshot), ["/landing.html"]);
    assert!(
        matches!(&snapshot.root, SiteRoot::Local { dir: root, entry: Some(_) } if root == dir.path()),
        "{:?}",
        snapshot.root
    );
}

#[test]
fn empty_and_missing_targets() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path(), &[("notes.txt", "nothing to scan")]);
    let err = fetch(dir.path().to_str().unwrap(), FetchConfig::default()).unwrap_err();
    assert!(matches!(err, FetchError::Empty { .. }), "{err:?}");

    let missing = dir.path().join("does-not-exist");
    let err = fetch(missing.to_str().unwrap(), FetchConfig::default()).unwrap_err();
    assert!(matches!(err, FetchError::Unreachable { .. }), "{err:?}");
}

#[test]
fn remote_crawl_follows_same_origin_links() {
    let base = serve(vec![
        (
            "/",
            Route::html(page(
                "Home",
                "<a href=\"/a.html\">a</a> <a href=\"/b.html\">b</a> <a href=\"https://elsewhere.example/\">x</a>",
            ))
            .with_header("X-Frame-Options", "DENY"),
        ),
        ("/a.html", Route::html(page("A", "<a href=\"/\">home</a>"))),
        ("/b.html", Route::status(404)),
    ]);

    let snapshot = fetch(base.as_str(), FetchConfig::default()).unwrap();
    assert_eq!(snapshot.discovery, Discovery::Crawl);
    let expected_a = base.join("/a.html").unwrap();
    assert_eq!(urls(&snapshot), [base.as_str(), expected_a.as_str()]);
    assert!(snapshot.pages[0].is_http());
    assert_eq!(snapshot.pages[0].header("x-frame-options"), Some("DENY"));
}

#[test]
fn remote_sitemap_lists_pages() {
    let base = serve(vec![
        ("/", Route::html(page("Home", "<p>home</p>"))),
        (
            "/sitemap.xml",
            Route::xml(
                "<urlset><url><loc>/x.html</loc></url><url><loc>/gone.html</loc></url></urlset>",
            ),
        ),
        ("/x.html", Route::html(page("X", "<p>x</p>"))),
    ]);

    let snapshot = fetch(base.as_str(), FetchConfig::default()).unwrap();
    assert_eq!(snapshot.discovery, Discovery::Sitemap);
    assert_eq!(snapshot.pages.len(), 2);
    assert_eq!(snapshot.unreachable.len(), 1);
    assert_eq!(snapshot.unreachable[0].reason, "HTTP 404");
}

#[test]
fn remote_entry_must_answer() {
    let base = serve(vec![("/", Route::status(404))]);
    let err = fetch(base.as_str(), FetchConfig::default()).unwrap_err();
    assert!(matches!(err, FetchError::Unreachable { .. }), "{err:?}");
}

#[test]
fn link_check_uses_head_with_get_fallback_and_caches() {
    let base = serve(vec![
        ("/ok", Route::html("ok")),
        ("/strict", Route::html("strict").head_rejected()),
    ]);
    let http = HttpClient::new(HttpClientConfig::default()).unwrap();
    let cache = StatusCache::new();
    let probe = SiteProbe::new(Some(http), cache.clone(), vec!["html".into()]);

    let target = |path: &str| ProbeTarget::Url(base.join(path).unwrap());
    assert_eq!(
        probe.probe(&target("/ok"), false).outcome,
        ProbeOutcome::Reachable { status: 200 }
    );
    assert_eq!(
        probe.probe(&target("/strict"), false).outcome,
        ProbeOutcome::Reachable { status: 200 }
    );
    assert_eq!(
        probe.probe(&target("/missing"), false).outcome,
        ProbeOutcome::HttpError { status: 404 }
    );
    assert_eq!(
        cache.get(target("/missing").key()),
        Some(ProbeOutcome::HttpError { status: 404 })
    );

    let with_body = probe.probe(&target("/ok"), true);
    assert_eq!(with_body.body.as_deref(), Some("ok"));
}
