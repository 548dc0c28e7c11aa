//! Filesystem sites: a single page file or a directory tree.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use reqwest::Url;
use sitegate_core::config::FetchConfig;
use sitegate_core::errors::{FetchError, LayerError};
use sitegate_core::traits::{Cancellable, CancellationToken};

use super::resolve::served_file;
use super::sitemap::parse_sitemap;
use super::{Discovery, Page, SiteRoot, SiteSnapshot, UnreachablePage};

pub(crate) fn load_local(
    path: &Path,
    config: &FetchConfig,
    cancel: &CancellationToken,
) -> Result<SiteSnapshot, FetchError> {
    let target = path.display().to_string();
    let meta = std::fs::metadata(path).map_err(|e| FetchError::Unreachable {
        target: target.clone(),
        reason: e.to_string(),
    })?;

    if meta.is_file() {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let html = read_page(path)?;
        let root = SiteRoot::Local {
            dir,
            entry: Some(path.to_path_buf()),
        };
        return Ok(SiteSnapshot::new(
            root,
            vec![Page::local(format!("/{name}"), html)],
            Discovery::SingleFile,
        ));
    }

    let root = SiteRoot::Local {
        dir: path.to_path_buf(),
        entry: None,
    };
    let max_pages = config.effective_max_pages();

    let sitemap_path = path.join("sitemap.xml");
    if sitemap_path.is_file() {
        let (pages, unreachable) = from_sitemap(path, &sitemap_path, max_pages, cancel)?;
        if !pages.is_empty() {
            tracing::info!(pages = pages.len(), missing = unreachable.len(), "loaded pages from sitemap.xml");
            let mut snapshot = SiteSnapshot::new(root, pages, Discovery::Sitemap);
            snapshot.unreachable = unreachable;
            return Ok(snapshot);
        }
        tracing::debug!("sitemap.xml yielded no pages, walking the tree instead");
    }

    let pages = walk(path, &config.effective_extensions(), max_pages, cancel)?;
    if pages.is_empty() {
        return Err(FetchError::Empty { target });
    }
    tracing::info!(pages = pages.len(), "loaded pages from directory walk");
    Ok(SiteSnapshot::new(root, pages, Discovery::Walk))
}

fn read_page(path: &Path) -> Result<String, FetchError> {
    std::fs::read(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .map_err(|source| FetchError::Io {
            path: path.display().to_string(),
            source,
        })
}

fn check_cancelled(cancel: &CancellationToken, target: &Path) -> Result<(), FetchError> {
    if cancel.is_cancelled() {
        return Err(FetchError::Unreachable {
            target: target.display().to_string(),
            reason: LayerError::Cancelled.to_string(),
        });
    }
    Ok(())
}

fn from_sitemap(
    dir: &Path,
    sitemap_path: &Path,
    max_pages: usize,
    cancel: &CancellationToken,
) -> Result<(Vec<Page>, Vec<UnreachablePage>), FetchError> {
    let xml = read_page(sitemap_path)?;
    let doc = parse_sitemap(&xml);
    let canonical_dir = dir.canonicalize().map_err(|source| FetchError::Io {
        path: dir.display().to_string(),
        source,
    })?;
    let mut pages: Vec<Page> = Vec::new();
    let mut unreachable = Vec::new();

    for loc in &doc.urls {
        if pages.len() >= max_pages {
            break;
        }
        check_cancelled(cancel, dir)?;
        let url_path = match Url::parse(loc) {
            Ok(url) => url.path().to_string(),
            Err(_) => loc.clone(),
        };
        let rel = url_path.trim_start_matches('/');
        match served_file(&dir.join(rel)) {
            Some(file) if !is_within(&canonical_dir, &file) => {
                tracing::warn!(%loc, "sitemap entry resolves outside the site root, skipped");
                unreachable.push(UnreachablePage {
                    url: loc.clone(),
                    reason: format!("{url_path} is outside the site root"),
                });
            }
            Some(file) => {
                let key = root_relative(dir, &file);
                if pages.iter().any(|p| p.url == key) {
                    continue;
                }
                pages.push(Page::local(key, read_page(&file)?));
            }
            None => unreachable.push(UnreachablePage {
                url: loc.clone(),
                reason: format!("no file for {url_path}"),
            }),
        }
    }
    Ok((pages, unreachable))
}

fn walk(
    dir: &Path,
    extensions: &[String],
    max_pages: usize,
    cancel: &CancellationToken,
) -> Result<Vec<Page>, FetchError> {
    let mut files: Vec<PathBuf> = Vec::new();
    let walker = WalkBuilder::new(dir)
        .standard_filters(false)
        .hidden(true)
        .follow_links(false)
        .build();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("walk: {e}");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let keep = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)));
        if keep {
            files.push(entry.into_path());
        }
    }

    let mut keyed: Vec<(String, PathBuf)> = files
        .into_iter()
        .map(|f| (root_relative(dir, &f), f))
        .collect();
    keyed.sort();
    if keyed.len() > max_pages {
        tracing::warn!(found = keyed.len(), max_pages, "page limit reached, extra files skipped");
        keyed.truncate(max_pages);
    }

    let mut pages = Vec::with_capacity(keyed.len());
    for (key, file) in keyed {
        check_cancelled(cancel, dir)?;
        match read_page(&file) {
            Ok(html) => pages.push(Page::local(key, html)),
            Err(e) => tracing::warn!("skipping unreadable page: {e}"),
        }
    }
    Ok(pages)
}

/// Whether `file` resolves to a path under the canonical `root`.
fn is_within(root: &Path, file: &Path) -> bool {
    file.canonicalize().is_ok_and(|f| f.starts_with(root))
}

/// `/a/b.html` form of a file under `dir`.
fn root_relative(dir: &Path, file: &Path) -> String {
    let rel = file.strip_prefix(dir).unwrap_or(file);
    let joined = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{joined}")
}
