//! Link resolution: raw `href` → internal or external probe target.

use std::path::{Component, Path, PathBuf};

use reqwest::Url;

use super::SiteRoot;

const SKIPPED_SCHEMES: &[&str] = &["mailto:", "tel:", "javascript:", "data:", "sms:", "ftp:"];

/// Something a link can be checked against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProbeTarget {
    Url(Url),
    /// A path inside a local tree. `key` is the root-relative form (`/a/b.html`).
    File { path: PathBuf, key: String },
}

impl ProbeTarget {
    /// Identity used for deduplication and the status cache.
    pub fn key(&self) -> &str {
        match self {
            Self::Url(url) => url.as_str(),
            Self::File { key, .. } => key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedLink {
    Internal(ProbeTarget),
    External(Url),
    /// Not a checkable link (fragment-only, mailto:, ...).
    Skipped,
    /// Could not be resolved at all.
    Invalid { href: String, reason: String },
}

/// Resolve `href` found on `page_url` against the site root.
///
/// `base_url` is the public URL of a local tree; absolute links under it map
/// back onto files.
pub fn resolve_href(
    root: &SiteRoot,
    page_url: &str,
    href: &str,
    base_url: Option<&Url>,
) -> ResolvedLink {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return ResolvedLink::Skipped;
    }
    let lower = href.to_ascii_lowercase();
    if SKIPPED_SCHEMES.iter().any(|s| lower.starts_with(s)) {
        return ResolvedLink::Skipped;
    }

    match root {
        SiteRoot::Remote(origin) => resolve_remote(origin, page_url, href),
        SiteRoot::Local { dir, .. } => resolve_local(dir, page_url, href, &lower, base_url),
    }
}

fn invalid(href: &str, reason: impl Into<String>) -> ResolvedLink {
    ResolvedLink::Invalid {
        href: href.to_string(),
        reason: reason.into(),
    }
}

fn resolve_remote(origin: &Url, page_url: &str, href: &str) -> ResolvedLink {
    let base = Url::parse(page_url).unwrap_or_else(|_| origin.clone());
    let mut url = match base.join(href) {
        Ok(url) => url,
        Err(e) => return invalid(href, format!("malformed URL: {e}")),
    };
    url.set_fragment(None);
    if !matches!(url.scheme(), "http" | "https") {
        return ResolvedLink::Skipped;
    }
    if same_origin(&url, origin) {
        ResolvedLink::Internal(ProbeTarget::Url(url))
    } else {
        ResolvedLink::External(url)
    }
}

fn resolve_local(
    dir: &Path,
    page_url: &str,
    href: &str,
    lower: &str,
    base_url: Option<&Url>,
) -> ResolvedLink {
    let has_scheme = lower.starts_with("//") || lower.contains("://");
    if has_scheme {
        let absolute = if href.starts_with("//") {
            format!("https:{href}")
        } else {
            href.to_string()
        };
        let mut url = match Url::parse(&absolute) {
            Ok(url) => url,
            Err(e) => return invalid(href, format!("malformed URL: {e}")),
        };
        url.set_fragment(None);
        if !matches!(url.scheme(), "http" | "https") {
            return ResolvedLink::Skipped;
        }
        return match base_url {
            Some(base) if same_origin(&url, base) => {
                let path = url.path().to_string();
                local_target(dir, "/", &path, href)
            }
            _ => ResolvedLink::External(url),
        };
    }
    local_target(dir, page_url, href, href)
}

/// Map a relative or root-relative path onto the tree.
fn local_target(dir: &Path, page_url: &str, path: &str, href: &str) -> ResolvedLink {
    let path = path.split(['#', '?']).next().unwrap_or_default();
    if path.is_empty() {
        // "?query" only: the page itself
        return ResolvedLink::Skipped;
    }
    let decoded = percent_decode(path);

    let mut parts: Vec<String> = Vec::new();
    if !decoded.starts_with('/') {
        let page_dir = page_url.rsplit_once('/').map_or("", |(d, _)| d);
        parts.extend(
            page_dir
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
    }
    for component in Path::new(decoded.trim_start_matches('/')).components() {
        match component {
            Component::Normal(s) => parts.push(s.to_string_lossy().into_owned()),
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return invalid(href, "points outside the site root");
                }
            }
            _ => {}
        }
    }

    let rel = parts.join("/");
    let mut key = format!("/{rel}");
    if decoded.ends_with('/') && !rel.is_empty() {
        key.push('/');
    }
    ResolvedLink::Internal(ProbeTarget::File {
        path: dir.join(&rel),
        key,
    })
}

pub(crate) fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str().map(str::to_ascii_lowercase) == b.host_str().map(str::to_ascii_lowercase)
        && a.port_or_known_default() == b.port_or_known_default()
}

/// Decode `%XX` escapes. Anything that is not `%` plus two hex digits stays literal.
fn percent_decode(path: &str) -> String {
    if !path.contains('%') {
        return path.to_string();
    }
    let bytes = path.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let Some(b) = bytes.get(i + 1..i + 3).and_then(hex_byte) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_byte(pair: &[u8]) -> Option<u8> {
    let digit = |c: u8| (c as char).to_digit(16);
    Some((digit(pair[0])? * 16 + digit(pair[1])?) as u8)
}

/// Resolve a local file target to the file that would be served, if any.
pub fn served_file(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    if path.is_dir() {
        return ["index.html", "index.htm"]
            .iter()
            .map(|index| path.join(index))
            .find(|p| p.is_file());
    }
    if path.extension().is_none() {
        let with_ext = path.with_extension("html");
        if with_ext.is_file() {
            return Some(with_ext);
        }
    }
    None
}
