//! Per-run cache of link statuses, shared by the fetcher and the link layer.

use moka::sync::Cache;

use super::ProbeOutcome;

const MAX_ENTRIES: u64 = 50_000;

/// Bounded in-memory status cache keyed by normalized URL or root-relative path.
/// Clones share the same storage.
#[derive(Clone)]
pub struct StatusCache {
    inner: Cache<String, ProbeOutcome>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self {
            inner: Cache::new(MAX_ENTRIES),
        }
    }

    pub fn get(&self, key: &str) -> Option<ProbeOutcome> {
        self.inner.get(key)
    }

    pub fn insert(&self, key: impl Into<String>, outcome: ProbeOutcome) {
        self.inner.insert(key.into(), outcome);
    }
}

impl Default for StatusCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StatusCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusCache")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_entries() {
        let cache = StatusCache::new();
        let other = cache.clone();
        cache.insert("https://example.org/", ProbeOutcome::from_status(200));
        assert_eq!(
            other.get("https://example.org/"),
            Some(ProbeOutcome::Reachable { status: 200 })
        );
        assert!(other.get("https://example.org/missing").is_none());
    }
}
