//! Reference Fact Store: canonical values checked against page prose.

pub mod numeric;
pub mod parser;

use std::path::{Path, PathBuf};

use sitegate_core::errors::FactStoreError;

pub use numeric::{Claim, ClaimParser, NumericValue};
pub use parser::parse_sheet;

/// Minimum length of a key's leading term to serve as a default alias.
const MIN_LEADING_TERM: usize = 4;

/// One canonical fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactEntry {
    /// Lowercase, runs of non-alphanumerics collapsed to `_`.
    pub key: String,
    /// Canonical value as written.
    pub value: String,
    /// Phrases matched in prose. Never empty.
    pub aliases: Vec<String>,
}

impl FactEntry {
    /// Build an entry. Returns `None` when the key or value is empty.
    ///
    /// Without explicit aliases the key phrase (`_` → space) is used, plus
    /// the key's leading term for multi-term keys.
    pub fn new(key: &str, value: impl Into<String>, aliases: Vec<String>) -> Option<Self> {
        let key = normalize_key(key);
        let value = value.into();
        if key.is_empty() || value.trim().is_empty() {
            return None;
        }
        let aliases = if aliases.is_empty() {
            default_aliases(&key)
        } else {
            let mut seen: Vec<String> = Vec::new();
            for alias in aliases {
                let alias = alias.split_whitespace().collect::<Vec<_>>().join(" ");
                if !alias.is_empty() && !seen.iter().any(|s| s.eq_ignore_ascii_case(&alias)) {
                    seen.push(alias);
                }
            }
            seen
        };
        Some(Self {
            key,
            value: value.trim().to_string(),
            aliases,
        })
    }
}

fn normalize_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for c in raw.trim().chars() {
        if c.is_alphanumeric() {
            if pending_sep && !key.is_empty() {
                key.push('_');
            }
            pending_sep = false;
            key.extend(c.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    key
}

fn default_aliases(key: &str) -> Vec<String> {
    let terms: Vec<&str> = key.split('_').collect();
    let mut aliases = vec![terms.join(" ")];
    if terms.len() > 1 && terms[0].chars().count() >= MIN_LEADING_TERM {
        aliases.push(terms[0].to_string());
    }
    aliases
}

/// Canonical facts for one run. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct FactStore {
    entries: Vec<FactEntry>,
    source: Option<PathBuf>,
}

impl FactStore {
    /// Load a fact sheet from disk.
    pub fn load(path: &Path) -> Result<Self, FactStoreError> {
        if !path.is_file() {
            return Err(FactStoreError::Missing {
                path: path.display().to_string(),
            });
        }
        let bytes = std::fs::read(path).map_err(|source| FactStoreError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;
        let mut store = Self::parse(&String::from_utf8_lossy(&bytes));
        store.source = Some(path.to_path_buf());
        tracing::info!(path = %path.display(), entries = store.len(), "loaded fact sheet");
        Ok(store)
    }

    pub fn parse(text: &str) -> Self {
        Self::from_entries(parse_sheet(text))
    }

    pub fn from_entries(entries: Vec<FactEntry>) -> Self {
        Self {
            entries,
            source: None,
        }
    }

    pub fn entries(&self) -> &[FactEntry] {
        &self.entries
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_normalized() {
        assert_eq!(normalize_key("  Wellness ROI (2024) "), "wellness_roi_2024");
        assert_eq!(normalize_key("--a--b--"), "a_b");
    }

    #[test]
    fn default_aliases_include_leading_term() {
        let entry = FactEntry::new("wellness_roi", "1.80", Vec::new()).unwrap();
        assert_eq!(entry.aliases, ["wellness roi", "wellness"]);

        let entry = FactEntry::new("net_income", "5", Vec::new()).unwrap();
        assert_eq!(entry.aliases, ["net income"]);

        let entry = FactEntry::new("budget", "5", vec!["Budget".into(), "budget".into()]).unwrap();
        assert_eq!(entry.aliases, ["Budget"]);
    }

    #[test]
    fn missing_sheet_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FactStore::load(&dir.path().join("facts.txt")).unwrap_err();
        assert!(matches!(err, FactStoreError::Missing { .. }));
    }

    #[test]
    fn load_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facts.txt");
        std::fs::write(&path, "Wellness ROI = 1.80\n").unwrap();
        let store = FactStore::load(&path).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].key, "wellness_roi");
        assert_eq!(store.entries()[0].value, "1.80");
        assert_eq!(store.source(), Some(path.as_path()));
    }
}
