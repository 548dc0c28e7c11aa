//! Data-driven pattern tables.
//!
//! A layer declares its checks as a static [`PatternDef`] table. The table is
//! compiled once per run into a single `RegexSet` prefilter plus one `Regex`
//! per entry, so a page is only searched by the patterns that can match it.

pub mod suppression;

use regex::{Regex, RegexSet};
use sitegate_core::errors::LayerError;
use sitegate_core::types::Severity;

pub use suppression::SuppressionChecker;

/// One declarative check. Several entries may share a rule id.
#[derive(Debug, Clone, Copy)]
pub struct PatternDef {
    pub id: &'static str,
    pub category: &'static str,
    pub pattern: &'static str,
    pub severity: Severity,
    pub message: &'static str,
}

/// A compiled [`PatternDef`].
#[derive(Debug)]
pub struct CompiledPattern {
    pub id: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub message: &'static str,
    regex: Regex,
}

/// One match of one pattern.
#[derive(Debug, Clone)]
pub struct PatternMatch<'t> {
    pub pattern: &'t CompiledPattern,
    pub start: usize,
    pub end: usize,
    pub text: &'t str,
}

/// Compiled pattern table.
#[derive(Debug)]
pub struct PatternTable {
    patterns: Vec<CompiledPattern>,
    set: RegexSet,
}

impl PatternTable {
    pub fn compile(defs: &[PatternDef]) -> Result<Self, LayerError> {
        Self::compile_filtered(defs, |_| true)
    }

    /// Compile the entries accepted by `keep`.
    pub fn compile_filtered(
        defs: &[PatternDef],
        keep: impl Fn(&PatternDef) -> bool,
    ) -> Result<Self, LayerError> {
        let mut patterns = Vec::new();
        for def in defs.iter().filter(|d| keep(d)) {
            let regex = Regex::new(def.pattern).map_err(|e| LayerError::PatternCompilation {
                rule: def.id.to_string(),
                message: e.to_string(),
            })?;
            patterns.push(CompiledPattern {
                id: def.id,
                category: def.category,
                severity: def.severity,
                message: def.message,
                regex,
            });
        }
        let set = RegexSet::new(patterns.iter().map(|p| p.regex.as_str())).map_err(|e| {
            LayerError::PatternCompilation {
                rule: "<set>".to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(Self { patterns, set })
    }

    /// All matches in `text`, ordered by offset and then table order.
    pub fn scan<'t>(&'t self, text: &'t str) -> Vec<PatternMatch<'t>> {
        let mut found: Vec<(usize, PatternMatch<'t>)> = Vec::new();
        for idx in self.set.matches(text).into_iter() {
            let pattern = &self.patterns[idx];
            tracing::trace!(rule = pattern.id, category = pattern.category, "prefilter hit");
            for m in pattern.regex.find_iter(text) {
                found.push((
                    idx,
                    PatternMatch {
                        pattern,
                        start: m.start(),
                        end: m.end(),
                        text: m.as_str(),
                    },
                ));
            }
        }
        found.sort_by_key(|(idx, m)| (m.start, *idx));
        found.into_iter().map(|(_, m)| m).collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Distinct rule ids, in table order.
    pub fn rule_ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<&'static str> = Vec::new();
        for p in &self.patterns {
            if !ids.contains(&p.id) {
                ids.push(p.id);
            }
        }
        ids
    }
}
