//! Fact Consistency Layer: numbers in prose checked against the fact store.
//!
//! Every alias of every numeric fact is located in the page's prose with one
//! Aho-Corasick pass. The first number after the alias, within the same
//! sentence, is the claim. A claim that disagrees with the canonical value
//! at the canonical precision is a critical finding.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use rustc_hash::FxHashSet;
use sitegate_core::errors::LayerError;
use sitegate_core::types::{Finding, LayerId, Severity};

use super::{DiagnosticLayer, FindingSink, LayerContext};
use crate::facts::{ClaimParser, FactEntry, NumericValue};
use crate::markup::{mask, snippet, LineIndex, MaskMode, BLOCK_BREAK};

pub const MISMATCH_RULE: &str = "facts/mismatch";

/// Longest window searched for a claim after an alias, in bytes.
const MAX_WINDOW: usize = 160;

/// A fact whose canonical value is numeric.
struct NumericFact<'a> {
    entry: &'a FactEntry,
    canonical: NumericValue,
}

/// Alias automaton over all numeric facts.
struct AliasMatcher<'a> {
    automaton: AhoCorasick,
    /// Pattern index → index into `facts`.
    owners: Vec<usize>,
    facts: Vec<NumericFact<'a>>,
}

impl<'a> AliasMatcher<'a> {
    fn build(entries: &'a [FactEntry], parser: &ClaimParser) -> Result<Option<Self>, LayerError> {
        let mut facts = Vec::new();
        let mut aliases: Vec<&str> = Vec::new();
        let mut owners = Vec::new();
        for entry in entries {
            let Some(canonical) = parser.parse_value(&entry.value) else {
                tracing::trace!(key = %entry.key, "fact is not numeric, skipped");
                continue;
            };
            for alias in &entry.aliases {
                aliases.push(alias);
                owners.push(facts.len());
            }
            facts.push(NumericFact { entry, canonical });
        }
        if aliases.is_empty() {
            return Ok(None);
        }
        let automaton = AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostLongest)
            .build(&aliases)
            .map_err(|e| LayerError::PatternCompilation {
                rule: MISMATCH_RULE.to_string(),
                message: e.to_string(),
            })?;
        Ok(Some(Self {
            automaton,
            owners,
            facts,
        }))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FactConsistencyLayer;

impl FactConsistencyLayer {
    fn check_page(
        matcher: &AliasMatcher<'_>,
        parser: &ClaimParser,
        page: &str,
        html: &str,
        sink: &FindingSink,
    ) {
        let prose = mask(html, MaskMode::Prose);
        let index = LineIndex::new(html);
        let mut reported: FxHashSet<(usize, usize)> = FxHashSet::default();

        for m in matcher.automaton.find_iter(&prose) {
            if !on_word_boundary(&prose, m.start(), m.end()) {
                continue;
            }
            let fact_idx = matcher.owners[m.pattern().as_usize()];
            let fact = &matcher.facts[fact_idx];

            let window_end = sentence_end(&prose, m.end());
            let window = &prose[m.end()..window_end];
            let Some(claim) = parser.first_claim(window) else {
                continue;
            };
            let claim_at = m.end() + claim.start;
            if !reported.insert((fact_idx, claim_at)) {
                continue;
            }
            if fact.canonical.agrees_with(claim.value) {
                continue;
            }

            let sentence = snippet(&prose, m.start(), window_end, 0);
            sink.emit(
                Finding::new(
                    LayerId::FactConsistency,
                    Severity::Critical,
                    MISMATCH_RULE,
                    index.location(page, m.start()),
                    format!(
                        "\"{}\" contradicts {}: expected {}",
                        claim.text, fact.entry.key, fact.entry.value
                    ),
                )
                .with_evidence(sentence),
            );
        }
    }
}

impl DiagnosticLayer for FactConsistencyLayer {
    fn id(&self) -> LayerId {
        LayerId::FactConsistency
    }

    fn run(&self, ctx: &LayerContext<'_>, sink: &FindingSink) -> Result<(), LayerError> {
        let Some(facts) = ctx.facts else {
            tracing::debug!("no fact store loaded");
            return Ok(());
        };
        tracing::debug!(
            source = ?facts.source(),
            entries = facts.len(),
            "checking claims against fact sheet"
        );
        let parser = ClaimParser::new().map_err(|e| LayerError::PatternCompilation {
            rule: MISMATCH_RULE.to_string(),
            message: e.to_string(),
        })?;
        let Some(matcher) = AliasMatcher::build(facts.entries(), &parser)? else {
            return Ok(());
        };

        for page in ctx.pages() {
            ctx.check_cancelled()?;
            Self::check_page(&matcher, &parser, &page.url, &page.raw_html, sink);
        }
        Ok(())
    }
}

fn on_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

/// End of the sentence starting at `from`: a block break, terminal
/// punctuation followed by whitespace, a blank line, or [`MAX_WINDOW`].
fn sentence_end(text: &str, from: usize) -> usize {
    let mut limit = (from + MAX_WINDOW).min(text.len());
    while !text.is_char_boundary(limit) {
        limit -= 1;
    }
    let window = &text[from..limit];
    let mut chars = window.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            BLOCK_BREAK => return from + i,
            '.' | '!' | '?' => {
                if chars.peek().map_or(true, |(_, next)| next.is_whitespace()) {
                    return from + i + c.len_utf8();
                }
            }
            '\n' => {
                let rest = &window[i + 1..];
                if rest.trim_start_matches([' ', '\t', '\r']).starts_with('\n') {
                    return from + i;
                }
            }
            _ => {}
        }
    }
    limit
}
