//! Content Quality Layer: unfilled placeholders, filler text, duplicate attributes.

use sitegate_core::errors::LayerError;
use sitegate_core::types::{Finding, LayerId, Severity};

use super::{DiagnosticLayer, FindingSink, LayerContext};
use crate::fetcher::Page;
use crate::markup::{mask, snippet, LineIndex, MaskMode, Token, Tokenizer};
use crate::patterns::{PatternDef, PatternTable};

pub const DUPLICATE_ATTRIBUTE_RULE: &str = "content/duplicate-attribute";

pub const CONTENT_PATTERNS: &[PatternDef] = &[
    PatternDef {
        id: "content/placeholder",
        category: "placeholder",
        pattern: r"(?i)\[(?:NAME|FIRST[ _]NAME|LAST[ _]NAME|DATE|AMOUNT|COMPANY|CITY|PHONE|EMAIL|ADDRESS|TITLE|NUMBER|TBD|TODO|XX+|INSERT[^\]\n]{0,60}|YOUR[^\]\n]{0,40})\]",
        severity: Severity::High,
        message: "Unfilled placeholder",
    },
    PatternDef {
        id: "content/placeholder",
        category: "template",
        pattern: r"\{\{\s*[A-Za-z_][\w.\-]*\s*\}\}",
        severity: Severity::High,
        message: "Unrendered template variable",
    },
    PatternDef {
        id: "content/filler-text",
        category: "filler",
        pattern: r"(?i)\blorem\s+ipsum\b",
        severity: Severity::Medium,
        message: "Lorem ipsum filler text",
    },
];

/// Placeholder and filler scan over masked page text, plus a duplicate
/// attribute check over start tags.
pub struct ContentQualityLayer;

impl ContentQualityLayer {
    fn scan_text(
        page: &Page,
        table: &PatternTable,
        max_examples: usize,
        sink: &FindingSink,
    ) {
        let masked = mask(&page.raw_html, MaskMode::Markup);
        let index = LineIndex::new(&page.raw_html);
        for (n, m) in table.scan(&masked).into_iter().enumerate() {
            let mut finding = Finding::new(
                LayerId::ContentQuality,
                m.pattern.severity,
                m.pattern.id,
                index.location(&page.url, m.start),
                format!("{}: {}", m.pattern.message, m.text.trim()),
            );
            if n < max_examples {
                finding = finding.with_evidence(snippet(&masked, m.start, m.end, 40));
            }
            sink.emit(finding);
        }
    }

    fn scan_attributes(page: &Page, sink: &FindingSink) {
        let index = LineIndex::new(&page.raw_html);
        for token in Tokenizer::new(&page.raw_html) {
            let Token::StartTag {
                name, attributes, ..
            } = token
            else {
                continue;
            };
            let mut reported: Vec<&str> = Vec::new();
            for (i, attr) in attributes.iter().enumerate() {
                if reported.contains(&attr.name.as_str()) {
                    continue;
                }
                let repeats = attributes[..i].iter().any(|a| a.name == attr.name);
                if !repeats {
                    continue;
                }
                reported.push(&attr.name);
                let evidence: Vec<String> = attributes
                    .iter()
                    .filter(|a| a.name == attr.name)
                    .map(|a| match &a.value {
                        Some(v) => format!("{}=\"{v}\"", a.name),
                        None => a.name.clone(),
                    })
                    .collect();
                sink.emit(
                    Finding::new(
                        LayerId::ContentQuality,
                        Severity::Medium,
                        DUPLICATE_ATTRIBUTE_RULE,
                        index.location(&page.url, attr.offset),
                        format!("<{name}> repeats the {} attribute", attr.name),
                    )
                    .with_evidence(evidence.join(" ")),
                );
            }
        }
    }
}

impl DiagnosticLayer for ContentQualityLayer {
    fn id(&self) -> LayerId {
        LayerId::ContentQuality
    }

    fn run(&self, ctx: &LayerContext<'_>, sink: &FindingSink) -> Result<(), LayerError> {
        let table = PatternTable::compile(CONTENT_PATTERNS)?;
        let max_examples = ctx.config.settings.content.effective_max_examples();
        for page in ctx.pages() {
            ctx.check_cancelled()?;
            Self::scan_text(page, &table, max_examples, sink);
            Self::scan_attributes(page, sink);
        }
        Ok(())
    }
}
