//! Structural Integrity Layer: stack-based tag balance.

use rustc_hash::FxHashSet;
use sitegate_core::errors::LayerError;
use sitegate_core::types::{Finding, LayerId, Severity};

use super::{DiagnosticLayer, FindingSink, LayerContext};
use crate::markup::{snippet, LineIndex, Token, Tokenizer};

/// Built-in tracked set. Elements whose end tag HTML lets authors omit (`p`,
/// `li`, table rows and cells, `html`/`head`/`body` and the like) stay out so
/// valid documents are silent.
pub const DEFAULT_TRACKED_TAGS: &[&str] = &[
    "div", "span", "a", "ul", "ol", "table", "form", "fieldset", "legend", "section", "article",
    "header", "footer", "nav", "main", "aside", "h1", "h2", "h3", "h4", "h5", "h6", "strong", "em",
    "b", "i", "u", "small", "mark", "abbr", "cite", "q", "sub", "sup", "blockquote", "pre", "code",
    "label", "select", "textarea", "button", "figure", "figcaption", "picture", "dl", "script",
    "style", "iframe", "object", "video", "audio", "canvas", "noscript", "title", "details",
    "summary", "template",
];

/// Elements that never have a closing tag.
pub const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const UNCLOSED: &str = "structural/unclosed-tag";
const UNEXPECTED_CLOSE: &str = "structural/unexpected-close";
const UNTERMINATED: &str = "structural/unterminated-tag";

struct OpenTag {
    name: String,
    offset: usize,
}

/// Tag balance over a tracked tag set.
pub struct StructuralLayer;

impl StructuralLayer {
    fn tracked(ctx: &LayerContext<'_>) -> FxHashSet<String> {
        let configured = &ctx.config.settings.structural.tracked_tags;
        let names: Vec<String> = if configured.is_empty() {
            DEFAULT_TRACKED_TAGS.iter().map(|t| t.to_string()).collect()
        } else {
            configured.iter().map(|t| t.trim().to_ascii_lowercase()).collect()
        };
        names
            .into_iter()
            .filter(|t| !t.is_empty() && !VOID_TAGS.contains(&t.as_str()))
            .collect()
    }
}

/// Check one document. Returns findings in document order of detection.
pub fn check_balance(page: &str, src: &str, tracked: &FxHashSet<String>) -> Vec<Finding> {
    let index = LineIndex::new(src);
    let finding = |rule: &str, offset: usize, message: String, evidence: &str| {
        Finding::new(
            LayerId::Structural,
            Severity::Medium,
            rule,
            index.location(page, offset),
            message,
        )
        .with_evidence(evidence)
    };
    let excerpt = |span: std::ops::Range<usize>| snippet(src, span.start, span.end.min(span.start + 80), 0);

    let mut findings = Vec::new();
    let mut stack: Vec<OpenTag> = Vec::new();

    for token in Tokenizer::new(src) {
        match token {
            Token::StartTag {
                name,
                self_closing,
                span,
                ..
            } => {
                if !self_closing && tracked.contains(&name) {
                    stack.push(OpenTag {
                        name,
                        offset: span.start,
                    });
                }
            }
            Token::EndTag { name, span } => {
                if !tracked.contains(&name) {
                    continue;
                }
                match stack.iter().rposition(|open| open.name == name) {
                    Some(pos) => {
                        for open in stack.drain(pos + 1..) {
                            findings.push(finding(
                                UNCLOSED,
                                open.offset,
                                format!("<{}> is not closed before </{name}>", open.name),
                                &format!("<{}>", open.name),
                            ));
                        }
                        stack.pop();
                    }
                    None => findings.push(finding(
                        UNEXPECTED_CLOSE,
                        span.start,
                        format!("</{name}> has no matching <{name}>"),
                        excerpt(span.clone()),
                    )),
                }
            }
            Token::Unterminated { what, span } => findings.push(finding(
                UNTERMINATED,
                span.start,
                format!("{what} is cut off by the end of the document"),
                excerpt(span.clone()),
            )),
            Token::Comment { .. } | Token::Declaration { .. } | Token::RawText { .. } => {}
        }
    }

    for open in stack {
        findings.push(finding(
            UNCLOSED,
            open.offset,
            format!("<{}> is never closed", open.name),
            &format!("<{}>", open.name),
        ));
    }
    findings
}

impl DiagnosticLayer for StructuralLayer {
    fn id(&self) -> LayerId {
        LayerId::Structural
    }

    fn run(&self, ctx: &LayerContext<'_>, sink: &FindingSink) -> Result<(), LayerError> {
        let tracked = Self::tracked(ctx);
        for page in ctx.pages() {
            ctx.check_cancelled()?;
            for finding in check_balance(&page.url, &page.raw_html, &tracked) {
                sink.emit(finding);
            }
        }
        Ok(())
    }
}
