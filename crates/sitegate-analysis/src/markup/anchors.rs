//! Anchor extraction.

use super::tokenizer::{Token, Tokenizer};

/// An `<a href>` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub href: String,
    /// Byte offset of the `<a` tag.
    pub offset: usize,
}

/// All anchors with a non-empty `href`, in document order.
pub fn anchors(src: &str) -> Vec<Anchor> {
    Tokenizer::new(src)
        .filter_map(|token| match token {
            Token::StartTag {
                name,
                attributes,
                span,
                ..
            } if name == "a" => attributes
                .into_iter()
                .find(|a| a.name == "href")
                .and_then(|a| a.value)
                .map(|href| decode_entities(href.trim()))
                .filter(|href| !href.is_empty())
                .map(|href| Anchor {
                    href,
                    offset: span.start,
                }),
            _ => None,
        })
        .collect()
}

/// Decode the handful of entities that appear in hrefs.
fn decode_entities(href: &str) -> String {
    if !href.contains('&') {
        return href.to_string();
    }
    href.replace("&amp;", "&")
        .replace("&#38;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}
