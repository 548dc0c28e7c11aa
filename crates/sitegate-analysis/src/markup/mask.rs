//! Masking of non-prose regions.
//!
//! Masked text keeps the byte length and line breaks of the source, so
//! offsets found in it map back to the original document.

use super::tokenizer::{Token, Tokenizer, CODE_ELEMENTS};

/// Marks a block boundary in prose text. Sentences never span it.
pub const BLOCK_BREAK: char = '\u{1}';

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "pre", "section", "table", "td", "textarea", "th", "title", "tr", "ul",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskMode {
    /// Blank comments, declarations and script/style bodies; keep tags
    /// and the text of titles and textareas.
    Markup,
    /// Blank everything but text content. Block-level tags leave a
    /// [`BLOCK_BREAK`] and `&nbsp;` becomes spaces.
    Prose,
}

pub fn mask(src: &str, mode: MaskMode) -> String {
    let mut out = src.as_bytes().to_vec();
    for token in Tokenizer::new(src) {
        let blank = match &token {
            Token::Comment { .. } | Token::Declaration { .. } => true,
            Token::RawText { element, .. } => CODE_ELEMENTS.contains(&element.as_str()),
            Token::Unterminated { what, .. } => mode == MaskMode::Prose || *what != "tag",
            Token::StartTag { .. } | Token::EndTag { .. } => mode == MaskMode::Prose,
        };
        if !blank {
            continue;
        }
        let span = token.span();
        blank_range(&mut out, span.clone());
        if mode == MaskMode::Prose && is_block_tag(&token) {
            out[span.start] = BLOCK_BREAK as u8;
        }
    }
    if mode == MaskMode::Prose {
        blank_entities(&mut out);
    }
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

fn is_block_tag(token: &Token) -> bool {
    match token {
        Token::StartTag { name, .. } | Token::EndTag { name, .. } => {
            BLOCK_TAGS.contains(&name.as_str())
        }
        _ => false,
    }
}

fn blank_range(out: &mut [u8], range: std::ops::Range<usize>) {
    for b in &mut out[range] {
        if *b != b'\n' {
            *b = b' ';
        }
    }
}

fn blank_entities(out: &mut [u8]) {
    const NBSP: &[&[u8]] = &[b"&nbsp;", b"&#160;", b"&#xa0;"];
    let mut i = 0;
    while i < out.len() {
        if out[i] == b'&' {
            if let Some(entity) = NBSP
                .iter()
                .find(|e| out[i..].len() >= e.len() && out[i..i + e.len()].eq_ignore_ascii_case(e))
            {
                let len = entity.len();
                blank_range(out, i..i + len);
                i += len;
                continue;
            }
        }
        i += 1;
    }
}
