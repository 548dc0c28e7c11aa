//! Markup handling shared by the layers: tokenizer, masking, line mapping, anchors.

pub mod anchors;
pub mod line_index;
pub mod mask;
pub mod tokenizer;

pub use anchors::{anchors, Anchor};
pub use line_index::LineIndex;
pub use mask::{mask, MaskMode, BLOCK_BREAK};
pub use tokenizer::{Attribute, Token, Tokenizer};

/// A short excerpt of `text` around `start..end`, cut on character boundaries.
pub fn snippet(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let mut from = start.saturating_sub(radius);
    while from > 0 && !text.is_char_boundary(from) {
        from -= 1;
    }
    let mut to = end.saturating_add(radius).min(text.len());
    while to < text.len() && !text.is_char_boundary(to) {
        to += 1;
    }
    &text[from..to]
}
