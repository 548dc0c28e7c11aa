//! Forgiving HTML tokenizer.
//!
//! Produces a flat token stream over raw page source. It never fails: a
//! construct cut off by the end of input becomes [`Token::Unterminated`] and
//! stray `<` characters are treated as text. Byte offsets always fall on
//! UTF-8 character boundaries.

use std::ops::Range;

/// Elements whose body is raw text rather than markup.
pub(crate) const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Raw-text elements whose body is code, not page text.
pub(crate) const CODE_ELEMENTS: &[&str] = &["script", "style"];

/// One attribute of a start tag. Names are ASCII-lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
    /// Byte offset of the attribute name in the source.
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    StartTag {
        name: String,
        attributes: Vec<Attribute>,
        self_closing: bool,
        span: Range<usize>,
    },
    EndTag {
        name: String,
        span: Range<usize>,
    },
    Comment {
        span: Range<usize>,
    },
    /// Doctype, processing instruction or CDATA section.
    Declaration {
        span: Range<usize>,
    },
    /// Body of a raw-text element.
    RawText {
        element: String,
        span: Range<usize>,
    },
    /// A tag, comment or declaration the input ended inside of.
    Unterminated {
        what: &'static str,
        span: Range<usize>,
    },
}

impl Token {
    pub fn span(&self) -> Range<usize> {
        match self {
            Token::StartTag { span, .. }
            | Token::EndTag { span, .. }
            | Token::Comment { span }
            | Token::Declaration { span }
            | Token::RawText { span, .. }
            | Token::Unterminated { span, .. } => span.clone(),
        }
    }
}

/// Iterator over the tokens of one document.
pub struct Tokenizer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    /// ASCII-lowercased copy of `src`; same byte length.
    lower: String,
    pos: usize,
    pending_raw: Option<String>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            lower: src.to_ascii_lowercase(),
            pos: 0,
            pending_raw: None,
        }
    }

    /// Skip from `start` to the end of `terminator`, or to end of input.
    fn skip_until(
        &mut self,
        start: usize,
        body: usize,
        terminator: &str,
        what: &'static str,
        make: fn(Range<usize>) -> Token,
    ) -> Token {
        match self.src[body..].find(terminator) {
            Some(rel) => {
                let end = body + rel + terminator.len();
                self.pos = end;
                make(start..end)
            }
            None => {
                self.pos = self.src.len();
                Token::Unterminated {
                    what,
                    span: start..self.src.len(),
                }
            }
        }
    }

    fn tag_name_end(&self, from: usize) -> usize {
        let mut i = from;
        while i < self.bytes.len() && is_name_byte(self.bytes[i]) {
            i += 1;
        }
        i
    }

    fn skip_whitespace(&self, mut i: usize) -> usize {
        while i < self.bytes.len() && self.bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        i
    }

    fn unterminated_tag(&mut self, start: usize) -> Token {
        self.pos = self.src.len();
        Token::Unterminated {
            what: "tag",
            span: start..self.src.len(),
        }
    }

    fn end_tag(&mut self, start: usize) -> Token {
        let name_end = self.tag_name_end(start + 2);
        let name = self.lower[start + 2..name_end].to_string();
        match self.src[name_end..].find('>') {
            Some(rel) => {
                let end = name_end + rel + 1;
                self.pos = end;
                Token::EndTag {
                    name,
                    span: start..end,
                }
            }
            None => self.unterminated_tag(start),
        }
    }

    fn start_tag(&mut self, start: usize) -> Token {
        let name_end = self.tag_name_end(start + 1);
        let name = self.lower[start + 1..name_end].to_string();
        let mut attributes = Vec::new();
        let mut i = name_end;
        let self_closing;

        loop {
            i = self.skip_whitespace(i);
            match self.bytes.get(i) {
                None => return self.unterminated_tag(start),
                Some(b'>') => {
                    i += 1;
                    self_closing = false;
                    break;
                }
                Some(b'/') => {
                    if self.bytes.get(i + 1) == Some(&b'>') {
                        i += 2;
                        self_closing = true;
                        break;
                    }
                    i += 1;
                }
                Some(_) => {
                    let attr_start = i;
                    while i < self.bytes.len()
                        && !self.bytes[i].is_ascii_whitespace()
                        && !matches!(self.bytes[i], b'=' | b'>' | b'/')
                    {
                        i += 1;
                    }
                    if i == attr_start {
                        // lone '='
                        i += 1;
                        continue;
                    }
                    let attr_name = self.lower[attr_start..i].to_string();
                    i = self.skip_whitespace(i);
                    let mut value = None;
                    if self.bytes.get(i) == Some(&b'=') {
                        i = self.skip_whitespace(i + 1);
                        match self.bytes.get(i) {
                            Some(&quote @ (b'"' | b'\'')) => {
                                let close = self.src[i + 1..].find(quote as char);
                                match close {
                                    Some(rel) => {
                                        value = Some(self.src[i + 1..i + 1 + rel].to_string());
                                        i = i + 1 + rel + 1;
                                    }
                                    None => return self.unterminated_tag(start),
                                }
                            }
                            Some(_) => {
                                let value_start = i;
                                while i < self.bytes.len()
                                    && !self.bytes[i].is_ascii_whitespace()
                                    && self.bytes[i] != b'>'
                                {
                                    i += 1;
                                }
                                value = Some(self.src[value_start..i].to_string());
                            }
                            None => return self.unterminated_tag(start),
                        }
                    }
                    attributes.push(Attribute {
                        name: attr_name,
                        value,
                        offset: attr_start,
                    });
                }
            }
        }

        self.pos = i;
        if !self_closing && RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            self.pending_raw = Some(name.clone());
        }
        Token::StartTag {
            name,
            attributes,
            self_closing,
            span: start..i,
        }
    }

    /// Consume the body of a raw-text element up to its closing tag.
    fn raw_text(&mut self, name: &str) -> Option<Token> {
        let needle = format!("</{name}");
        let body_start = self.pos;
        let mut search = body_start;
        let body_end = loop {
            match self.lower[search..].find(&needle) {
                Some(rel) => {
                    let at = search + rel;
                    let after = at + needle.len();
                    if self.bytes.get(after).map_or(true, |b| !is_name_byte(*b)) {
                        break at;
                    }
                    search = after;
                }
                None => break self.src.len(),
            }
        };
        self.pos = body_end;
        (body_end > body_start).then(|| Token::RawText {
            element: name.to_string(),
            span: body_start..body_end,
        })
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if let Some(name) = self.pending_raw.take() {
            if let Some(token) = self.raw_text(&name) {
                return Some(token);
            }
        }

        loop {
            let start = self.pos + self.src.get(self.pos..)?.find('<')?;
            let rest = &self.bytes[start..];

            if rest.starts_with(b"<!--") {
                return Some(self.skip_until(start, start + 4, "-->", "comment", |span| {
                    Token::Comment { span }
                }));
            }
            if self.lower[start..].starts_with("<![cdata[") {
                return Some(self.skip_until(start, start + 9, "]]>", "CDATA section", |span| {
                    Token::Declaration { span }
                }));
            }
            if rest.starts_with(b"<?") {
                return Some(self.skip_until(
                    start,
                    start + 2,
                    "?>",
                    "processing instruction",
                    |span| Token::Declaration { span },
                ));
            }
            if rest.starts_with(b"<!") {
                return Some(self.skip_until(start, start + 2, ">", "declaration", |span| {
                    Token::Declaration { span }
                }));
            }
            if rest.starts_with(b"</") {
                if rest.get(2).is_some_and(u8::is_ascii_alphabetic) {
                    return Some(self.end_tag(start));
                }
                self.pos = start + 2;
                continue;
            }
            if rest.get(1).is_some_and(u8::is_ascii_alphabetic) {
                return Some(self.start_tag(start));
            }
            self.pos = start + 1;
        }
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':')
}
