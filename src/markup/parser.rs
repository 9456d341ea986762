//! Fragment tokenizer for the markup text format.
//!
//! Splits input into text runs, start/end tags, comments and declarations.
//! Tree construction and attribute coercion happen in the codec.
//!
//! All delimiters are ASCII, so every slice boundary falls on a UTF-8
//! character boundary.

// ============================================================================
// Token
// ============================================================================

/// Attribute as written in the source, value still escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawAttribute<'a> {
    pub name: &'a str,
    /// `None` for the bare `name` form.
    pub value: Option<&'a str>,
}

/// One lexical unit of a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    /// Escaped text run.
    Text(&'a str),
    /// `<name ...>` or `<name .../>`.
    StartTag {
        name: &'a str,
        attrs: Vec<RawAttribute<'a>>,
        self_closing: bool,
    },
    /// `</name>`.
    EndTag(&'a str),
    /// `<!-- ... -->`.
    Comment,
    /// `<!DOCTYPE ...>` and other `<!...>` declarations.
    Declaration,
    /// Processing instructions and CDATA sections.
    Unrecognized(&'a str),
}

// ============================================================================
// Tokenizer
// ============================================================================

/// Iterator over the tokens of a fragment.
pub(crate) struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn bytes(&self) -> &'a [u8] {
        self.input.as_bytes()
    }

    /// Position of `pattern` at or after `from`, or end of input.
    fn find_from(&self, from: usize, pattern: &str) -> Option<usize> {
        self.input
            .get(from..)
            .and_then(|rest| rest.find(pattern))
            .map(|idx| from + idx)
    }

    fn skip_spaces(&self, mut i: usize) -> usize {
        let bytes = self.bytes();
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        i
    }

    fn text(&mut self) -> Token<'a> {
        let input = self.input;
        let rest = &input[self.pos..];
        let len = rest
            .match_indices('<')
            .map(|(idx, _)| idx)
            .find(|&idx| idx > 0 && starts_markup(&rest[idx..]))
            .unwrap_or(rest.len());
        self.pos += len;
        Token::Text(&rest[..len])
    }

    /// Consumes up to and including the next `terminator`, or to the end.
    fn skip_past(&mut self, from: usize, terminator: &str) -> usize {
        let end = self
            .find_from(from, terminator)
            .map_or(self.input.len(), |idx| idx + terminator.len());
        self.pos = end;
        end
    }

    fn end_tag(&mut self) -> Token<'a> {
        let input = self.input;
        let bytes = self.bytes();
        let start = self.pos + 2;
        let mut i = start;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && !matches!(bytes[i], b'>' | b'/')
        {
            i += 1;
        }
        let name = &input[start..i];
        self.skip_past(i, ">");
        Token::EndTag(name)
    }

    fn start_tag(&mut self) -> Token<'a> {
        let input = self.input;
        let bytes = self.bytes();
        let len = bytes.len();

        let name_start = self.pos + 1;
        let mut i = name_start;
        while i < len && !bytes[i].is_ascii_whitespace() && !matches!(bytes[i], b'>' | b'/') {
            i += 1;
        }
        let name = &input[name_start..i];

        let mut attrs = Vec::new();
        let mut self_closing = false;

        loop {
            i = self.skip_spaces(i);
            if i >= len {
                break;
            }
            match bytes[i] {
                b'>' => {
                    i += 1;
                    break;
                }
                b'/' if bytes.get(i + 1) == Some(&b'>') => {
                    self_closing = true;
                    i += 2;
                    break;
                }
                b'/' => {
                    i += 1;
                    continue;
                }
                _ => {}
            }

            let attr_start = i;
            while i < len
                && !bytes[i].is_ascii_whitespace()
                && !matches!(bytes[i], b'=' | b'>' | b'/')
            {
                i += 1;
            }
            if i == attr_start {
                // Stray '=' with no name.
                i += 1;
                continue;
            }
            let attr_name = &input[attr_start..i];

            let j = self.skip_spaces(i);
            let value = if bytes.get(j) == Some(&b'=') {
                let (value, next) = self.attribute_value(self.skip_spaces(j + 1));
                i = next;
                Some(value)
            } else {
                None
            };

            attrs.push(RawAttribute {
                name: attr_name,
                value,
            });
        }

        self.pos = i;
        Token::StartTag {
            name,
            attrs,
            self_closing,
        }
    }

    /// Reads a quoted or unquoted value starting at `i`.
    fn attribute_value(&self, i: usize) -> (&'a str, usize) {
        let input = self.input;
        let bytes = self.bytes();
        let len = bytes.len();

        match bytes.get(i) {
            Some(&quote @ (b'"' | b'\'')) => {
                let start = i + 1;
                let end = input[start..]
                    .find(quote as char)
                    .map_or(len, |idx| start + idx);
                (&input[start..end], (end + 1).min(len))
            }
            _ => {
                let mut j = i;
                while j < len
                    && !bytes[j].is_ascii_whitespace()
                    && bytes[j] != b'>'
                    && !(bytes[j] == b'/' && bytes.get(j + 1) == Some(&b'>'))
                {
                    j += 1;
                }
                (&input[i..j], j)
            }
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.input.len() {
            return None;
        }

        let input = self.input;
        let rest = &input[self.pos..];
        if !starts_markup(rest) {
            return Some(self.text());
        }

        let start = self.pos;
        let token = if rest.starts_with("<!--") {
            self.skip_past(start + 4, "-->");
            Token::Comment
        } else if rest.starts_with("<![CDATA[") {
            let end = self.skip_past(start, "]]>");
            Token::Unrecognized(&input[start..end])
        } else if rest.starts_with("<!") {
            self.skip_past(start, ">");
            Token::Declaration
        } else if rest.starts_with("<?") {
            let end = self.skip_past(start, ">");
            Token::Unrecognized(&input[start..end])
        } else if rest.starts_with("</") {
            self.end_tag()
        } else {
            self.start_tag()
        };

        Some(token)
    }
}

/// Returns `true` if `s` begins with something other than literal text.
fn starts_markup(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'<') {
        return false;
    }
    match bytes.get(1) {
        Some(b) if b.is_ascii_alphabetic() => true,
        Some(b'!' | b'?') => true,
        Some(b'/') => bytes.get(2).is_some_and(u8::is_ascii_alphabetic),
        _ => false,
    }
}

// ============================================================================
// Tests
// ============================================================================
