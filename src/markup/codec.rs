//! Element tree ⇄ markup text.
//!
//! # Text form
//!
//! | Element | Written as |
//! |---------|------------|
//! | text | escaped (`&` `"` `<` `>`) |
//! | string attribute | `name="escaped"` |
//! | number attribute | `name=literal` |
//! | boolean attribute | bare `name` when `true`, omitted when `false` |
//! | node without children | `<tag .../>` |
//! | node with children | `<tag ...>children</tag>` |
//!
//! Parsing is schema driven: attributes of registered tags are coerced to
//! their declared kind and missing ones are backfilled with zero values.
//! Unknown tags pass through with every attribute kept as a string.

// ============================================================================
// Imports
// ============================================================================

use std::borrow::Cow;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use crate::error::{Error, Result};

use super::element::{AttributeValue, Element, Node, Number};
use super::parser::{RawAttribute, Token, Tokenizer};
use super::schema::{AttributeKind, ElementRegistry};

// ============================================================================
// Constants
// ============================================================================

/// Tags that never contain children, even when written without `/>`.
///
/// The encoder self-closes these and writes any children as following
/// siblings, which is how the decoder reads them back.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Maximum length of the source excerpt carried by parse errors.
const SNIPPET_LEN: usize = 32;

static STANDARD_REGISTRY: LazyLock<Arc<ElementRegistry>> =
    LazyLock::new(|| Arc::new(ElementRegistry::standard()));

/// Returns the shared registry of standard message elements.
#[must_use]
pub fn standard_registry() -> Arc<ElementRegistry> {
    Arc::clone(&STANDARD_REGISTRY)
}

// ============================================================================
// MarkupCodec
// ============================================================================

/// Encoder/decoder bound to an element registry.
///
/// Stateless apart from the shared registry; cheap to clone and safe to use
/// from any number of tasks at once.
#[derive(Debug, Clone)]
pub struct MarkupCodec {
    registry: Arc<ElementRegistry>,
}

impl Default for MarkupCodec {
    fn default() -> Self {
        Self::new(standard_registry())
    }
}

impl MarkupCodec {
    /// Creates a codec using `registry` for attribute coercion.
    #[inline]
    #[must_use]
    pub fn new(registry: Arc<ElementRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the registry this codec consults.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    /// Serializes elements to markup text.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedAttributeType`] if an attribute holds a value with
    /// no text form.
    pub fn encode(&self, elements: &[Element]) -> Result<String> {
        encode(elements)
    }

    /// Parses markup text into top-level elements.
    ///
    /// # Errors
    ///
    /// - [`Error::AttributeNumberParsing`] for non-numeric literals of numeric attributes
    /// - [`Error::AttributeBooleanParsing`] for malformed boolean literals
    /// - [`Error::UnsupportedAttributeType`] for attributes of a custom kind
    /// - [`Error::UnrecognizedNode`] for processing instructions and CDATA
    pub fn decode(&self, text: &str) -> Result<Vec<Element>> {
        let mut builder = TreeBuilder::new(&self.registry);
        for token in Tokenizer::new(text) {
            builder.feed(token)?;
        }
        Ok(builder.finish())
    }
}

/// Serializes elements to markup text.
///
/// # Errors
///
/// See [`MarkupCodec::encode`].
pub fn encode(elements: &[Element]) -> Result<String> {
    let mut out = String::new();
    for element in elements {
        write_element(&mut out, element)?;
    }
    Ok(out)
}

/// Parses markup text with the standard registry.
///
/// # Errors
///
/// See [`MarkupCodec::decode`].
pub fn decode(text: &str) -> Result<Vec<Element>> {
    MarkupCodec::default().decode(text)
}

// ============================================================================
// Escaping
// ============================================================================

/// Escapes `&`, `"`, `<` and `>` (`&` first).
#[must_use]
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '"', '<', '>']) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.replace('&', "&amp;")
            .replace('"', "&quot;")
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    )
}

/// Decodes character references.
///
/// Single left-to-right pass: a decoded `&amp;` is never re-read, so
/// `&amp;lt;` yields `&lt;` rather than `<`.
#[must_use]
pub fn unescape(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];
        match decode_reference(tail) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Decodes the reference at the start of `s`, returning it and its length.
fn decode_reference(s: &str) -> Option<(char, usize)> {
    const NAMED: [(&str, char); 5] = [
        ("&gt;", '>'),
        ("&lt;", '<'),
        ("&quot;", '"'),
        ("&apos;", '\''),
        ("&amp;", '&'),
    ];

    if let Some((entity, ch)) = NAMED.iter().find(|(entity, _)| s.starts_with(entity)) {
        return Some((*ch, entity.len()));
    }

    let body = s.strip_prefix("&#")?;
    let end = body.find(';').filter(|&end| (1..=8).contains(&end))?;
    let digits = &body[..end];
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
            u32::from_str_radix(hex, 16).ok()?
        }
        None if digits.bytes().all(|b| b.is_ascii_digit()) => digits.parse().ok()?,
        _ => return None,
    };
    Some((char::from_u32(code)?, 2 + end + 1))
}

// ============================================================================
// Serialization
// ============================================================================

fn write_element(out: &mut String, element: &Element) -> Result<()> {
    match element {
        Element::Text(text) => out.push_str(&escape(text)),
        Element::Node(node) => write_node(out, node)?,
    }
    Ok(())
}

fn write_node(out: &mut String, node: &Node) -> Result<()> {
    out.push('<');
    out.push_str(&node.tag);

    for (name, value) in &node.attrs {
        match value {
            AttributeValue::Null | AttributeValue::Bool(false) => {}
            AttributeValue::Bool(true) => {
                out.push(' ');
                out.push_str(name);
            }
            AttributeValue::Number(number) if number.is_finite() => {
                out.push(' ');
                out.push_str(name);
                out.push('=');
                out.push_str(&number.to_string());
            }
            AttributeValue::Number(_) => {
                return Err(Error::unsupported_attribute(name, "non-finite number"));
            }
            AttributeValue::String(text) => {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape(text));
                out.push('"');
            }
            AttributeValue::Other(_) => {
                return Err(Error::unsupported_attribute(name, value.kind_name()));
            }
        }
    }

    if node.children.is_empty() {
        out.push_str("/>");
        return Ok(());
    }

    if is_void(&node.tag) {
        out.push_str("/>");
        for child in &node.children {
            write_element(out, child)?;
        }
        return Ok(());
    }

    out.push('>');
    for child in &node.children {
        write_element(out, child)?;
    }
    out.push_str("</");
    out.push_str(&node.tag);
    out.push('>');
    Ok(())
}

// ============================================================================
// Parsing
// ============================================================================

/// Assembles tokens into a tree, closing nodes on matching end tags.
struct TreeBuilder<'r> {
    registry: &'r ElementRegistry,
    roots: Vec<Element>,
    open: Vec<Node>,
}

impl<'r> TreeBuilder<'r> {
    fn new(registry: &'r ElementRegistry) -> Self {
        Self {
            registry,
            roots: Vec::new(),
            open: Vec::new(),
        }
    }

    fn feed(&mut self, token: Token<'_>) -> Result<()> {
        match token {
            Token::Text(raw) => {
                let text = unescape(raw);
                if !text.is_empty() {
                    self.append(Element::Text(text.into_owned()));
                }
            }
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => {
                let node = self.build_node(name, &attrs)?;
                if self_closing || is_void(name) {
                    self.append(Element::Node(node));
                } else {
                    self.open.push(node);
                }
            }
            Token::EndTag(name) => {
                // Stray end tags are dropped.
                if let Some(depth) = self
                    .open
                    .iter()
                    .rposition(|node| node.tag.eq_ignore_ascii_case(name))
                {
                    self.close_to(depth);
                }
            }
            Token::Comment | Token::Declaration => {}
            Token::Unrecognized(source) => {
                return Err(Error::unrecognized_node(snippet(source)));
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Vec<Element> {
        self.close_to(0);
        self.roots
    }

    fn append(&mut self, element: Element) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(element),
            None => self.roots.push(element),
        }
    }

    /// Closes open nodes until only `depth` remain.
    fn close_to(&mut self, depth: usize) {
        while self.open.len() > depth {
            if let Some(node) = self.open.pop() {
                self.append(Element::Node(node));
            }
        }
    }

    fn build_node(&self, tag: &str, attrs: &[RawAttribute<'_>]) -> Result<Node> {
        let Some(schema) = self.registry.get(tag) else {
            let mut node = Node::new(tag);
            for attr in attrs {
                let value = attr.value.map(unescape).unwrap_or_default();
                node.attrs
                    .insert(attr.name.to_owned(), AttributeValue::String(value.into_owned()));
            }
            return Ok(node);
        };

        let mut node = schema.instantiate();
        for attr in attrs {
            let value = coerce(schema.kind_of(attr.name), attr)?;
            node.attrs.insert(attr.name.to_owned(), value);
        }
        schema.backfill(&mut node);
        Ok(node)
    }
}

fn is_void(tag: &str) -> bool {
    VOID_TAGS.iter().any(|void| void.eq_ignore_ascii_case(tag))
}

fn snippet(source: &str) -> String {
    source.chars().take(SNIPPET_LEN).collect()
}

// ============================================================================
// Attribute Coercion
// ============================================================================

/// Converts a literal attribute to its declared kind.
fn coerce(kind: AttributeKind, attr: &RawAttribute<'_>) -> Result<AttributeValue> {
    let literal = attr.value.map(unescape);

    match kind {
        AttributeKind::String => Ok(AttributeValue::String(
            literal.map(Cow::into_owned).unwrap_or_default(),
        )),
        AttributeKind::Number => {
            let literal = literal.unwrap_or_default();
            parse_number(attr.name, &literal).map(AttributeValue::Number)
        }
        AttributeKind::Boolean => match literal.as_deref() {
            None | Some("true") => Ok(AttributeValue::Bool(true)),
            Some("false") => Ok(AttributeValue::Bool(false)),
            Some(other) => Err(Error::attribute_boolean(attr.name, other)),
        },
        AttributeKind::Custom(kind) => Err(Error::unsupported_attribute(attr.name, kind)),
    }
}

/// Parses a numeric literal into the narrowest fitting [`Number`].
///
/// Decimal literals try `f64` then arbitrary precision; integer literals
/// try `i32`, `i64`, then arbitrary precision.
fn parse_number(name: &str, literal: &str) -> Result<Number> {
    let fail = || Error::attribute_number(name, literal);

    if literal.contains('.') {
        if let Ok(value) = literal.parse::<f64>()
            && value.is_finite()
        {
            return Ok(Number::Double(value));
        }
        return serde_json::Number::from_str(literal)
            .map(Number::Decimal)
            .map_err(|_| fail());
    }

    if let Ok(value) = literal.parse::<i32>() {
        return Ok(Number::Int(value));
    }
    if let Ok(value) = literal.parse::<i64>() {
        return Ok(Number::Long(value));
    }

    let (sign, digits) = match literal.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", literal.strip_prefix('+').unwrap_or(literal)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(fail());
    }
    let trimmed = digits.trim_start_matches('0');
    let normalized = format!("{sign}{}", if trimmed.is_empty() { "0" } else { trimmed });
    serde_json::Number::from_str(&normalized)
        .map(Number::BigInt)
        .map_err(|_| fail())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use crate::markup::schema::ElementSchema;

    fn node(el: &Element) -> &Node {
        el.as_node().expect("expected a node")
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("A & B"), "A &amp; B");
        assert_eq!(escape(r#"<a href="x">"#), "&lt;a href=&quot;x&quot;&gt;");
        assert!(matches!(escape("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_unescape_amp_last() {
        assert_eq!(unescape("&amp;lt;"), "&lt;");
        assert_eq!(unescape("&lt;b&gt; &quot;q&quot; &amp;"), "<b> \"q\" &");
        assert_eq!(unescape("&#60;&#x3E;"), "<>");
        assert_eq!(unescape("a & b &bogus;"), "a & b &bogus;");
    }

    #[test]
    fn test_encode_text_and_node() {
        let elements = vec![
            Element::text("hi & bye "),
            Node::new("img")
                .with_attr("src", "a.png")
                .with_attr("width", 100)
                .with_attr("cache", true)
                .with_attr("title", AttributeValue::Null)
                .with_attr("hidden", false)
                .into(),
            Node::new("b").with_child("x").into(),
        ];

        let text = encode(&elements).expect("encode");
        assert_eq!(
            text,
            r#"hi &amp; bye <img src="a.png" width=100 cache/><b>x</b>"#
        );
    }

    #[test]
    fn test_encode_rejects_structured_attribute() {
        let el: Element = Node::new("x")
            .with_attr("data", serde_json::json!({"k": 1}))
            .into();
        let err = encode(&[el]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedAttributeType { ref name, .. } if name == "data"));
    }

    #[test]
    fn test_encode_rejects_non_finite() {
        let el: Element = Node::new("img").with_attr("width", f64::NAN).into();
        assert!(matches!(
            encode(&[el]),
            Err(Error::UnsupportedAttributeType { .. })
        ));
    }

    #[test]
    fn test_decode_unknown_tag_keeps_strings() {
        let elements = decode(r#"<foo bar="1"/>"#).expect("decode");
        assert_eq!(elements.len(), 1);
        let foo = node(&elements[0]);
        assert_eq!(foo.tag, "foo");
        assert_eq!(foo.attr("bar"), Some(&AttributeValue::from("1")));
    }

    #[test]
    fn test_decode_boolean_coercion() {
        let bare = decode("<img cache/>").expect("decode");
        assert_eq!(node(&bare[0]).attr_bool("cache"), Some(true));

        let explicit = decode(r#"<img cache="false"/>"#).expect("decode");
        assert_eq!(node(&explicit[0]).attr_bool("cache"), Some(false));

        let err = decode(r#"<img cache="yes"/>"#).unwrap_err();
        assert!(matches!(err, Error::AttributeBooleanParsing { ref value, .. } if value == "yes"));
    }

    #[test]
    fn test_decode_number_coercion() {
        let int = decode(r#"<img width="100"/>"#).expect("decode");
        assert_eq!(node(&int[0]).attr_number("width"), Some(&Number::Int(100)));

        let float = decode(r#"<img width="1.5"/>"#).expect("decode");
        assert_eq!(node(&float[0]).attr_number("width"), Some(&Number::Double(1.5)));

        let long = decode("<img width=5000000000/>").expect("decode");
        assert_eq!(
            node(&long[0]).attr_number("width"),
            Some(&Number::Long(5_000_000_000))
        );

        let big = decode("<img width=123456789012345678901234567890/>").expect("decode");
        match node(&big[0]).attr_number("width") {
            Some(Number::BigInt(n)) => assert_eq!(n.to_string(), "123456789012345678901234567890"),
            other => panic!("expected BigInt, got {other:?}"),
        }

        let err = decode(r#"<img width="wide"/>"#).unwrap_err();
        assert!(matches!(err, Error::AttributeNumberParsing { .. }));
    }

    #[test]
    fn test_decode_backfills_schema_attributes() {
        let elements = decode(r#"<img src="a.png"/>"#).expect("decode");
        let img = node(&elements[0]);
        assert_eq!(img.attr_str("src"), Some("a.png"));
        assert_eq!(img.attr_str("title"), Some(""));
        assert_eq!(img.attr_bool("cache"), Some(false));
        assert_eq!(img.attr_number("width"), Some(&Number::Int(0)));
        assert_eq!(img.attr_number("timeout"), Some(&Number::Int(0)));
    }

    #[test]
    fn test_decode_unknown_attribute_on_known_tag_is_string() {
        let elements = decode(r#"<img alt="42"/>"#).expect("decode");
        assert_eq!(node(&elements[0]).attr_str("alt"), Some("42"));
    }

    #[test]
    fn test_decode_custom_kind_is_unsupported() {
        let registry = ElementRegistry::standard().with(
            ElementSchema::new("poll").attr("options", AttributeKind::Custom("list")),
        );
        let codec = MarkupCodec::new(Arc::new(registry));
        let err = codec.decode(r#"<poll options="a,b"/>"#).unwrap_err();
        assert!(matches!(err, Error::UnsupportedAttributeType { ref kind, .. } if kind == "list"));
    }

    #[test]
    fn test_decode_text_entities() {
        let elements = decode("A &amp; B &lt;3").expect("decode");
        assert_eq!(elements, vec![Element::text("A & B <3")]);
    }

    #[test]
    fn test_decode_discards_comments_and_doctype() {
        let elements = decode("<!DOCTYPE x><!-- hidden -->hi<br/>").expect("decode");
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].as_text(), Some("hi"));
        assert_eq!(elements[1].tag(), Some("br"));
    }

    #[test]
    fn test_decode_unrecognized_node() {
        let err = decode("<?php echo 1 ?>").unwrap_err();
        assert!(matches!(err, Error::UnrecognizedNode { ref snippet } if snippet.starts_with("<?php")));
    }

    #[test]
    fn test_decode_nesting_and_order() {
        let elements = decode(r#"<quote id="9"/><at id="1"/> hello <b>bold <i>both</i></b>"#)
            .expect("decode");
        assert_eq!(elements.len(), 4);
        assert_eq!(elements[0].tag(), Some("quote"));
        assert_eq!(elements[1].attr_str("id"), Some("1"));
        assert_eq!(elements[2].as_text(), Some(" hello "));
        let bold = node(&elements[3]);
        assert_eq!(bold.children[0].as_text(), Some("bold "));
        assert_eq!(bold.children[1].tag(), Some("i"));
    }

    #[test]
    fn test_decode_void_and_unclosed_tags() {
        let elements = decode(r#"<img src="a"><b>open"#).expect("decode");
        assert_eq!(elements.len(), 2);
        assert!(elements[0].children().is_empty());
        assert_eq!(elements[1].children()[0].as_text(), Some("open"));
    }

    #[test]
    fn test_encode_void_tag_children_follow_as_siblings() {
        let img: Element = Node::new("img")
            .with_attr("src", "a")
            .with_child(Element::text("caption"))
            .into();

        let text = encode(&[img]).expect("encode");
        assert_eq!(text, r#"<img src="a"/>caption"#);

        let elements = decode(&text).expect("decode");
        assert_eq!(elements.len(), 2);
        assert!(elements[0].children().is_empty());
        assert_eq!(elements[1].as_text(), Some("caption"));
        let again = decode(&encode(&elements).expect("re-encode")).expect("re-decode");
        assert_eq!(again, elements);
    }

    #[test]
    fn test_decode_stray_end_tag_ignored() {
        let elements = decode("a</b>c").expect("decode");
        assert_eq!(elements, vec![Element::text("a"), Element::text("c")]);
    }

    #[test]
    fn test_round_trip_known_tags() {
        let tree = vec![
            Node::new("message")
                .with_attr("id", "m1")
                .with_attr("forward", true)
                .with_child(
                    Node::new("author")
                        .with_attr("id", "u1")
                        .with_attr("name", "Ann & Bo")
                        .with_attr("avatar", ""),
                )
                .with_child(Element::text("see <this>"))
                .into(),
            Node::new("img")
                .with_attr("src", "https://x/y.png?a=1&b=2")
                .with_attr("title", "")
                .with_attr("cache", false)
                .with_attr("timeout", 0)
                .with_attr("width", 1.5)
                .with_attr("height", 20)
                .into(),
        ];

        let text = encode(&tree).expect("encode");
        let parsed = decode(&text).expect("decode");
        assert_eq!(parsed, tree);
    }

    proptest! {
        #[test]
        fn prop_escape_round_trip(s in "[a-z&<>\" ;#0-9]{0,40}") {
            let escaped = escape(&s);
            let unescaped = unescape(&escaped);
            prop_assert_eq!(unescaped.as_ref(), s.as_str());
        }

        #[test]
        fn prop_text_leaf_round_trip(s in "[a-zA-Z&<>\" ]{1,40}") {
            let parsed = decode(&encode(&[Element::text(s.clone())]).unwrap()).unwrap();
            prop_assert_eq!(parsed, vec![Element::text(s)]);
        }
    }
}
