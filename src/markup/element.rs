//! Message content tree.
//!
//! An [`Element`] is either a text leaf or a tagged [`Node`] with ordered
//! attributes and ordered children. Attribute values carry their kind
//! explicitly so the codec never has to guess.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;

// ============================================================================
// Number
// ============================================================================

/// Numeric attribute value.
///
/// Integers are kept in the narrowest type that holds them; literals beyond
/// `i64`/`f64` keep their exact text in an arbitrary-precision
/// [`serde_json::Number`].
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    /// Fits in `i32`.
    Int(i32),
    /// Fits in `i64`.
    Long(i64),
    /// Integer literal wider than `i64`.
    BigInt(serde_json::Number),
    /// Finite decimal literal.
    Double(f64),
    /// Decimal literal outside the `f64` range.
    Decimal(serde_json::Number),
}

impl Number {
    /// Returns the value as `i64` if it is an integer that fits.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            Self::BigInt(n) => n.as_i64(),
            Self::Double(_) | Self::Decimal(_) => None,
        }
    }

    /// Returns the value as `f64`, possibly losing precision.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(f64::from(*v)),
            Self::Long(v) => Some(*v as f64),
            Self::Double(v) => Some(*v),
            Self::BigInt(n) | Self::Decimal(n) => n.as_f64(),
        }
    }

    /// Returns `true` for integer variants.
    #[inline]
    #[must_use]
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Long(_) | Self::BigInt(_))
    }

    /// Returns `true` if the value can be written as a literal.
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        match self {
            Self::Double(v) => v.is_finite(),
            _ => true,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::BigInt(n) | Self::Decimal(n) => write!(f, "{n}"),
            // Keep a '.' so the literal parses back as a decimal.
            Self::Double(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            Self::Double(v) => write!(f, "{v}"),
        }
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        i32::try_from(value).map_or(Self::Long(value), Self::Int)
    }
}

impl From<u32> for Number {
    fn from(value: u32) -> Self {
        Self::from(i64::from(value))
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

// ============================================================================
// AttributeValue
// ============================================================================

/// Runtime value of one attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Absent value; never written out.
    Null,
    /// Boolean flag; written as a bare name when `true`.
    Bool(bool),
    /// Numeric literal.
    Number(Number),
    /// Quoted string.
    String(String),
    /// Structured value with no markup representation.
    Other(Value),
}

impl AttributeValue {
    /// Name of the runtime kind, used in error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Other(Value::Array(_)) => "array",
            Self::Other(Value::Object(_)) => "object",
            Self::Other(_) => "json",
        }
    }

    /// Returns `true` for [`AttributeValue::Null`].
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the string value, if any.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean value, if any.
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the numeric value, if any.
    #[inline]
    #[must_use]
    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Self::Number(n) => Some(n),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Number> for AttributeValue {
    fn from(value: Number) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u32> for AttributeValue {
    fn from(value: u32) -> Self {
        Self::Number(value.into())
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Number(value.into())
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<Value> for AttributeValue {
    /// Converts JSON scalars to their attribute kind; arrays and objects
    /// become [`AttributeValue::Other`].
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::String(s) => Self::String(s),
            Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Self::Number(v.into())
                } else if n.is_u64() {
                    Self::Number(Number::BigInt(n))
                } else {
                    match n.as_f64() {
                        Some(v) if v.is_finite() => Self::Number(Number::Double(v)),
                        _ => Self::Number(Number::Decimal(n)),
                    }
                }
            }
            other => Self::Other(other),
        }
    }
}

// ============================================================================
// Node
// ============================================================================

/// Attribute map preserving insertion order.
pub type Attributes = IndexMap<String, AttributeValue>;

/// A tagged element with attributes and children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    /// Tag name, case preserved.
    pub tag: String,
    /// Attributes in insertion order.
    pub attrs: Attributes,
    /// Child elements in document order.
    pub children: Vec<Element>,
}

impl Node {
    /// Creates an empty node.
    #[inline]
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Attributes::new(),
            children: Vec::new(),
        }
    }

    /// Sets an attribute, keeping its original position if it existed.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Appends a child.
    #[must_use]
    pub fn with_child(mut self, child: impl Into<Element>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Appends several children.
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    /// Returns an attribute value.
    #[inline]
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&AttributeValue> {
        self.attrs.get(name)
    }

    /// Returns a string attribute.
    #[inline]
    #[must_use]
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attr(name).and_then(AttributeValue::as_str)
    }

    /// Returns a boolean attribute.
    #[inline]
    #[must_use]
    pub fn attr_bool(&self, name: &str) -> Option<bool> {
        self.attr(name).and_then(AttributeValue::as_bool)
    }

    /// Returns a numeric attribute.
    #[inline]
    #[must_use]
    pub fn attr_number(&self, name: &str) -> Option<&Number> {
        self.attr(name).and_then(AttributeValue::as_number)
    }
}

// ============================================================================
// Element
// ============================================================================

/// Node of the rich-message content tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// Plain text leaf (unescaped).
    Text(String),
    /// Tagged node.
    Node(Node),
}

impl Element {
    /// Creates a text leaf.
    #[inline]
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    /// Returns the tag name for nodes.
    #[inline]
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Node(node) => Some(&node.tag),
            Self::Text(_) => None,
        }
    }

    /// Returns the text for leaves.
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Node(_) => None,
        }
    }

    /// Returns the node for tagged elements.
    #[inline]
    #[must_use]
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(node) => Some(node),
            Self::Text(_) => None,
        }
    }

    /// Returns the children (empty for text).
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[Element] {
        match self {
            Self::Node(node) => &node.children,
            Self::Text(_) => &[],
        }
    }

    /// Returns a string attribute of a node.
    #[inline]
    #[must_use]
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.as_node().and_then(|n| n.attr_str(name))
    }
}

impl From<Node> for Element {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

impl From<&str> for Element {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Element {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_number_narrowing() {
        assert_eq!(Number::from(5_i64), Number::Int(5));
        assert_eq!(Number::from(5_000_000_000_i64), Number::Long(5_000_000_000));
    }

    #[test]
    fn test_double_display_keeps_point() {
        assert_eq!(Number::Double(100.0).to_string(), "100.0");
        assert_eq!(Number::Double(1.5).to_string(), "1.5");
        assert_eq!(Number::Int(-3).to_string(), "-3");
    }

    #[test]
    fn test_attribute_from_json() {
        assert_eq!(AttributeValue::from(json!("a")), AttributeValue::from("a"));
        assert_eq!(AttributeValue::from(json!(true)), AttributeValue::Bool(true));
        assert_eq!(AttributeValue::from(json!(7)), AttributeValue::from(7));
        assert_eq!(AttributeValue::from(json!(null)), AttributeValue::Null);
        assert_eq!(AttributeValue::from(json!([1])).kind_name(), "array");
    }

    #[test]
    fn test_attribute_from_option() {
        assert_eq!(AttributeValue::from(None::<&str>), AttributeValue::Null);
        assert_eq!(AttributeValue::from(Some("x")), AttributeValue::from("x"));
    }

    #[test]
    fn test_node_builder_preserves_order() {
        let node = Node::new("img")
            .with_attr("src", "a.png")
            .with_attr("width", 10)
            .with_attr("cache", true);

        let names: Vec<_> = node.attrs.keys().map(String::as_str).collect();
        assert_eq!(names, ["src", "width", "cache"]);
        assert_eq!(node.attr_str("src"), Some("a.png"));
        assert_eq!(node.attr_bool("cache"), Some(true));
        assert_eq!(node.attr_number("width").and_then(Number::as_i64), Some(10));
    }

    #[test]
    fn test_element_accessors() {
        let el: Element = Node::new("b").with_child("bold").into();
        assert_eq!(el.tag(), Some("b"));
        assert_eq!(el.children()[0].as_text(), Some("bold"));
        assert!(Element::text("x").children().is_empty());
    }
}
