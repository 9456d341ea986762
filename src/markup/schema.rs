//! Per-tag attribute schemas.
//!
//! The codec consults an [`ElementRegistry`] to decide how a literal
//! attribute is coerced and which attributes every parsed node carries.
//! Registries are built once, shared behind an `Arc` and never mutated
//! while a session is using them.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use super::element::{AttributeValue, Node, Number};

// ============================================================================
// AttributeKind
// ============================================================================

/// Declared kind of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Quoted string.
    String,
    /// Numeric literal.
    Number,
    /// Flag, bare name means `true`.
    Boolean,
    /// Kind declared by an extension that the codec cannot coerce.
    Custom(&'static str),
}

impl AttributeKind {
    /// Zero value used to backfill attributes missing after parsing.
    #[must_use]
    pub fn zero_value(&self) -> AttributeValue {
        match self {
            Self::String => AttributeValue::String(String::new()),
            Self::Number => AttributeValue::Number(Number::Int(0)),
            Self::Boolean => AttributeValue::Bool(false),
            Self::Custom(_) => AttributeValue::Null,
        }
    }

    /// Returns `true` if `value` is an acceptable runtime value for this kind.
    #[must_use]
    pub fn accepts(&self, value: &AttributeValue) -> bool {
        matches!(
            (self, value),
            (_, AttributeValue::Null)
                | (Self::String, AttributeValue::String(_))
                | (Self::Number, AttributeValue::Number(_))
                | (Self::Boolean, AttributeValue::Bool(_))
                | (Self::Custom(_), _)
        )
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Number => f.write_str("number"),
            Self::Boolean => f.write_str("boolean"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

// ============================================================================
// ElementSchema
// ============================================================================

/// Attribute contract and default instance for one tag.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementSchema {
    tag: String,
    attributes: IndexMap<String, AttributeKind>,
    defaults: IndexMap<String, AttributeValue>,
}

impl ElementSchema {
    /// Creates a schema with no declared attributes.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: IndexMap::new(),
            defaults: IndexMap::new(),
        }
    }

    /// Declares an attribute.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, kind: AttributeKind) -> Self {
        self.attributes.insert(name.into(), kind);
        self
    }

    /// Declares a string attribute.
    #[inline]
    #[must_use]
    pub fn string(self, name: impl Into<String>) -> Self {
        self.attr(name, AttributeKind::String)
    }

    /// Declares a numeric attribute.
    #[inline]
    #[must_use]
    pub fn number(self, name: impl Into<String>) -> Self {
        self.attr(name, AttributeKind::Number)
    }

    /// Declares a boolean attribute.
    #[inline]
    #[must_use]
    pub fn boolean(self, name: impl Into<String>) -> Self {
        self.attr(name, AttributeKind::Boolean)
    }

    /// Sets the value a freshly instantiated node starts with.
    #[must_use]
    pub fn default_value(
        mut self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    /// Returns the tag this schema describes.
    #[inline]
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Declared kind for `name`; undeclared names are strings.
    #[inline]
    #[must_use]
    pub fn kind_of(&self, name: &str) -> AttributeKind {
        self.attributes
            .get(name)
            .copied()
            .unwrap_or(AttributeKind::String)
    }

    /// Returns `true` if `name` is declared.
    #[inline]
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Declared attributes in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, AttributeKind)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Builds the default-populated node for this tag.
    #[must_use]
    pub fn instantiate(&self) -> Node {
        let mut node = Node::new(self.tag.clone());
        node.attrs.extend(
            self.defaults
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        node
    }

    /// Sets every declared attribute that is unset or null to its zero value.
    pub fn backfill(&self, node: &mut Node) {
        for (name, kind) in &self.attributes {
            let slot = node
                .attrs
                .entry(name.clone())
                .or_insert(AttributeValue::Null);
            if slot.is_null() {
                *slot = kind.zero_value();
            }
        }
    }

    /// Checks that every declared attribute on `node` has a matching kind.
    ///
    /// Returns the first offending attribute name.
    #[must_use]
    pub fn mismatch<'a>(&self, node: &'a Node) -> Option<&'a str> {
        node.attrs
            .iter()
            .find(|(name, value)| !self.kind_of(name).accepts(value))
            .map(|(name, _)| name.as_str())
    }
}

// ============================================================================
// ElementRegistry
// ============================================================================

/// Table of element schemas keyed by tag.
#[derive(Debug, Clone, Default)]
pub struct ElementRegistry {
    schemas: FxHashMap<String, Arc<ElementSchema>>,
}

impl ElementRegistry {
    /// Creates a registry with no schemas.
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a registry with the standard message elements.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for schema in standard_schemas() {
            registry.register(schema);
        }
        registry
    }

    /// Registers a schema, returning the one it replaced.
    pub fn register(&mut self, schema: ElementSchema) -> Option<Arc<ElementSchema>> {
        self.schemas
            .insert(schema.tag.clone(), Arc::new(schema))
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, schema: ElementSchema) -> Self {
        self.register(schema);
        self
    }

    /// Looks up the schema for a tag.
    #[inline]
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&ElementSchema> {
        self.schemas.get(tag).map(Arc::as_ref)
    }

    /// Returns `true` if a schema exists for `tag`.
    #[inline]
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.schemas.contains_key(tag)
    }

    /// Number of registered schemas.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns `true` if no schemas are registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

// ============================================================================
// Standard Elements
// ============================================================================

/// Media elements share source and caching attributes.
fn media(tag: &str) -> ElementSchema {
    ElementSchema::new(tag)
        .string("src")
        .string("title")
        .boolean("cache")
        .number("timeout")
}

fn standard_schemas() -> Vec<ElementSchema> {
    let mut schemas = vec![
        ElementSchema::new("at")
            .string("id")
            .string("name")
            .string("role")
            .string("type"),
        ElementSchema::new("sharp").string("id").string("name"),
        ElementSchema::new("a").string("href"),
        media("img").number("width").number("height"),
        media("audio").number("duration").string("poster"),
        media("video")
            .number("width")
            .number("height")
            .number("duration")
            .string("poster"),
        media("file").string("poster"),
        ElementSchema::new("message")
            .string("id")
            .boolean("forward")
            .default_value("forward", false),
        ElementSchema::new("quote").string("id"),
        ElementSchema::new("author")
            .string("id")
            .string("name")
            .string("avatar"),
        ElementSchema::new("button")
            .string("id")
            .string("type")
            .string("href")
            .string("text")
            .string("theme"),
    ];

    // Formatting and layout elements carry no attributes.
    schemas.extend(
        [
            "b", "strong", "i", "em", "u", "ins", "s", "del", "spoiler", "code", "sup", "sub",
            "br", "p",
        ]
        .into_iter()
        .map(ElementSchema::new),
    );

    schemas
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_contents() {
        let registry = ElementRegistry::standard();
        assert!(registry.contains("img"));
        assert!(registry.contains("quote"));
        assert!(registry.contains("br"));
        assert!(!registry.contains("foo"));
    }

    #[test]
    fn test_kind_of_defaults_to_string() {
        let registry = ElementRegistry::standard();
        let img = registry.get("img").expect("img schema");
        assert_eq!(img.kind_of("width"), AttributeKind::Number);
        assert_eq!(img.kind_of("cache"), AttributeKind::Boolean);
        assert_eq!(img.kind_of("alt"), AttributeKind::String);
    }

    #[test]
    fn test_instantiate_applies_defaults() {
        let registry = ElementRegistry::standard();
        let node = registry.get("message").expect("message schema").instantiate();
        assert_eq!(node.tag, "message");
        assert_eq!(node.attr_bool("forward"), Some(false));
    }

    #[test]
    fn test_backfill_fills_zero_values() {
        let schema = ElementSchema::new("x")
            .string("s")
            .number("n")
            .boolean("b")
            .attr("c", AttributeKind::Custom("list"));
        let mut node = Node::new("x").with_attr("n", AttributeValue::Null);

        schema.backfill(&mut node);

        assert_eq!(node.attr_str("s"), Some(""));
        assert_eq!(node.attr_number("n"), Some(&Number::Int(0)));
        assert_eq!(node.attr_bool("b"), Some(false));
        assert_eq!(node.attr("c"), Some(&AttributeValue::Null));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = ElementRegistry::standard();
        let previous = registry.register(ElementSchema::new("at").string("id"));
        assert!(previous.is_some());
        assert!(!registry.get("at").expect("at").declares("name"));
    }

    #[test]
    fn test_mismatch_detects_wrong_kind() {
        let schema = ElementSchema::new("img").number("width");
        let ok = Node::new("img").with_attr("width", 3);
        let bad = Node::new("img").with_attr("width", "3");
        assert_eq!(schema.mismatch(&ok), None);
        assert_eq!(schema.mismatch(&bad), Some("width"));
    }
}
