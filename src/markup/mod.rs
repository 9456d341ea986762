//! Rich-message markup.
//!
//! Message content travels as a compact tag-based text. This module maps it
//! to and from a typed [`Element`] tree.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `element` | Tree types and attribute values |
//! | `schema` | Per-tag attribute kinds and the [`ElementRegistry`] |
//! | `codec` | Encoding and schema-driven decoding |
//! | `selector` | Depth-first element lookup |
//! | `builders` | Constructors for standard elements |

// ============================================================================
// Submodules
// ============================================================================

/// Constructors for the standard elements.
pub mod builders;

/// Encoding and decoding.
pub mod codec;

/// Tree types.
pub mod element;

/// Fragment tokenizer.
mod parser;

/// Element lookup.
pub mod selector;

/// Attribute schemas.
pub mod schema;

// ============================================================================
// Re-exports
// ============================================================================

pub use codec::{MarkupCodec, decode, encode, escape, standard_registry, unescape};
pub use element::{AttributeValue, Attributes, Element, Node, Number};
pub use schema::{AttributeKind, ElementRegistry, ElementSchema};
pub use selector::{TEXT_TARGET, plain_text, select, select_all};
