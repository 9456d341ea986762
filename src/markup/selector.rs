//! Element lookup over parsed content.
//!
//! # Example
//!
//! ```ignore
//! use chatlink::markup::{self, select};
//!
//! let content = markup::decode(r#"<quote id="42"/>see above"#)?;
//! let quoted = select(&content, "quote").and_then(|q| q.attr_str("id"));
//! assert_eq!(quoted, Some("42"));
//! ```

use super::element::Element;

/// Target name that matches text leaves instead of a tag.
pub const TEXT_TARGET: &str = "text";

/// Depth-first search for the first element matching `target`.
///
/// `target` is a tag name, or [`TEXT_TARGET`] for the first text leaf.
#[must_use]
pub fn select<'a>(roots: &'a [Element], target: &str) -> Option<&'a Element> {
    roots.iter().find_map(|element| select_in(element, target))
}

fn select_in<'a>(element: &'a Element, target: &str) -> Option<&'a Element> {
    if matches_target(element, target) {
        return Some(element);
    }
    select(element.children(), target)
}

/// Every element matching `target`, in document order.
#[must_use]
pub fn select_all<'a>(roots: &'a [Element], target: &str) -> Vec<&'a Element> {
    let mut found = Vec::new();
    collect(roots, target, &mut found);
    found
}

fn collect<'a>(elements: &'a [Element], target: &str, found: &mut Vec<&'a Element>) {
    for element in elements {
        if matches_target(element, target) {
            found.push(element);
        }
        collect(element.children(), target, found);
    }
}

fn matches_target(element: &Element, target: &str) -> bool {
    match element {
        Element::Text(_) => target == TEXT_TARGET,
        Element::Node(node) => node.tag == target,
    }
}

/// Concatenates all text leaves, ignoring markup.
#[must_use]
pub fn plain_text(roots: &[Element]) -> String {
    select_all(roots, TEXT_TARGET)
        .into_iter()
        .filter_map(Element::as_text)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
