//! Constructors for the standard message elements.
//!
//! # Example
//!
//! ```ignore
//! use chatlink::markup::{builders::*, encode};
//!
//! let content = encode(&[
//!     quote("msg-1"),
//!     at("user-9"),
//!     text(" welcome "),
//!     strong([text("aboard")]),
//!     img("https://example.com/a.png"),
//! ])?;
//! ```

use super::element::{Element, Node};

/// Plain text.
#[inline]
#[must_use]
pub fn text(content: impl Into<String>) -> Element {
    Element::text(content)
}

/// Mention of a user.
#[must_use]
pub fn at(id: impl Into<String>) -> Element {
    Node::new("at").with_attr("id", id.into()).into()
}

/// Mention of a role.
#[must_use]
pub fn at_role(role: impl Into<String>) -> Element {
    Node::new("at").with_attr("role", role.into()).into()
}

/// Mention of everyone (`type="all"`) or online members (`type="here"`).
#[must_use]
pub fn at_type(kind: impl Into<String>) -> Element {
    Node::new("at").with_attr("type", kind.into()).into()
}

/// Channel reference.
#[must_use]
pub fn sharp(id: impl Into<String>) -> Element {
    Node::new("sharp").with_attr("id", id.into()).into()
}

/// Hyperlink wrapping `children`.
#[must_use]
pub fn a(href: impl Into<String>, children: impl IntoIterator<Item = Element>) -> Element {
    Node::new("a")
        .with_attr("href", href.into())
        .with_children(children)
        .into()
}

/// Image.
#[must_use]
pub fn img(src: impl Into<String>) -> Element {
    Node::new("img").with_attr("src", src.into()).into()
}

/// Image with explicit dimensions.
#[must_use]
pub fn img_sized(src: impl Into<String>, width: u32, height: u32) -> Element {
    Node::new("img")
        .with_attr("src", src.into())
        .with_attr("width", width)
        .with_attr("height", height)
        .into()
}

/// Audio clip.
#[must_use]
pub fn audio(src: impl Into<String>) -> Element {
    Node::new("audio").with_attr("src", src.into()).into()
}

/// Video clip.
#[must_use]
pub fn video(src: impl Into<String>) -> Element {
    Node::new("video").with_attr("src", src.into()).into()
}

/// File attachment.
#[must_use]
pub fn file(src: impl Into<String>) -> Element {
    Node::new("file").with_attr("src", src.into()).into()
}

/// Reply marker referencing another message.
#[must_use]
pub fn quote(id: impl Into<String>) -> Element {
    Node::new("quote").with_attr("id", id.into()).into()
}

/// Author override for forwarded or composed messages.
#[must_use]
pub fn author(id: impl Into<String>, name: impl Into<String>) -> Element {
    Node::new("author")
        .with_attr("id", id.into())
        .with_attr("name", name.into())
        .into()
}

/// Nested message, optionally forwarded.
#[must_use]
pub fn message(forward: bool, children: impl IntoIterator<Item = Element>) -> Element {
    Node::new("message")
        .with_attr("forward", forward)
        .with_children(children)
        .into()
}

/// Interactive button sending `id` back as an interaction event.
#[must_use]
pub fn button(id: impl Into<String>, label: impl Into<String>) -> Element {
    Node::new("button")
        .with_attr("id", id.into())
        .with_attr("type", "action")
        .with_child(Element::text(label))
        .into()
}

/// Button opening a link.
#[must_use]
pub fn link_button(href: impl Into<String>, label: impl Into<String>) -> Element {
    Node::new("button")
        .with_attr("type", "link")
        .with_attr("href", href.into())
        .with_child(Element::text(label))
        .into()
}

/// Line break.
#[must_use]
pub fn br() -> Element {
    Node::new("br").into()
}

/// Paragraph.
#[must_use]
pub fn p(children: impl IntoIterator<Item = Element>) -> Element {
    styled("p", children)
}

/// Bold.
#[must_use]
pub fn strong(children: impl IntoIterator<Item = Element>) -> Element {
    styled("b", children)
}

/// Italic.
#[must_use]
pub fn em(children: impl IntoIterator<Item = Element>) -> Element {
    styled("i", children)
}

/// Underline.
#[must_use]
pub fn ins(children: impl IntoIterator<Item = Element>) -> Element {
    styled("u", children)
}

/// Strikethrough.
#[must_use]
pub fn del(children: impl IntoIterator<Item = Element>) -> Element {
    styled("s", children)
}

/// Spoiler.
#[must_use]
pub fn spoiler(children: impl IntoIterator<Item = Element>) -> Element {
    styled("spoiler", children)
}

/// Inline code.
#[must_use]
pub fn code(source: impl Into<String>) -> Element {
    styled("code", [Element::text(source)])
}

/// Generic attribute-less wrapper.
#[must_use]
pub fn styled(tag: &str, children: impl IntoIterator<Item = Element>) -> Element {
    Node::new(tag).with_children(children).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::markup::{decode, encode};

    #[test]
    fn test_builders_encode() {
        let content = encode(&[quote("m1"), at("u1"), text(" hi "), strong([text("there")])])
            .expect("encode");
        assert_eq!(
            content,
            r#"<quote id="m1"/><at id="u1"/> hi <b>there</b>"#
        );
    }

    #[test]
    fn test_button_round_trip() {
        let original = vec![button("ok", "Confirm")];
        let parsed = decode(&encode(&original).expect("encode")).expect("decode");
        let node = parsed[0].as_node().expect("button node");
        assert_eq!(node.attr_str("id"), Some("ok"));
        assert_eq!(node.attr_str("type"), Some("action"));
        assert_eq!(node.attr_str("theme"), Some(""));
        assert_eq!(node.children[0].as_text(), Some("Confirm"));
    }

    #[test]
    fn test_img_sized() {
        let content = encode(&[img_sized("a.png", 640, 480)]).expect("encode");
        assert_eq!(content, r#"<img src="a.png" width=640 height=480/>"#);
    }
}
