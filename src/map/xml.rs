// ── Attribute helpers for roxmltree nodes ────────────────────────────────────

use std::str::FromStr;

use roxmltree::Node;

use crate::error::{Error, Result};

pub(crate) fn required<T: FromStr>(node: Node<'_, '_>, element: &'static str, attribute: &'static str) -> Result<T> {
    optional(node, element, attribute)?.ok_or(Error::MissingAttribute { element, attribute })
}

pub(crate) fn optional<T: FromStr>(
    node: Node<'_, '_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<Option<T>> {
    match node.attribute(attribute) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| Error::InvalidAttribute {
            element,
            attribute,
            value: raw.to_string(),
        }),
    }
}

/// Tiled writes booleans as `0`/`1`; `true`/`false` is accepted too.
pub(crate) fn flag(node: Node<'_, '_>, element: &'static str, attribute: &'static str, default: bool) -> Result<bool> {
    match node.attribute(attribute).map(str::trim) {
        None => Ok(default),
        Some("1") | Some("true") => Ok(true),
        Some("0") | Some("false") => Ok(false),
        Some(other) => Err(Error::InvalidAttribute { element, attribute, value: other.to_string() }),
    }
}

/// Element children named `name`, in document order.
pub(crate) fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |c| c.is_element() && c.has_tag_name(name))
}

pub(crate) fn child<'a, 'input: 'a>(node: Node<'a, 'input>, name: &'static str) -> Option<Node<'a, 'input>> {
    children(node, name).next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_reports_element_and_attribute() {
        let doc = roxmltree::Document::parse(r#"<map width="3"/>"#).unwrap();
        let root = doc.root_element();
        assert_eq!(required::<u32>(root, "map", "width").unwrap(), 3);
        let err = required::<u32>(root, "map", "height").unwrap_err();
        assert!(matches!(err, Error::MissingAttribute { element: "map", attribute: "height" }));
    }

    #[test]
    fn malformed_number_is_invalid_attribute() {
        let doc = roxmltree::Document::parse(r#"<map width="three"/>"#).unwrap();
        let err = required::<u32>(doc.root_element(), "map", "width").unwrap_err();
        assert!(matches!(err, Error::InvalidAttribute { value, .. } if value == "three"));
    }

    #[test]
    fn flag_accepts_digits_and_words() {
        let doc = roxmltree::Document::parse(r#"<layer a="0" b="true"/>"#).unwrap();
        let root = doc.root_element();
        assert!(!flag(root, "layer", "a", true).unwrap());
        assert!(flag(root, "layer", "b", false).unwrap());
        assert!(flag(root, "layer", "c", true).unwrap());
    }
}
