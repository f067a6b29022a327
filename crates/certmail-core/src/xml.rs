//! Absolute child-path lookups over a parsed XML document.
//!
//! Supports the subset of XPath used by certification documents:
//! `/root/child/grandchild`, matched on element local names.

use roxmltree::{Document, Node};

/// Selects every element reached by an absolute path, in document order.
pub(crate) fn select<'a, 'input>(document: &'a Document<'input>, path: &str) -> Vec<Node<'a, 'input>> {
    let mut steps = path.split('/').filter(|step| !step.is_empty());
    let root = document.root_element();

    match steps.next() {
        Some(first) if root.tag_name().name() == first => {}
        _ => return Vec::new(),
    }

    steps.fold(vec![root], |nodes, step| {
        nodes
            .iter()
            .flat_map(|node| {
                node.children()
                    .filter(move |child| child.is_element() && child.tag_name().name() == step)
            })
            .collect()
    })
}

/// Concatenated text of all descendant text nodes, trimmed.
pub(crate) fn text_content(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Attribute value, matching the name case-insensitively.
pub(crate) fn attribute<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attributes()
        .find(|attr| attr.name().eq_ignore_ascii_case(name))
        .map(|attr| attr.value())
}
