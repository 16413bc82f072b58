//! The html5lib tree-construction test format.
//!
//! ```text
//! | <!DOCTYPE html>
//! | <html>
//! |   <head>
//! |   <body>
//! |     <svg svg>
//! |       xlink href="#a"
//! |     "text"
//! ```
//!
//! One node per line, two spaces of indent per level. Attributes follow
//! their element one level deeper, sorted by name. Template contents appear
//! under a `content` line.

use std::fmt::Write as _;

use crate::tree::{DomTree, NodeId, NodeKind};

/// Dump the whole document.
#[must_use]
pub fn dump(tree: &DomTree) -> String {
    dump_children(tree, NodeId::ROOT)
}

/// Dump a fragment parse: the children of the `html` root the fragment was
/// parsed into.
#[must_use]
pub fn dump_fragment(tree: &DomTree) -> String {
    tree.document_element()
        .map(|root| dump_children(tree, root))
        .unwrap_or_default()
}

fn dump_children(tree: &DomTree, parent: NodeId) -> String {
    let mut lines = Vec::new();
    for &child in tree.children(parent) {
        dump_node(tree, child, 0, &mut lines);
    }
    lines.join("\n")
}

fn dump_node(tree: &DomTree, id: NodeId, depth: usize, lines: &mut Vec<String>) {
    let Some(node) = tree.get(id) else {
        return;
    };
    let mut line = format!("| {}", "  ".repeat(depth));
    match &node.kind {
        NodeKind::Document | NodeKind::DocumentFragment => {}
        NodeKind::Doctype(doctype) => {
            let _ = write!(line, "<!DOCTYPE {}", doctype.name);
            if !doctype.public_id.is_empty() || !doctype.system_id.is_empty() {
                let _ = write!(line, " \"{}\" \"{}\"", doctype.public_id, doctype.system_id);
            }
            line.push('>');
        }
        NodeKind::Element(element) => {
            let _ = write!(line, "<{}>", element.name);
            lines.push(line);

            let indent = format!("| {}", "  ".repeat(depth + 1));
            let mut attrs: Vec<(String, &str)> = element
                .attrs
                .iter()
                .map(|a| {
                    let name = match a.namespace.dump_prefix() {
                        "" => a.name.clone(),
                        prefix => format!("{prefix} {}", a.name),
                    };
                    (name, a.value.as_str())
                })
                .collect();
            attrs.sort();
            for (name, value) in attrs {
                lines.push(format!("{indent}{name}=\"{value}\""));
            }

            if let Some(contents) = element.template_contents {
                lines.push(format!("{indent}content"));
                for &child in tree.children(contents) {
                    dump_node(tree, child, depth + 2, lines);
                }
            }
            for &child in &node.children {
                dump_node(tree, child, depth + 1, lines);
            }
            return;
        }
        NodeKind::Text(text) => {
            let _ = write!(line, "\"{text}\"");
        }
        NodeKind::Comment(text) => {
            let _ = write!(line, "<!-- {text} -->");
        }
    }
    lines.push(line);
}

#[cfg(test)]
mod tests {
    use weft_html::{Attribute, Namespace, QualName, TreeSink};

    use super::*;

    #[test]
    fn test_attributes_are_sorted_and_prefixed() {
        let mut tree = DomTree::new();
        let mut href = Attribute::new("href", "#a");
        href.namespace = Namespace::XLink;
        href.prefix = Some("xlink".to_string());
        let svg = tree
            .create_element(
                &QualName::new(Namespace::Svg, "svg"),
                &[Attribute::new("width", "3"), href, Attribute::new("class", "c")],
                None,
            )
            .unwrap();
        TreeSink::append_child(&mut tree, &NodeId::ROOT, &svg).unwrap();

        assert_eq!(
            dump(&tree),
            "| <svg svg>\n|   class=\"c\"\n|   width=\"3\"\n|   xlink href=\"#a\""
        );
    }

    #[test]
    fn test_doctype_with_identifiers() {
        let mut tree = DomTree::new();
        tree.append_doctype("html", "-//W3C//DTD HTML 4.01//EN", "")
            .unwrap();
        assert_eq!(
            dump(&tree),
            "| <!DOCTYPE html \"-//W3C//DTD HTML 4.01//EN\" \"\">"
        );
    }
}
