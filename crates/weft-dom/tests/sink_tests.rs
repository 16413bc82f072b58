//! Tests for the tree mutations the parser performs through `TreeSink`.

use weft_dom::{DomTree, NodeId, NodeKind};
use weft_html::{Attribute, Flow, QualName, TreeSink};

/// Helper to create a detached HTML element.
fn element(tree: &mut DomTree, local: &str) -> NodeId {
    tree.create_element(&QualName::html(local), &[], None).unwrap()
}

fn append(tree: &mut DomTree, parent: NodeId, child: NodeId) {
    TreeSink::append_child(tree, &parent, &child).unwrap();
}

// ========== text merging ==========

#[test]
fn test_append_text_merges_with_last_text_child() {
    let mut tree = DomTree::new();
    let p = element(&mut tree, "p");
    append(&mut tree, NodeId::ROOT, p);

    tree.append_text(&p, "a").unwrap();
    tree.append_text(&p, "b").unwrap();

    assert_eq!(tree.children(p).len(), 1);
    assert_eq!(tree.as_text(tree.children(p)[0]), Some("ab"));
}

#[test]
fn test_append_text_after_element_starts_new_node() {
    let mut tree = DomTree::new();
    let p = element(&mut tree, "p");
    append(&mut tree, NodeId::ROOT, p);
    tree.append_text(&p, "a").unwrap();
    let b = element(&mut tree, "b");
    append(&mut tree, p, b);
    tree.append_text(&p, "c").unwrap();

    assert_eq!(tree.children(p).len(), 3);
    assert_eq!(tree.text_content(p), "ac");
}

#[test]
fn test_insert_text_before_merges_with_previous_sibling() {
    let mut tree = DomTree::new();
    let body = element(&mut tree, "body");
    let table = element(&mut tree, "table");
    append(&mut tree, NodeId::ROOT, body);
    append(&mut tree, body, table);

    tree.insert_text_before(&body, &table, "x").unwrap();
    tree.insert_text_before(&body, &table, "y").unwrap();

    assert_eq!(tree.children(body).len(), 2);
    assert_eq!(tree.as_text(tree.children(body)[0]), Some("xy"));
    assert_eq!(tree.children(body)[1], table);
}

// ========== structure ==========

#[test]
fn test_insert_before_requires_a_child_reference() {
    let mut tree = DomTree::new();
    let a = element(&mut tree, "a");
    let b = element(&mut tree, "b");
    let stray = element(&mut tree, "c");
    append(&mut tree, NodeId::ROOT, a);

    let result = TreeSink::insert_before(&mut tree, &a, &b, &stray);
    assert!(result.is_err());
}

#[test]
fn test_cycles_are_rejected() {
    let mut tree = DomTree::new();
    let outer = element(&mut tree, "div");
    let inner = element(&mut tree, "span");
    append(&mut tree, NodeId::ROOT, outer);
    append(&mut tree, outer, inner);

    assert!(TreeSink::append_child(&mut tree, &inner, &outer).is_err());
    assert!(TreeSink::append_child(&mut tree, &outer, &outer).is_err());
}

#[test]
fn test_unknown_handles_are_errors() {
    let tree = DomTree::new();
    assert!(tree.has_children(&NodeId(99)).is_err());
    assert!(tree.parent_of(&NodeId(99)).is_err());
}

#[test]
fn test_move_all_children_keeps_order() {
    let mut tree = DomTree::new();
    let from = element(&mut tree, "div");
    let to = element(&mut tree, "span");
    append(&mut tree, NodeId::ROOT, from);
    append(&mut tree, NodeId::ROOT, to);
    let existing = element(&mut tree, "x");
    append(&mut tree, to, existing);
    let a = element(&mut tree, "a");
    let b = element(&mut tree, "b");
    append(&mut tree, from, a);
    append(&mut tree, from, b);

    tree.move_all_children(&from, &to).unwrap();

    assert!(!tree.has_children(&from).unwrap());
    assert_eq!(tree.children(to), &[existing, a, b]);
    assert_eq!(tree.parent(a), Some(to));
    assert_eq!(tree.prev_sibling(a), Some(existing));
}

#[test]
fn test_detach_removes_from_parent() {
    let mut tree = DomTree::new();
    let a = element(&mut tree, "a");
    let b = element(&mut tree, "b");
    let c = element(&mut tree, "c");
    append(&mut tree, NodeId::ROOT, a);
    append(&mut tree, a, b);
    append(&mut tree, a, c);

    TreeSink::detach(&mut tree, &b).unwrap();

    assert_eq!(tree.children(a), &[c]);
    assert_eq!(tree.parent_of(&b).unwrap(), None);
    assert_eq!(tree.prev_sibling(c), None);
}

// ========== elements ==========

#[test]
fn test_shallow_clone_copies_name_and_attributes_only() {
    let mut tree = DomTree::new();
    let b = tree
        .create_element(&QualName::html("b"), &[Attribute::new("class", "x")], None)
        .unwrap();
    append(&mut tree, NodeId::ROOT, b);
    tree.append_text(&b, "text").unwrap();

    let clone = tree.shallow_clone(&b).unwrap();

    assert_ne!(clone, b);
    assert_eq!(tree.parent(clone), None);
    assert!(tree.children(clone).is_empty());
    let data = tree.as_element(clone).unwrap();
    assert_eq!(data.local_name(), "b");
    assert_eq!(data.attribute("class"), Some("x"));
}

#[test]
fn test_shallow_clone_of_text_is_an_error() {
    let mut tree = DomTree::new();
    let text = tree.create_text("x").unwrap();
    assert!(tree.shallow_clone(&text).is_err());
}

#[test]
fn test_add_attrs_if_missing_keeps_existing_values() {
    let mut tree = DomTree::new();
    let html = tree
        .create_element(&QualName::html("html"), &[Attribute::new("lang", "en")], None)
        .unwrap();

    tree.add_attrs_if_missing(
        &html,
        &[Attribute::new("lang", "fr"), Attribute::new("dir", "ltr")],
    )
    .unwrap();

    let data = tree.as_element(html).unwrap();
    assert_eq!(data.attribute("lang"), Some("en"));
    assert_eq!(data.attribute("dir"), Some("ltr"));
    assert_eq!(data.attrs.len(), 2);
}

#[test]
fn test_template_has_separate_contents() {
    let mut tree = DomTree::new();
    let template = element(&mut tree, "template");
    let contents = tree.template_contents(&template).unwrap();

    assert_ne!(contents, template);
    assert!(matches!(tree.get(contents).unwrap().kind, NodeKind::DocumentFragment));

    let div = element(&mut tree, "div");
    assert!(tree.template_contents(&div).is_err());
}

#[test]
fn test_form_owner_is_recorded() {
    let mut tree = DomTree::new();
    let form = element(&mut tree, "form");
    let input = tree
        .create_element(&QualName::html("input"), &[], Some(&form))
        .unwrap();
    assert_eq!(tree.as_element(input).unwrap().form_owner, Some(form));
}

#[test]
fn test_suspending_tree_flags_matching_pops() {
    let mut tree = DomTree::suspending_after("script");
    let script = element(&mut tree, "script");
    let div = element(&mut tree, "div");

    assert_eq!(tree.element_popped(&script).unwrap(), Flow::Suspend);
    assert_eq!(tree.element_popped(&div).unwrap(), Flow::Continue);
}

#[test]
fn test_reset_discards_everything() {
    let mut tree = DomTree::new();
    tree.append_doctype("html", "", "").unwrap();
    let html = element(&mut tree, "html");
    append(&mut tree, NodeId::ROOT, html);

    tree.reset().unwrap();

    assert_eq!(tree.len(), 1);
    assert!(tree.children(NodeId::ROOT).is_empty());
    assert_eq!(tree.document_element(), None);
}
