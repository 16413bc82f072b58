//! The arena tree.
//!
//! Every node lives in one vector and refers to its relatives by [`NodeId`].
//! Detached nodes stay in the arena; nothing is ever freed until
//! [`DomTree::clear`].

use std::collections::HashSet;

use weft_html::{Attribute, DocumentMode, QualName};

/// A type-safe index into a [`DomTree`].
///
/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The document node is always at index 0.
    pub const ROOT: Self = Self(0);
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Node is an abstract interface that is used by all nodes in a tree."
#[derive(Debug, Clone)]
pub struct Node {
    /// "Each node has an associated node type"
    pub kind: NodeKind,

    /// [§ 4.2.1](https://dom.spec.whatwg.org/#concept-tree-parent)
    /// "An object that participates in a tree has a parent, which is either
    /// null or an object."
    pub parent: Option<NodeId>,

    /// [§ 4.2.1](https://dom.spec.whatwg.org/#concept-tree-child)
    /// "A node has an associated list of children"
    pub children: Vec<NodeId>,
}

/// The kinds of node the parser creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// [§ 4.5 Interface Document](https://dom.spec.whatwg.org/#interface-document)
    Document,
    /// [§ 4.7 Interface `DocumentFragment`](https://dom.spec.whatwg.org/#interface-documentfragment).
    /// Only used for template contents.
    DocumentFragment,
    /// [§ 4.6 Interface `DocumentType`](https://dom.spec.whatwg.org/#interface-documenttype)
    Doctype(DoctypeData),
    /// [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element)
    Element(ElementData),
    /// [§ 4.11 Interface Text](https://dom.spec.whatwg.org/#interface-text)
    Text(String),
    /// [§ 4.14 Interface Comment](https://dom.spec.whatwg.org/#interface-comment)
    Comment(String),
}

/// "`DocumentType` nodes are simply known as doctypes. Doctypes have an
/// associated name, public ID, and system ID."
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DoctypeData {
    /// The name, empty if the DOCTYPE token had none.
    pub name: String,
    /// The public identifier, empty if missing.
    pub public_id: String,
    /// The system identifier, empty if missing.
    pub system_id: String,
}

/// Element-specific data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// "Elements have an associated namespace, namespace prefix, local name"
    pub name: QualName,
    /// "An element has an associated attribute list". Kept in source order.
    pub attrs: Vec<Attribute>,
    /// [§ 4.10.17.3 Association of controls and forms](https://html.spec.whatwg.org/multipage/form-control-infrastructure.html#form-owner)
    pub form_owner: Option<NodeId>,
    /// "The template contents is a `DocumentFragment`". Set for HTML
    /// `<template>` elements.
    pub template_contents: Option<NodeId>,
}

impl ElementData {
    /// The local name.
    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.name.local
    }

    /// The value of the no-namespace attribute `name`.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.prefix.is_none() && a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Returns the element's id attribute value if present.
    ///
    /// Per [§ 3.2.6 Global attributes](https://html.spec.whatwg.org/multipage/dom.html#global-attributes):
    /// "The id attribute specifies its element's unique identifier (ID)."
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    /// Returns the set of class names from the class attribute.
    #[must_use]
    pub fn classes(&self) -> HashSet<&str> {
        self.attribute("class")
            .map(|list| list.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }
}

/// Arena-based node tree.
///
/// [§ 4 Nodes](https://dom.spec.whatwg.org/#nodes)
///
/// "The DOM represents a document as a tree."
#[derive(Debug, Clone)]
pub struct DomTree {
    /// The Document node is always at index 0 ([`NodeId::ROOT`]).
    nodes: Vec<Node>,
    mode: DocumentMode,
    /// Local name of elements whose popping suspends the parse.
    pub(crate) suspend_on: Option<String>,
}

impl DomTree {
    /// Create a tree holding just the Document node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            mode: DocumentMode::default(),
            suspend_on: None,
        }
    }

    /// A tree that asks the parser to pause every time an element named
    /// `local` is popped off the stack of open elements.
    #[must_use]
    pub fn suspending_after(local: impl Into<String>) -> Self {
        Self {
            suspend_on: Some(local.into()),
            ..Self::new()
        }
    }

    /// Drop every node but the Document, which loses its children.
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        if let Some(document) = self.nodes.first_mut() {
            document.children.clear();
        }
        self.mode = DocumentMode::default();
    }

    /// The root document node ID.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// [§ 2.1.1](https://dom.spec.whatwg.org/#concept-document-mode)
    #[must_use]
    pub const fn document_mode(&self) -> DocumentMode {
        self.mode
    }

    pub(crate) const fn set_document_mode(&mut self, mode: DocumentMode) {
        self.mode = mode;
    }

    /// Get a node by its ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get a node mutably by its ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Number of nodes in the arena, detached ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the Document is never removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a detached node.
    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// [§ 4.2.3 Append](https://dom.spec.whatwg.org/#concept-node-append)
    ///
    /// Moves `child` to the end of `parent`'s children, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// [§ 4.2.3 Pre-insert](https://dom.spec.whatwg.org/#concept-node-pre-insert)
    ///
    /// Inserts `child` into `parent` right before `reference`. Appends when
    /// `reference` is not a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        match children.iter().position(|&c| c == reference) {
            Some(index) => children.insert(index, child),
            None => children.push(child),
        }
        self.nodes[child.0].parent = Some(parent);
    }

    /// [§ 4.2.3 Remove](https://dom.spec.whatwg.org/#concept-node-remove)
    ///
    /// Does nothing if `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        let children = &mut self.nodes[parent.0].children;
        if let Some(index) = children.iter().position(|&c| c == child) {
            let _ = children.remove(index);
            self.nodes[child.0].parent = None;
        }
    }

    /// Remove `child` from whatever parent it has.
    pub fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.parent(child) {
            self.remove_child(parent, child);
        }
    }

    /// Move every child of `from` to the end of `to`, keeping their order.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        let moved = std::mem::take(&mut self.nodes[from.0].children);
        for &child in &moved {
            self.nodes[child.0].parent = Some(to);
        }
        self.nodes[to.0].children.extend(moved);
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Get the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    /// Get the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    fn index_in_parent(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let index = self.children(parent).iter().position(|&c| c == id)?;
        Some((parent, index))
    }

    /// [§ 4.2.1](https://dom.spec.whatwg.org/#concept-tree-next-sibling)
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, index) = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// [§ 4.2.1](https://dom.spec.whatwg.org/#concept-tree-previous-sibling)
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, index) = self.index_in_parent(id)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    /// [§ 4.2.1 Descendant](https://dom.spec.whatwg.org/#concept-tree-descendant)
    ///
    /// "An object A is called a descendant of an object B, if either A is a
    /// child of B or A is a child of an object C that is a descendant of B."
    #[must_use]
    pub fn is_descendant_of(&self, descendant: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(descendant).any(|id| id == ancestor)
    }

    /// Iterate over all ancestors of a node, from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Every node below `id` in tree order. Template contents are not
    /// descended into.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        out
    }

    /// Get element data if this node is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| match &n.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        })
    }

    pub(crate) fn as_element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(|n| match &mut n.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get text content if this node is a text node.
    #[must_use]
    pub fn as_text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.kind {
            NodeKind::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub(crate) fn as_text_mut(&mut self, id: NodeId) -> Option<&mut String> {
        self.get_mut(id).and_then(|n| match &mut n.kind {
            NodeKind::Text(s) => Some(s),
            _ => None,
        })
    }

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-descendant-text-content)
    ///
    /// "The descendant text content of a node node is the concatenation of
    /// the data of all the Text node descendants of node, in tree order."
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.as_text(n))
            .collect()
    }

    /// [§ 3.1.1 The document element](https://html.spec.whatwg.org/multipage/dom.html#the-html-element-2)
    ///
    /// "The document element of a document is the element whose parent is
    /// that document, if it exists; otherwise null."
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(NodeId::ROOT)
            .iter()
            .find(|&&id| self.as_element(id).is_some())
            .copied()
    }

    /// [§ 3.1.3 The body element](https://html.spec.whatwg.org/multipage/dom.html#the-body-element-2)
    ///
    /// "The body element of a document is the first of the html element's
    /// children that is either a body element or a frameset element, or null
    /// if there is no such element."
    #[must_use]
    pub fn body(&self) -> Option<NodeId> {
        let html = self.document_element()?;
        self.children(html)
            .iter()
            .find(|&&id| {
                self.as_element(id)
                    .is_some_and(|e| e.name.is_html("body") || e.name.is_html("frameset"))
            })
            .copied()
    }

    /// The first element below `root` with local name `local`, in tree order.
    #[must_use]
    pub fn find_element(&self, root: NodeId, local: &str) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|&id| self.as_element(id).is_some_and(|e| e.local_name() == local))
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over ancestors of a node.
#[derive(Debug)]
pub struct AncestorIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(tree: &mut DomTree, local: &str) -> NodeId {
        tree.alloc(NodeKind::Element(ElementData {
            name: QualName::html(local),
            attrs: Vec::new(),
            form_owner: None,
            template_contents: None,
        }))
    }

    #[test]
    fn test_append_moves_an_attached_node() {
        let mut tree = DomTree::new();
        let a = element(&mut tree, "a");
        let b = element(&mut tree, "b");
        let c = element(&mut tree, "c");
        tree.append_child(NodeId::ROOT, a);
        tree.append_child(a, c);
        tree.append_child(NodeId::ROOT, b);
        tree.append_child(b, c);

        assert!(tree.children(a).is_empty());
        assert_eq!(tree.children(b), &[c]);
        assert_eq!(tree.parent(c), Some(b));
    }

    #[test]
    fn test_siblings_follow_child_order() {
        let mut tree = DomTree::new();
        let a = element(&mut tree, "a");
        let b = element(&mut tree, "b");
        tree.append_child(NodeId::ROOT, b);
        tree.insert_before(NodeId::ROOT, a, b);

        assert_eq!(tree.next_sibling(a), Some(b));
        assert_eq!(tree.prev_sibling(b), Some(a));
        assert_eq!(tree.prev_sibling(a), None);
    }

    #[test]
    fn test_clear_keeps_only_the_document() {
        let mut tree = DomTree::new();
        let a = element(&mut tree, "a");
        tree.append_child(NodeId::ROOT, a);
        tree.set_document_mode(DocumentMode::Quirks);
        tree.clear();

        assert_eq!(tree.len(), 1);
        assert!(tree.children(NodeId::ROOT).is_empty());
        assert_eq!(tree.document_mode(), DocumentMode::Standards);
    }
}
