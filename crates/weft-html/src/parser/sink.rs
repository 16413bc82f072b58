//! The output sink: the only thing the tree builder knows about the tree it
//! builds.
//!
//! A sink hands out opaque handles and performs structural mutations on them.
//! The tree builder keeps handles on its stacks but never looks inside them.

use std::fmt;

use strum_macros::Display;

use crate::error::SinkError;
use crate::names::QualName;
use crate::tokenizer::Attribute;

/// The result of a sink operation. Any error ends the parse.
pub type SinkResult<T> = Result<T, SinkError>;

/// [§ 2.1.1 Document mode](https://dom.spec.whatwg.org/#concept-document-mode)
///
/// "Unless stated otherwise, a document's mode is "no-quirks"."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum DocumentMode {
    /// "no-quirks" mode.
    #[default]
    Standards,
    /// "limited-quirks" mode.
    LimitedQuirks,
    /// "quirks" mode.
    Quirks,
}

/// Whether parsing may continue after an element was popped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    /// Keep going.
    #[default]
    Continue,
    /// Return control to the embedder once the current token is handled.
    Suspend,
}

/// A tree representation the parser can build into.
///
/// Insertion operations (`append_child`, `insert_before`) move the child if it
/// already has a parent.
pub trait TreeSink {
    /// An opaque reference to a node owned by the sink.
    type Handle: Clone + PartialEq + fmt::Debug;

    /// The document node.
    fn document(&self) -> Self::Handle;

    /// Throw away everything built so far. Called before the parse restarts
    /// with another encoding.
    ///
    /// # Errors
    ///
    /// A sink that cannot start over.
    fn reset(&mut self) -> SinkResult<()>;

    /// [§ 13.2.6.1 Create an element for a token](https://html.spec.whatwg.org/multipage/parsing.html#create-an-element-for-the-token)
    ///
    /// `form` is the form owner, when the element is form-associated and a
    /// form element pointer was set.
    ///
    /// # Errors
    ///
    /// The sink cannot create the element.
    fn create_element(
        &mut self,
        name: &QualName,
        attributes: &[Attribute],
        form: Option<&Self::Handle>,
    ) -> SinkResult<Self::Handle>;

    /// Create a detached text node.
    ///
    /// # Errors
    ///
    /// The sink cannot create the node.
    fn create_text(&mut self, text: &str) -> SinkResult<Self::Handle>;

    /// Create a detached comment node.
    ///
    /// # Errors
    ///
    /// The sink cannot create the node.
    fn create_comment(&mut self, text: &str) -> SinkResult<Self::Handle>;

    /// "Append a `DocumentType` node to the `Document` node."
    ///
    /// # Errors
    ///
    /// The sink cannot create the node.
    fn append_doctype(&mut self, name: &str, public_id: &str, system_id: &str) -> SinkResult<()>;

    /// Append `child` as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// The mutation is not possible.
    fn append_child(&mut self, parent: &Self::Handle, child: &Self::Handle) -> SinkResult<()>;

    /// Insert `child` into `parent` right before `sibling`.
    ///
    /// # Errors
    ///
    /// The mutation is not possible.
    fn insert_before(
        &mut self,
        parent: &Self::Handle,
        child: &Self::Handle,
        sibling: &Self::Handle,
    ) -> SinkResult<()>;

    /// [§ 13.2.6.1 Insert a character](https://html.spec.whatwg.org/multipage/parsing.html#insert-a-character):
    /// "If there is a Text node immediately before the adjusted insertion
    /// location, then append data to that Text node's data. Otherwise, create
    /// a new Text node."
    ///
    /// The default always creates a new node. Sinks that merge text override
    /// it.
    ///
    /// # Errors
    ///
    /// The mutation is not possible.
    fn append_text(&mut self, parent: &Self::Handle, text: &str) -> SinkResult<()> {
        let node = self.create_text(text)?;
        self.append_child(parent, &node)
    }

    /// Like [`append_text`](Self::append_text), inserting before `sibling`.
    ///
    /// # Errors
    ///
    /// The mutation is not possible.
    fn insert_text_before(
        &mut self,
        parent: &Self::Handle,
        sibling: &Self::Handle,
        text: &str,
    ) -> SinkResult<()> {
        let node = self.create_text(text)?;
        self.insert_before(parent, &node, sibling)
    }

    /// Remove `node` from its parent, if it has one.
    ///
    /// # Errors
    ///
    /// The mutation is not possible.
    fn detach(&mut self, node: &Self::Handle) -> SinkResult<()>;

    /// Move every child of `from`, in order, to the end of `to`.
    ///
    /// # Errors
    ///
    /// The mutation is not possible.
    fn move_all_children(&mut self, from: &Self::Handle, to: &Self::Handle) -> SinkResult<()>;

    /// Returns true if `node` has children.
    ///
    /// # Errors
    ///
    /// The handle is not known to the sink.
    fn has_children(&self, node: &Self::Handle) -> SinkResult<bool>;

    /// The parent of `node`, if it is attached.
    ///
    /// # Errors
    ///
    /// The handle is not known to the sink.
    fn parent_of(&self, node: &Self::Handle) -> SinkResult<Option<Self::Handle>>;

    /// A copy of the element `node` with the same name and attributes and no
    /// children.
    ///
    /// # Errors
    ///
    /// The handle is not an element.
    fn shallow_clone(&mut self, node: &Self::Handle) -> SinkResult<Self::Handle>;

    /// Set the document's mode. The identifiers are those of the DOCTYPE that
    /// decided it, if any.
    ///
    /// # Errors
    ///
    /// The sink rejects the change.
    fn set_document_mode(
        &mut self,
        mode: DocumentMode,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> SinkResult<()>;

    /// "For each attribute on the token, check to see if the attribute is
    /// already present on the element. If it is not, add the attribute and its
    /// corresponding value to that element."
    ///
    /// # Errors
    ///
    /// The handle is not an element.
    fn add_attrs_if_missing(
        &mut self,
        element: &Self::Handle,
        attributes: &[Attribute],
    ) -> SinkResult<()>;

    /// The node that receives the children of a `<template>`. Defaults to the
    /// template element itself.
    ///
    /// # Errors
    ///
    /// The handle is not a template.
    fn template_contents(&mut self, template: &Self::Handle) -> SinkResult<Self::Handle> {
        Ok(template.clone())
    }

    /// An element was popped off the stack of open elements. Called exactly
    /// once per popped entry.
    ///
    /// # Errors
    ///
    /// Any error ends the parse.
    fn element_popped(&mut self, _element: &Self::Handle) -> SinkResult<Flow> {
        Ok(Flow::Continue)
    }

    /// The parse is over.
    ///
    /// # Errors
    ///
    /// Any error is reported to the embedder.
    fn end(&mut self) -> SinkResult<()> {
        Ok(())
    }
}
