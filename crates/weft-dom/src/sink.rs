//! [`TreeSink`] for [`DomTree`].

use log::trace;
use weft_html::{Attribute, DocumentMode, Flow, QualName, SinkError, SinkResult, TreeSink};

use crate::tree::{DoctypeData, DomTree, ElementData, NodeId, NodeKind};

impl DomTree {
    fn check(&self, id: NodeId) -> SinkResult<()> {
        if self.get(id).is_some() {
            Ok(())
        } else {
            Err(SinkError::new(format!("unknown node {}", id.0)))
        }
    }

    /// [§ 4.2.3](https://dom.spec.whatwg.org/#concept-node-ensure-pre-insertion-validity)
    /// "If node is a host-including inclusive ancestor of parent, then throw
    /// a `HierarchyRequestError` `DOMException`."
    fn check_insertion(&self, parent: NodeId, child: NodeId) -> SinkResult<()> {
        self.check(parent)?;
        self.check(child)?;
        if parent == child || self.is_descendant_of(parent, child) {
            return Err(SinkError::new(format!(
                "inserting node {} into node {} would create a cycle",
                child.0, parent.0
            )));
        }
        Ok(())
    }
}

impl TreeSink for DomTree {
    type Handle = NodeId;

    fn document(&self) -> NodeId {
        NodeId::ROOT
    }

    fn reset(&mut self) -> SinkResult<()> {
        trace!("discarding {} nodes", self.len() - 1);
        self.clear();
        Ok(())
    }

    fn create_element(
        &mut self,
        name: &QualName,
        attributes: &[Attribute],
        form: Option<&NodeId>,
    ) -> SinkResult<NodeId> {
        let template_contents = name
            .is_html("template")
            .then(|| self.alloc(NodeKind::DocumentFragment));
        Ok(self.alloc(NodeKind::Element(ElementData {
            name: name.clone(),
            attrs: attributes.to_vec(),
            form_owner: form.copied(),
            template_contents,
        })))
    }

    fn create_text(&mut self, text: &str) -> SinkResult<NodeId> {
        Ok(self.alloc(NodeKind::Text(text.to_string())))
    }

    fn create_comment(&mut self, text: &str) -> SinkResult<NodeId> {
        Ok(self.alloc(NodeKind::Comment(text.to_string())))
    }

    fn append_doctype(&mut self, name: &str, public_id: &str, system_id: &str) -> SinkResult<()> {
        let doctype = self.alloc(NodeKind::Doctype(DoctypeData {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        }));
        DomTree::append_child(self, NodeId::ROOT, doctype);
        Ok(())
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> SinkResult<()> {
        self.check_insertion(*parent, *child)?;
        DomTree::append_child(self, *parent, *child);
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: &NodeId,
        child: &NodeId,
        sibling: &NodeId,
    ) -> SinkResult<()> {
        self.check_insertion(*parent, *child)?;
        if self.parent(*sibling) != Some(*parent) {
            return Err(SinkError::new(format!(
                "node {} is not a child of node {}",
                sibling.0, parent.0
            )));
        }
        DomTree::insert_before(self, *parent, *child, *sibling);
        Ok(())
    }

    /// "If there is a Text node immediately before the adjusted insertion
    /// location, then append data to that Text node's data."
    fn append_text(&mut self, parent: &NodeId, text: &str) -> SinkResult<()> {
        self.check(*parent)?;
        let last = self.last_child(*parent);
        if let Some(data) = last.and_then(|id| self.as_text_mut(id)) {
            data.push_str(text);
            return Ok(());
        }
        let node = self.alloc(NodeKind::Text(text.to_string()));
        DomTree::append_child(self, *parent, node);
        Ok(())
    }

    fn insert_text_before(
        &mut self,
        parent: &NodeId,
        sibling: &NodeId,
        text: &str,
    ) -> SinkResult<()> {
        self.check(*parent)?;
        let previous = self.prev_sibling(*sibling);
        if let Some(data) = previous.and_then(|id| self.as_text_mut(id)) {
            data.push_str(text);
            return Ok(());
        }
        let node = self.alloc(NodeKind::Text(text.to_string()));
        TreeSink::insert_before(self, parent, &node, sibling)
    }

    fn detach(&mut self, node: &NodeId) -> SinkResult<()> {
        self.check(*node)?;
        DomTree::detach(self, *node);
        Ok(())
    }

    fn move_all_children(&mut self, from: &NodeId, to: &NodeId) -> SinkResult<()> {
        self.check_insertion(*to, *from)?;
        self.move_children(*from, *to);
        Ok(())
    }

    fn has_children(&self, node: &NodeId) -> SinkResult<bool> {
        self.check(*node)?;
        Ok(!self.children(*node).is_empty())
    }

    fn parent_of(&self, node: &NodeId) -> SinkResult<Option<NodeId>> {
        self.check(*node)?;
        Ok(self.parent(*node))
    }

    fn shallow_clone(&mut self, node: &NodeId) -> SinkResult<NodeId> {
        let Some(element) = self.as_element(*node) else {
            return Err(SinkError::new(format!("node {} is not an element", node.0)));
        };
        let name = element.name.clone();
        let attrs = element.attrs.clone();
        self.create_element(&name, &attrs, None)
    }

    fn set_document_mode(
        &mut self,
        mode: DocumentMode,
        _public_id: Option<&str>,
        _system_id: Option<&str>,
    ) -> SinkResult<()> {
        DomTree::set_document_mode(self, mode);
        Ok(())
    }

    fn add_attrs_if_missing(
        &mut self,
        element: &NodeId,
        attributes: &[Attribute],
    ) -> SinkResult<()> {
        let Some(data) = self.as_element_mut(*element) else {
            return Err(SinkError::new(format!("node {} is not an element", element.0)));
        };
        for attr in attributes {
            let present = data
                .attrs
                .iter()
                .any(|a| a.namespace == attr.namespace && a.name == attr.name);
            if !present {
                data.attrs.push(attr.clone());
            }
        }
        Ok(())
    }

    fn template_contents(&mut self, template: &NodeId) -> SinkResult<NodeId> {
        self.as_element(*template)
            .and_then(|e| e.template_contents)
            .ok_or_else(|| SinkError::new(format!("node {} is not a template", template.0)))
    }

    fn element_popped(&mut self, element: &NodeId) -> SinkResult<Flow> {
        let Some(local) = self.suspend_on.as_deref() else {
            return Ok(Flow::Continue);
        };
        let matches = self
            .as_element(*element)
            .is_some_and(|e| e.local_name() == local);
        Ok(if matches { Flow::Suspend } else { Flow::Continue })
    }
}
