//! In-memory document
//!
//! Arena-backed [`Document`] used by tests and by hosts without a real tree.
//! Detached nodes stay in the arena.

use super::{Document, EventListener};
use dominator_core::Value;
use std::cell::RefCell;
use std::fmt;

/// Index of a node in a [`MemoryDocument`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

enum NodeKind {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        styles: Vec<(String, String)>,
    },
    Text(String),
    Fragment,
    Comment(String),
}

struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<(String, EventListener)>,
}

#[derive(Default)]
pub struct MemoryDocument {
    nodes: RefCell<Vec<NodeData>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&self, kind: NodeKind) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        });
        NodeId(nodes.len() - 1)
    }

    /// Nodes ever created
    pub fn node_count(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn tag(&self, node: NodeId) -> Option<String> {
        match &self.nodes.borrow()[node.0].kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            _ => None,
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match &self.nodes.borrow()[node.0].kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        match &self.nodes.borrow()[node.0].kind {
            NodeKind::Element { styles, .. } => styles
                .iter()
                .find(|(p, _)| p == property)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes.borrow()[node.0].children.clone()
    }

    /// Element children only, skipping text and anchors
    pub fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        let nodes = self.nodes.borrow();
        nodes[node.0]
            .children
            .iter()
            .copied()
            .filter(|child| matches!(nodes[child.0].kind, NodeKind::Element { .. }))
            .collect()
    }

    /// Concatenated text of `node` and its descendants
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let children = {
            let nodes = self.nodes.borrow();
            if let NodeKind::Text(text) = &nodes[node.0].kind {
                out.push_str(text);
            }
            nodes[node.0].children.clone()
        };
        for child in children {
            self.collect_text(child, out);
        }
    }

    /// Serialize `node` as markup; anchors render as comments
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let children = {
            let nodes = self.nodes.borrow();
            let data = &nodes[node.0];
            match &data.kind {
                NodeKind::Text(text) => {
                    out.push_str(&escape(text));
                    return;
                }
                NodeKind::Comment(label) => {
                    out.push_str(&format!("<!--{}-->", label));
                    return;
                }
                NodeKind::Fragment => {}
                NodeKind::Element {
                    tag,
                    attributes,
                    styles,
                } => {
                    out.push('<');
                    out.push_str(tag);
                    for (name, value) in attributes {
                        out.push_str(&format!(" {}=\"{}\"", name, escape(value)));
                    }
                    if !styles.is_empty() {
                        let style = styles
                            .iter()
                            .map(|(p, v)| format!("{}: {}", p, v))
                            .collect::<Vec<_>>()
                            .join("; ");
                        out.push_str(&format!(" style=\"{}\"", escape(&style)));
                    }
                    out.push('>');
                }
            }
            data.children.clone()
        };

        for child in children {
            self.write_html(child, out);
        }
        if let Some(tag) = self.tag(node) {
            out.push_str(&format!("</{}>", tag));
        }
    }

    /// Invoke every `event` listener on `node`; returns how many ran
    pub fn dispatch(&self, node: NodeId, event: &str, payload: &Value) -> usize {
        let listeners: Vec<EventListener> = self.nodes.borrow()[node.0]
            .listeners
            .iter()
            .filter(|(name, _)| name == event)
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in &listeners {
            listener(payload);
        }
        listeners.len()
    }

    fn detach(&self, node: NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        if let Some(parent) = nodes[node.0].parent.take() {
            nodes[parent.0].children.retain(|child| *child != node);
        }
    }

    /// Nodes that actually land in a parent: a fragment contributes its children
    fn take_insertable(&self, node: NodeId) -> Vec<NodeId> {
        if self.is_fragment(&node) {
            let mut nodes = self.nodes.borrow_mut();
            let children = std::mem::take(&mut nodes[node.0].children);
            for child in &children {
                nodes[child.0].parent = None;
            }
            children
        } else {
            self.detach(node);
            vec![node]
        }
    }
}

impl Document for MemoryDocument {
    type Node = NodeId;

    fn create_element(&self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element {
            tag: tag.to_string(),
            attributes: Vec::new(),
            styles: Vec::new(),
        })
    }

    fn create_text(&self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    fn create_fragment(&self) -> NodeId {
        self.alloc(NodeKind::Fragment)
    }

    fn create_anchor(&self, label: &str) -> NodeId {
        self.alloc(NodeKind::Comment(label.to_string()))
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attributes, .. } = &mut self.nodes.borrow_mut()[node.0].kind {
            match attributes.iter_mut().find(|(n, _)| n == name) {
                Some(entry) => entry.1 = value.to_string(),
                None => attributes.push((name.to_string(), value.to_string())),
            }
        }
    }

    fn remove_attribute(&self, node: &NodeId, name: &str) {
        if let NodeKind::Element { attributes, .. } = &mut self.nodes.borrow_mut()[node.0].kind {
            attributes.retain(|(n, _)| n != name);
        }
    }

    fn set_style(&self, node: &NodeId, property: &str, value: &str) {
        if let NodeKind::Element { styles, .. } = &mut self.nodes.borrow_mut()[node.0].kind {
            match styles.iter_mut().find(|(p, _)| p == property) {
                Some(entry) => entry.1 = value.to_string(),
                None => styles.push((property.to_string(), value.to_string())),
            }
        }
    }

    fn set_text(&self, node: &NodeId, text: &str) {
        if let NodeKind::Text(current) = &mut self.nodes.borrow_mut()[node.0].kind {
            *current = text.to_string();
        }
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) {
        let moved = self.take_insertable(*child);
        let mut nodes = self.nodes.borrow_mut();
        for node in moved {
            nodes[node.0].parent = Some(*parent);
            nodes[parent.0].children.push(node);
        }
    }

    fn insert_before(&self, parent: &NodeId, child: &NodeId, reference: &NodeId) {
        let moved = self.take_insertable(*child);
        let mut nodes = self.nodes.borrow_mut();
        let mut index = nodes[parent.0]
            .children
            .iter()
            .position(|c| c == reference)
            .unwrap_or(nodes[parent.0].children.len());
        for node in moved {
            nodes[node.0].parent = Some(*parent);
            nodes[parent.0].children.insert(index, node);
            index += 1;
        }
    }

    fn remove(&self, node: &NodeId) {
        self.detach(*node);
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes.borrow()[node.0].parent
    }

    fn child_nodes(&self, node: &NodeId) -> Vec<NodeId> {
        self.children(*node)
    }

    fn is_fragment(&self, node: &NodeId) -> bool {
        matches!(self.nodes.borrow()[node.0].kind, NodeKind::Fragment)
    }

    fn add_event_listener(&self, node: &NodeId, event: &str, listener: EventListener) {
        self.nodes.borrow_mut()[node.0]
            .listeners
            .push((event.to_string(), listener));
    }
}

impl fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("nodes", &self.node_count())
            .finish()
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_build_and_serialize() {
        let doc = MemoryDocument::new();
        let div = doc.create_element("div");
        doc.set_attribute(&div, "class", "x");
        doc.set_style(&div, "color", "red");
        let text = doc.create_text("a < b");
        doc.append_child(&div, &text);

        assert_eq!(
            doc.to_html(div),
            "<div class=\"x\" style=\"color: red\">a &lt; b</div>"
        );
        assert_eq!(doc.text_content(div), "a < b");
    }

    #[test]
    fn test_fragment_children_move_on_insert() {
        let doc = MemoryDocument::new();
        let list = doc.create_element("ul");
        let anchor = doc.create_anchor("each");
        doc.append_child(&list, &anchor);

        let fragment = doc.create_fragment();
        let a = doc.create_element("li");
        let b = doc.create_element("li");
        doc.append_child(&fragment, &a);
        doc.append_child(&fragment, &b);

        doc.insert_before(&list, &fragment, &anchor);
        assert_eq!(doc.children(list), vec![a, b, anchor]);
        assert!(doc.children(fragment).is_empty());
        assert_eq!(doc.parent(&a), Some(list));

        doc.remove(&a);
        assert_eq!(doc.children(list), vec![b, anchor]);
        assert_eq!(doc.parent(&a), None);
    }

    #[test]
    fn test_reinsert_moves_node() {
        let doc = MemoryDocument::new();
        let parent = doc.create_element("p");
        let (x, y) = (doc.create_text("x"), doc.create_text("y"));
        doc.append_child(&parent, &x);
        doc.append_child(&parent, &y);

        doc.insert_before(&parent, &y, &x);
        assert_eq!(doc.text_content(parent), "yx");
    }

    #[test]
    fn test_dispatch() {
        let doc = MemoryDocument::new();
        let button = doc.create_element("button");
        let clicks = Rc::new(Cell::new(0));

        let counter = clicks.clone();
        doc.add_event_listener(
            &button,
            "click",
            Rc::new(move |_: &Value| counter.set(counter.get() + 1)),
        );

        assert_eq!(doc.dispatch(button, "click", &Value::Null), 1);
        assert_eq!(doc.dispatch(button, "input", &Value::Null), 0);
        assert_eq!(clicks.get(), 1);
    }
}
