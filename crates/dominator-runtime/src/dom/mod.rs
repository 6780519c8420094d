//! Host visual tree
//!
//! The renderer only talks to the tree through [`Document`]. Fragments follow DOM
//! semantics: appending or inserting one moves its children and leaves it empty.

pub mod memory;

pub use memory::{MemoryDocument, NodeId};

use dominator_core::Value;
use std::fmt;
use std::rc::Rc;

/// Event listener; receives the dispatched payload
pub type EventListener = Rc<dyn Fn(&Value)>;

/// Retained-mode tree the renderer builds into
pub trait Document {
    type Node: Clone + PartialEq + fmt::Debug + 'static;

    fn create_element(&self, tag: &str) -> Self::Node;
    fn create_text(&self, text: &str) -> Self::Node;
    fn create_fragment(&self) -> Self::Node;
    /// Invisible placeholder nodes are inserted before
    fn create_anchor(&self, label: &str) -> Self::Node;

    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);
    fn remove_attribute(&self, node: &Self::Node, name: &str);
    fn set_style(&self, node: &Self::Node, property: &str, value: &str);
    fn set_text(&self, node: &Self::Node, text: &str);

    fn append_child(&self, parent: &Self::Node, child: &Self::Node);
    fn insert_before(&self, parent: &Self::Node, child: &Self::Node, reference: &Self::Node);
    /// Detach `node` from its parent
    fn remove(&self, node: &Self::Node);
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
    fn child_nodes(&self, node: &Self::Node) -> Vec<Self::Node>;
    fn is_fragment(&self, node: &Self::Node) -> bool;

    fn add_event_listener(&self, node: &Self::Node, event: &str, listener: EventListener);
}
