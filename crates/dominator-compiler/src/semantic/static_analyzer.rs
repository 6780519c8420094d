//! Static subtree classification
//!
//! A subtree is static when it contains no embedded expressions and no control flow,
//! so it can be built once and cloned instead of wired to reactive bindings.

use dominator_core::ast::Node;
use dominator_core::ValueId;
use std::collections::{BTreeSet, HashMap};

/// Create ids whose element subtree is static, in SSA visitation order
pub type StaticHints = BTreeSet<ValueId>;

/// Pure classification of one node
pub fn is_static_node(node: &Node) -> bool {
    match node {
        Node::Text(_) => true,
        Node::Expression(_) | Node::Each(_) | Node::If(_) | Node::Else(_) => false,
        Node::Element(element) | Node::Component(element) => {
            !element.attributes.has_dynamic() && element.children.iter().all(is_static_node)
        }
        Node::Program(program) => program.children.iter().all(is_static_node),
    }
}

/// Memoizing analyzer used during one lowering pass
///
/// Results are keyed by node address, so an analyzer must not outlive the AST
/// it was used on.
#[derive(Debug, Default)]
pub struct StaticAnalyzer {
    memo: HashMap<*const Node, bool>,
}

impl StaticAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `node`, caching the result for it and every descendant
    pub fn is_static(&mut self, node: &Node) -> bool {
        let key = node as *const Node;
        if let Some(&cached) = self.memo.get(&key) {
            return cached;
        }

        let result = match node {
            Node::Text(_) => true,
            Node::Expression(_) | Node::Each(_) | Node::If(_) | Node::Else(_) => false,
            Node::Element(element) | Node::Component(element) => {
                // Visit every child so descendants are cached too
                let children_static = element
                    .children
                    .iter()
                    .fold(true, |acc, child| self.is_static(child) && acc);
                children_static && !element.attributes.has_dynamic()
            }
            Node::Program(program) => program
                .children
                .iter()
                .fold(true, |acc, child| self.is_static(child) && acc),
        };

        self.memo.insert(key, result);
        result
    }

    /// Number of classified nodes
    pub fn cached(&self) -> usize {
        self.memo.len()
    }

    pub fn clear(&mut self) {
        self.memo.clear();
    }
}
