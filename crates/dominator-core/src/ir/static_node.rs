//! Precomputed static fragments

use serde::{Deserialize, Serialize};

/// A compile-time-constant subtree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StaticNode {
    Element {
        tag: String,
        /// `(name, value)`; `None` for flag attributes
        attributes: Vec<(String, Option<String>)>,
        children: Vec<StaticNode>,
    },
    Text(String),
}

impl StaticNode {
    /// Serialize to HTML markup
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            StaticNode::Text(text) => out.push_str(&escape_text(text)),
            StaticNode::Element {
                tag,
                attributes,
                children,
            } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    if let Some(value) = value {
                        out.push_str("=\"");
                        out.push_str(&escape_attribute(value));
                        out.push('"');
                    }
                }
                out.push('>');
                for child in children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    /// Number of nodes in this fragment
    pub fn node_count(&self) -> usize {
        match self {
            StaticNode::Text(_) => 1,
            StaticNode::Element { children, .. } => {
                1 + children.iter().map(StaticNode::node_count).sum::<usize>()
            }
        }
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
