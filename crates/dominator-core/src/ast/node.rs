//! Template AST nodes
//!
//! The tree is built once per compile and is immutable afterwards.

use super::attribute::Attributes;
use super::location::SourceLocation;
use serde::{Deserialize, Serialize};

/// Template AST node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Root of a parsed template
    Program(Program),

    /// Lower-case tag, lowered to a host element
    Element(Element),

    /// Tag whose first character is upper-case
    Component(Element),

    /// Literal text run
    Text(Text),

    /// Embedded `{expr}`
    Expression(Expression),

    /// `{#each items as item}...{/each}`
    Each(EachBlock),

    /// `{#if cond}...{:else}...{/if}`
    If(IfBlock),

    /// Body of an `{:else}` branch
    Else(ElseBlock),
}

/// Template root
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub children: Vec<Node>,
}

/// Element or component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    pub attributes: Attributes,
    pub children: Vec<Node>,
    pub self_closing: bool,
    pub loc: SourceLocation,
}

/// Text run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub value: String,
    pub loc: SourceLocation,
}

/// Embedded expression, raw text spliced verbatim into generated code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub expression: String,
    pub loc: SourceLocation,
}

/// Iteration block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EachBlock {
    /// Iterable expression
    pub expression: String,
    /// Per-iteration binding name
    pub context: String,
    /// Optional row identity expression, `(item.id)`
    pub key: Option<String>,
    pub children: Vec<Node>,
    pub loc: SourceLocation,
}

/// Conditional block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfBlock {
    pub expression: String,
    pub children: Vec<Node>,
    pub else_branch: Option<ElseBlock>,
    pub loc: SourceLocation,
}

/// Else branch of a conditional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElseBlock {
    pub children: Vec<Node>,
    pub loc: SourceLocation,
}

impl Node {
    /// Components are dispatched purely on the case of the first character
    pub fn is_component_tag(tag: &str) -> bool {
        tag.chars().next().is_some_and(|c| c.is_uppercase())
    }

    /// Create a program node
    pub fn program(children: Vec<Node>) -> Self {
        Node::Program(Program { children })
    }

    /// Create an element or component node depending on the tag
    pub fn element(tag: impl Into<String>, attributes: Attributes, children: Vec<Node>) -> Self {
        let element = Element {
            tag: tag.into(),
            attributes,
            children,
            self_closing: false,
            loc: SourceLocation::default(),
        };
        if Self::is_component_tag(&element.tag) {
            Node::Component(element)
        } else {
            Node::Element(element)
        }
    }

    /// Create a text node
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(Text {
            value: value.into(),
            loc: SourceLocation::default(),
        })
    }

    /// Create an expression node
    pub fn expression(expression: impl Into<String>) -> Self {
        Node::Expression(Expression {
            expression: expression.into(),
            loc: SourceLocation::default(),
        })
    }

    /// Create an unkeyed each block
    pub fn each(
        expression: impl Into<String>,
        context: impl Into<String>,
        children: Vec<Node>,
    ) -> Self {
        Node::Each(EachBlock {
            expression: expression.into(),
            context: context.into(),
            key: None,
            children,
            loc: SourceLocation::default(),
        })
    }

    /// Create an if block
    pub fn if_block(
        expression: impl Into<String>,
        children: Vec<Node>,
        else_children: Option<Vec<Node>>,
    ) -> Self {
        Node::If(IfBlock {
            expression: expression.into(),
            children,
            else_branch: else_children.map(|children| ElseBlock {
                children,
                loc: SourceLocation::default(),
            }),
            loc: SourceLocation::default(),
        })
    }

    /// Child nodes (empty for leaves; an `If`'s else branch is not included)
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Program(program) => &program.children,
            Node::Element(element) | Node::Component(element) => &element.children,
            Node::Each(each) => &each.children,
            Node::If(if_block) => &if_block.children,
            Node::Else(else_block) => &else_block.children,
            Node::Text(_) | Node::Expression(_) => &[],
        }
    }

    /// Short kind name used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Program(_) => "Program",
            Node::Element(_) => "Element",
            Node::Component(_) => "Component",
            Node::Text(_) => "Text",
            Node::Expression(_) => "Expression",
            Node::Each(_) => "Each",
            Node::If(_) => "If",
            Node::Else(_) => "Else",
        }
    }

    /// Source location, if the node kind carries one
    pub fn loc(&self) -> Option<SourceLocation> {
        match self {
            Node::Program(_) => None,
            Node::Element(element) | Node::Component(element) => Some(element.loc),
            Node::Text(text) => Some(text.loc),
            Node::Expression(expr) => Some(expr.loc),
            Node::Each(each) => Some(each.loc),
            Node::If(if_block) => Some(if_block.loc),
            Node::Else(else_block) => Some(else_block.loc),
        }
    }

    /// Total number of nodes in this subtree, else branches included
    pub fn count(&self) -> usize {
        let else_count = match self {
            Node::If(IfBlock {
                else_branch: Some(else_branch),
                ..
            }) => else_branch.children.iter().map(Node::count).sum(),
            _ => 0,
        };
        1 + else_count + self.children().iter().map(Node::count).sum::<usize>()
    }
}
