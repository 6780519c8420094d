//! Token model produced by the tokenizer

use dominator_core::ast::{AttributeValue, Attributes};
use dominator_core::SourceLocation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token kind with its payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    /// `<tag attr=...>`
    TagOpen { tag: String, attributes: Attributes },
    /// `<tag attr=... />`
    SelfClose { tag: String, attributes: Attributes },
    /// `</tag>`
    TagClose { tag: String },
    /// Text run
    Text(String),
    /// `{expr}`
    Expression(String),
    /// `{#header}`
    BlockOpen(String),
    /// `{:header}`
    BlockContinue(String),
    /// `{/header}`
    BlockClose(String),
    /// End of input
    Eof,
}

/// A token with the location of its first character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub loc: SourceLocation,
}

impl Token {
    pub fn new(kind: TokenKind, loc: SourceLocation) -> Self {
        Self { kind, loc }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Render the token back into template syntax
    pub fn to_source(&self) -> String {
        match &self.kind {
            TokenKind::TagOpen { tag, attributes } => {
                format!("<{}{}>", tag, render_attributes(attributes))
            }
            TokenKind::SelfClose { tag, attributes } => {
                format!("<{}{} />", tag, render_attributes(attributes))
            }
            TokenKind::TagClose { tag } => format!("</{}>", tag),
            TokenKind::Text(text) => text.clone(),
            TokenKind::Expression(expr) => format!("{{{}}}", expr),
            TokenKind::BlockOpen(header) => format!("{{#{}}}", header),
            TokenKind::BlockContinue(header) => format!("{{:{}}}", header),
            TokenKind::BlockClose(header) => format!("{{/{}}}", header),
            TokenKind::Eof => String::new(),
        }
    }
}

fn render_attributes(attributes: &Attributes) -> String {
    let mut out = String::new();
    for attr in attributes {
        out.push(' ');
        out.push_str(&attr.name);
        match &attr.value {
            AttributeValue::Literal(value) if value.contains('"') => {
                out.push_str(&format!("='{}'", value))
            }
            AttributeValue::Literal(value) => out.push_str(&format!("=\"{}\"", value)),
            AttributeValue::Dynamic(expr) => out.push_str(&format!("={{{}}}", expr)),
            AttributeValue::Flag => {}
        }
    }
    out
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::TagOpen { tag, .. } => write!(f, "open tag <{}>", tag),
            TokenKind::SelfClose { tag, .. } => write!(f, "self-closing tag <{} />", tag),
            TokenKind::TagClose { tag } => write!(f, "close tag </{}>", tag),
            TokenKind::Text(_) => write!(f, "text"),
            TokenKind::Expression(_) => write!(f, "expression"),
            TokenKind::BlockOpen(header) => write!(f, "block {{#{}}}", header),
            TokenKind::BlockContinue(header) => write!(f, "block continuation {{:{}}}", header),
            TokenKind::BlockClose(header) => write!(f, "block close {{/{}}}", header),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_source() {
        let attributes: Attributes = vec![
            ("class", AttributeValue::Literal("x".to_string())),
            ("title", AttributeValue::Literal("say \"hi\"".to_string())),
            ("value", AttributeValue::Dynamic("count".to_string())),
            ("disabled", AttributeValue::Flag),
        ]
        .into_iter()
        .collect();
        let token = Token::new(
            TokenKind::TagOpen {
                tag: "input".to_string(),
                attributes,
            },
            SourceLocation::start(),
        );

        assert_eq!(
            token.to_source(),
            "<input class=\"x\" title='say \"hi\"' value={count} disabled>"
        );
        assert_eq!(
            Token::new(TokenKind::BlockContinue("else".to_string()), SourceLocation::start())
                .to_source(),
            "{:else}"
        );
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(TokenKind::Eof.to_string(), "end of input");
        assert_eq!(
            TokenKind::TagClose {
                tag: "li".to_string()
            }
            .to_string(),
            "close tag </li>"
        );
    }
}
