//! Recursive-descent template parser
//!
//! Consumes the tokenizer's stream left-to-right, one `parse_node` call per AST node.
//! `parse_children` accumulates nodes until a close, block-close, block-continue or
//! end-of-input token and leaves that token for the caller.

use crate::error::{ParseError, Result};
use crate::lexer::Tokenizer;
use crate::token::{Token, TokenKind};
use dominator_core::ast::{
    EachBlock, ElseBlock, Element, Expression, IfBlock, Node, Program, Text,
};
use dominator_core::SourceLocation;
use serde::{Deserialize, Serialize};

/// How close tags are checked against open elements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Close tags must match; unclosed elements and stray closes are errors
    #[default]
    Strict,
    /// Any close tag closes the current element, missing closes are tolerated
    Lax,
}

impl std::str::FromStr for ParseMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(ParseMode::Strict),
            "lax" => Ok(ParseMode::Lax),
            other => Err(format!("unknown parse mode '{}'", other)),
        }
    }
}

/// Parser options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserOptions {
    pub mode: ParseMode,
}

impl ParserOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options reproducing the permissive close-tag handling
    pub fn lax() -> Self {
        Self {
            mode: ParseMode::Lax,
        }
    }

    pub fn with_mode(mut self, mode: ParseMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Template parser
#[derive(Debug, Clone, Default)]
pub struct TemplateParser {
    options: ParserOptions,
}

impl TemplateParser {
    /// Create a strict parser
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParserOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse template source into a `Node::Program`
    pub fn parse(&self, source: &str) -> Result<Node> {
        let tokens = Tokenizer::new(source).tokenize()?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            mode: self.options.mode,
        };

        let program = parser.parse_program()?;
        log::debug!(
            "parsed template ({} nodes, {:?} mode)",
            program.count(),
            self.options.mode
        );
        Ok(program)
    }
}

/// Parse with default (strict) options
pub fn parse(source: &str) -> Result<Node> {
    TemplateParser::new().parse(source)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    mode: ParseMode,
}

impl Parser {
    fn parse_program(&mut self) -> Result<Node> {
        let mut children = self.parse_children()?;

        loop {
            let token = self.peek().clone();
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::TagClose { tag } => {
                    if self.mode == ParseMode::Strict {
                        return Err(ParseError::UnexpectedCloseTag {
                            found: tag,
                            loc: token.loc,
                        });
                    }
                    log::debug!("ignoring stray </{}> at {}", tag, token.loc);
                    self.advance();
                    children.extend(self.parse_children()?);
                }
                other => {
                    return Err(ParseError::UnexpectedToken {
                        found: other.to_string(),
                        loc: token.loc,
                    })
                }
            }
        }

        Ok(Node::Program(Program { children }))
    }

    fn parse_children(&mut self) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        while !matches!(
            self.peek().kind,
            TokenKind::TagClose { .. }
                | TokenKind::BlockClose(_)
                | TokenKind::BlockContinue(_)
                | TokenKind::Eof
        ) {
            nodes.push(self.parse_node()?);
        }
        Ok(nodes)
    }

    fn parse_node(&mut self) -> Result<Node> {
        let Token { kind, loc } = self.advance();

        match kind {
            TokenKind::TagOpen { tag, attributes } => {
                let children = self.parse_children()?;
                self.expect_close_tag(&tag, loc)?;
                Ok(element_node(Element {
                    tag,
                    attributes,
                    children,
                    self_closing: false,
                    loc,
                }))
            }
            TokenKind::SelfClose { tag, attributes } => Ok(element_node(Element {
                tag,
                attributes,
                children: Vec::new(),
                self_closing: true,
                loc,
            })),
            TokenKind::Text(value) => Ok(Node::Text(Text { value, loc })),
            TokenKind::Expression(expression) => {
                Ok(Node::Expression(Expression { expression, loc }))
            }
            TokenKind::BlockOpen(header) => self.parse_block(header, loc),
            other => Err(ParseError::UnexpectedToken {
                found: other.to_string(),
                loc,
            }),
        }
    }

    fn expect_close_tag(&mut self, tag: &str, open: SourceLocation) -> Result<()> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::TagClose { tag: found } => {
                self.advance();
                if found != tag && self.mode == ParseMode::Strict {
                    return Err(ParseError::MismatchedCloseTag {
                        expected: tag.to_string(),
                        found,
                        loc: token.loc,
                    });
                }
                Ok(())
            }
            // End of input or an enclosing block boundary
            _ if self.mode == ParseMode::Lax => Ok(()),
            _ => Err(ParseError::UnclosedElement {
                tag: tag.to_string(),
                loc: open,
            }),
        }
    }

    fn parse_block(&mut self, header: String, loc: SourceLocation) -> Result<Node> {
        let (keyword, rest) = split_keyword(&header);

        match keyword {
            "each" => {
                let (expression, context, key) = parse_each_header(rest).map_err(|expected| {
                    ParseError::MalformedBlock {
                        header: header.clone(),
                        expected: expected.to_string(),
                        loc,
                    }
                })?;
                let children = self.parse_block_children()?;
                self.expect_block_close("each", loc)?;
                Ok(Node::Each(EachBlock {
                    expression,
                    context,
                    key,
                    children,
                    loc,
                }))
            }
            "if" => {
                if rest.is_empty() {
                    return Err(ParseError::MalformedBlock {
                        header,
                        expected: "condition after 'if'".to_string(),
                        loc,
                    });
                }
                let block = self.parse_if_body(rest.to_string(), loc)?;
                self.expect_block_close("if", loc)?;
                Ok(Node::If(block))
            }
            _ => Err(ParseError::UnsupportedBlock { header, loc }),
        }
    }

    /// Body plus any `{:else}` / `{:else if}` continuations; the shared `{/if}` is left
    fn parse_if_body(&mut self, expression: String, loc: SourceLocation) -> Result<IfBlock> {
        let children = self.parse_block_children()?;

        let token = self.peek().clone();
        let else_branch = match token.kind {
            TokenKind::BlockContinue(header) => {
                self.advance();
                Some(self.parse_else(header, token.loc)?)
            }
            _ => None,
        };

        Ok(IfBlock {
            expression,
            children,
            else_branch,
            loc,
        })
    }

    fn parse_else(&mut self, header: String, loc: SourceLocation) -> Result<ElseBlock> {
        let (keyword, rest) = split_keyword(&header);
        if keyword != "else" {
            return Err(ParseError::UnexpectedToken {
                found: TokenKind::BlockContinue(header.clone()).to_string(),
                loc,
            });
        }

        if rest.is_empty() {
            let children = self.parse_block_children()?;
            return Ok(ElseBlock { children, loc });
        }

        match split_keyword(rest) {
            ("if", condition) if !condition.is_empty() => {
                let nested = self.parse_if_body(condition.to_string(), loc)?;
                Ok(ElseBlock {
                    children: vec![Node::If(nested)],
                    loc,
                })
            }
            _ => Err(ParseError::MalformedBlock {
                header: header.clone(),
                expected: "'else' or 'else if <condition>'".to_string(),
                loc,
            }),
        }
    }

    fn expect_block_close(&mut self, kind: &str, open: SourceLocation) -> Result<()> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::BlockClose(header) => {
                self.advance();
                let found = split_keyword(&header).0.to_string();
                if found != kind {
                    return Err(ParseError::MismatchedBlockClose {
                        expected: kind.to_string(),
                        found,
                        loc: token.loc,
                    });
                }
                Ok(())
            }
            TokenKind::Eof => Err(ParseError::UnclosedBlock {
                kind: kind.to_string(),
                loc: open,
            }),
            TokenKind::TagClose { tag } => Err(ParseError::UnexpectedCloseTag {
                found: tag,
                loc: token.loc,
            }),
            other => Err(ParseError::UnexpectedToken {
                found: other.to_string(),
                loc: token.loc,
            }),
        }
    }

    /// Block body; in lax mode stray close tags inside the block are skipped
    fn parse_block_children(&mut self) -> Result<Vec<Node>> {
        let mut children = self.parse_children()?;
        while self.mode == ParseMode::Lax {
            let token = self.peek().clone();
            let TokenKind::TagClose { tag } = token.kind else {
                break;
            };
            log::debug!("ignoring stray </{}> at {}", tag, token.loc);
            self.advance();
            children.extend(self.parse_children()?);
        }
        Ok(children)
    }

    fn peek(&self) -> &Token {
        // The stream always ends with Eof, which is never consumed past
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !token.is_eof() {
            self.pos += 1;
        }
        token
    }
}

fn element_node(element: Element) -> Node {
    if Node::is_component_tag(&element.tag) {
        Node::Component(element)
    } else {
        Node::Element(element)
    }
}

/// First whitespace-delimited word and the trimmed remainder
fn split_keyword(header: &str) -> (&str, &str) {
    let header = header.trim();
    match header.find(char::is_whitespace) {
        Some(idx) => (&header[..idx], header[idx..].trim()),
        None => (header, ""),
    }
}

/// `<expr> as <name> [(<key>)]`; the error names what was expected
fn parse_each_header(
    rest: &str,
) -> std::result::Result<(String, String, Option<String>), &'static str> {
    let as_idx = find_as_keyword(rest).ok_or("'as <name>' after the iterable")?;

    let expression = rest[..as_idx].trim();
    if expression.is_empty() {
        return Err("iterable expression before 'as'");
    }

    let after = rest[as_idx + 2..].trim();
    let binding_len = after
        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
        .unwrap_or(after.len());
    let binding = &after[..binding_len];
    if binding.is_empty() {
        return Err("binding name after 'as'");
    }

    let tail = after[binding_len..].trim();
    let key = if tail.is_empty() {
        None
    } else {
        let inner = tail
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or("'(<key>)' after the binding name")?;
        Some(inner.to_string())
    };

    Ok((expression.to_string(), binding.to_string(), key))
}

/// Byte index of the first standalone `as` word
fn find_as_keyword(text: &str) -> Option<usize> {
    text.match_indices("as").map(|(idx, _)| idx).find(|&idx| {
        let before = text[..idx].chars().next_back();
        let after = text[idx + 2..].chars().next();
        before.is_some_and(char::is_whitespace) && after.map_or(true, char::is_whitespace)
    })
}
