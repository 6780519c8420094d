//! Template tokenizer
//!
//! Converts template source into a flat token stream terminated by [`TokenKind::Eof`].
//!
//! Recognized syntax:
//! - Tags: `<div class="x" value={count} disabled>`, `</div>`, `<br />`
//! - Embedded expressions: `{user.name}` (brace-depth aware, quotes respected)
//! - Blocks: `{#each items as item}`, `{:else}`, `{/each}`
//! - Text runs between the above
//!
//! Unterminated quotes, braces and tags fail with a [`LexError`] instead of
//! producing a truncated stream.

use crate::error::LexError;
use crate::token::{Token, TokenKind};
use dominator_core::ast::{AttributeValue, Attributes};
use dominator_core::SourceLocation;

/// Template tokenizer
pub struct Tokenizer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    offset: usize,
}

impl Tokenizer {
    /// Create a tokenizer over the given source
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    /// Consume the whole source
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        while self.peek().is_some() {
            if let Some(token) = self.next_token()? {
                tokens.push(token);
            }
        }
        tokens.push(Token::new(TokenKind::Eof, self.location()));

        log::trace!("tokenized {} tokens", tokens.len());
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        let loc = self.location();

        match (self.peek(), self.peek_at(1)) {
            (Some('<'), Some('/')) => self.lex_close_tag(loc).map(Some),
            (Some('<'), Some(c)) if is_tag_start(c) => self.lex_open_tag(loc).map(Some),
            (Some('{'), Some(sigil @ ('#' | '/' | ':'))) => {
                self.advance();
                self.advance();
                let header = self.read_braced(loc, "block header")?;
                let kind = match sigil {
                    '#' => TokenKind::BlockOpen(header),
                    '/' => TokenKind::BlockClose(header),
                    _ => TokenKind::BlockContinue(header),
                };
                Ok(Some(Token::new(kind, loc)))
            }
            (Some('{'), _) => {
                self.advance();
                let expression = self.read_braced(loc, "expression")?;
                if expression.is_empty() {
                    return Err(LexError::new(loc, "expression inside '{}'"));
                }
                Ok(Some(Token::new(TokenKind::Expression(expression), loc)))
            }
            _ => Ok(self
                .lex_text()
                .map(|text| Token::new(TokenKind::Text(text), loc))),
        }
    }

    /// `</name>`
    fn lex_close_tag(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        self.advance();
        self.advance();
        self.skip_whitespace();

        let tag = self.read_while(is_tag_char);
        if tag.is_empty() {
            return Err(LexError::new(self.location(), "tag name after '</'"));
        }

        self.skip_whitespace();
        match self.advance() {
            Some('>') => Ok(Token::new(TokenKind::TagClose { tag }, loc)),
            _ => Err(LexError::new(
                self.location(),
                format!("'>' to close </{}>", tag),
            )),
        }
    }

    /// `<name attr=... >` or `<name attr=... />`
    fn lex_open_tag(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        self.advance();
        let tag = self.read_while(is_tag_char);
        let mut attributes = Attributes::new();

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => {
                    return Err(LexError::new(
                        self.location(),
                        format!("'>' to close <{}> opened at {}", tag, loc),
                    ))
                }
                Some('>') => {
                    self.advance();
                    return Ok(Token::new(TokenKind::TagOpen { tag, attributes }, loc));
                }
                Some('/') => {
                    self.advance();
                    if self.advance() != Some('>') {
                        return Err(LexError::new(self.location(), "'>' after '/'"));
                    }
                    return Ok(Token::new(TokenKind::SelfClose { tag, attributes }, loc));
                }
                Some(_) => {
                    let (name, value) = self.lex_attribute()?;
                    attributes.insert(name, value);
                }
            }
        }
    }

    fn lex_attribute(&mut self) -> Result<(String, AttributeValue), LexError> {
        let name = self.read_while(is_attribute_name_char);
        if name.is_empty() {
            return Err(LexError::new(self.location(), "attribute name"));
        }

        self.skip_whitespace();
        if self.peek() != Some('=') {
            return Ok((name, AttributeValue::Flag));
        }
        self.advance();
        self.skip_whitespace();

        let value_loc = self.location();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.advance();
                let value = self.read_while(|c| c != quote);
                if self.advance() != Some(quote) {
                    return Err(LexError::new(
                        self.location(),
                        format!("closing {} for attribute '{}'", quote, name),
                    ));
                }
                AttributeValue::Literal(value)
            }
            Some('{') => {
                self.advance();
                AttributeValue::Dynamic(self.read_braced(value_loc, "attribute expression")?)
            }
            _ => {
                let word = self.read_while(is_bare_word_char);
                if word.is_empty() {
                    return Err(LexError::new(
                        value_loc,
                        format!("value for attribute '{}'", name),
                    ));
                }
                AttributeValue::Literal(word)
            }
        };

        Ok((name, value))
    }

    /// Read up to the `}` matching an already-consumed `{`; the result is trimmed
    fn read_braced(&mut self, open: SourceLocation, what: &str) -> Result<String, LexError> {
        let mut depth = 1usize;
        let mut quote: Option<char> = None;
        let mut content = String::new();

        while let Some(c) = self.advance() {
            match quote {
                Some(q) => {
                    if c == q {
                        quote = None;
                    } else if c == '\\' {
                        content.push(c);
                        match self.advance() {
                            Some(escaped) => content.push(escaped),
                            None => break,
                        }
                        continue;
                    }
                }
                None => match c {
                    '"' | '\'' | '`' => quote = Some(c),
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            return Ok(content.trim().to_string());
                        }
                    }
                    _ => {}
                },
            }
            content.push(c);
        }

        Err(LexError::new(
            self.location(),
            format!("'}}' to close {} opened at {}", what, open),
        ))
    }

    /// Text up to the next tag or brace; `None` for whitespace-only runs
    fn lex_text(&mut self) -> Option<String> {
        let mut raw = String::new();

        while let Some(c) = self.peek() {
            let starts_markup = match c {
                '{' => true,
                '<' => self
                    .peek_at(1)
                    .is_some_and(|next| next == '/' || is_tag_start(next)),
                _ => false,
            };
            if starts_markup {
                break;
            }
            raw.push(c);
            self.advance();
        }

        normalize_text(&raw)
    }

    fn read_while(&mut self, predicate: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }
            out.push(c);
            self.advance();
        }
        out
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column, self.offset)
    }
}

/// Drop edge whitespace containing a newline, collapse other edge whitespace to one space
fn normalize_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let leading = &raw[..raw.len() - raw.trim_start().len()];
    let trailing = &raw[raw.trim_end().len()..];

    let mut text = String::with_capacity(trimmed.len() + 2);
    if !leading.is_empty() && !leading.contains('\n') {
        text.push(' ');
    }
    text.push_str(trimmed);
    if !trailing.is_empty() && !trailing.contains('\n') {
        text.push(' ');
    }
    Some(text)
}

fn is_tag_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn is_attribute_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-')
}

fn is_bare_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
