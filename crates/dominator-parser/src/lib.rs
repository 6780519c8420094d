//! Dominator Parser - template source to AST
//!
//! This crate tokenizes template markup and parses the token stream into a
//! Dominator AST (Abstract Syntax Tree) by recursive descent.

pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

// Re-export main parser types
pub use error::{LexError, ParseError, Result};
pub use lexer::Tokenizer;
pub use parser::{parse, ParseMode, ParserOptions, TemplateParser};
pub use token::{Token, TokenKind};
