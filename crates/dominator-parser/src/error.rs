//! Parser error types

use dominator_core::SourceLocation;
use thiserror::Error;

/// Tokenizer error: input ended (or a character was found) where something else was expected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Lex error at {position}: expected {expected}")]
pub struct LexError {
    pub position: SourceLocation,
    pub expected: String,
}

impl LexError {
    pub fn new(position: SourceLocation, expected: impl Into<String>) -> Self {
        Self {
            position,
            expected: expected.into(),
        }
    }
}

/// Parser error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Tokenizer failure
    #[error(transparent)]
    Lex(#[from] LexError),

    /// Close tag does not match the open element
    #[error("Mismatched close tag at {loc}: expected </{expected}>, found </{found}>")]
    MismatchedCloseTag {
        expected: String,
        found: String,
        loc: SourceLocation,
    },

    /// Element still open at end of input
    #[error("Unclosed element <{tag}> opened at {loc}")]
    UnclosedElement { tag: String, loc: SourceLocation },

    /// Close tag with no open element
    #[error("Unexpected close tag </{found}> at {loc}")]
    UnexpectedCloseTag { found: String, loc: SourceLocation },

    /// Block header other than `each` / `if`
    #[error("Unsupported block '{{#{header}}}' at {loc}")]
    UnsupportedBlock { header: String, loc: SourceLocation },

    /// Block header missing a required part
    #[error("Malformed block '{{#{header}}}' at {loc}: expected {expected}")]
    MalformedBlock {
        header: String,
        expected: String,
        loc: SourceLocation,
    },

    /// Block still open at end of input
    #[error("Unclosed block '{{#{kind}}}' opened at {loc}")]
    UnclosedBlock { kind: String, loc: SourceLocation },

    /// `{/x}` closing a different block kind
    #[error("Mismatched block close at {loc}: expected {{/{expected}}}, found {{/{found}}}")]
    MismatchedBlockClose {
        expected: String,
        found: String,
        loc: SourceLocation,
    },

    /// Token that cannot appear at this position
    #[error("Unexpected {found} at {loc}")]
    UnexpectedToken { found: String, loc: SourceLocation },
}

impl ParseError {
    /// Source location the error points at
    pub fn location(&self) -> SourceLocation {
        match self {
            ParseError::Lex(err) => err.position,
            ParseError::MismatchedCloseTag { loc, .. }
            | ParseError::UnclosedElement { loc, .. }
            | ParseError::UnexpectedCloseTag { loc, .. }
            | ParseError::UnsupportedBlock { loc, .. }
            | ParseError::MalformedBlock { loc, .. }
            | ParseError::UnclosedBlock { loc, .. }
            | ParseError::MismatchedBlockClose { loc, .. }
            | ParseError::UnexpectedToken { loc, .. } => *loc,
        }
    }
}

/// Result type for parser operations
pub type Result<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_error_display() {
        let err = LexError::new(SourceLocation::new(2, 5, 12), "closing '\"'");
        assert_eq!(err.to_string(), "Lex error at 2:5: expected closing '\"'");
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::MismatchedCloseTag {
            expected: "div".to_string(),
            found: "span".to_string(),
            loc: SourceLocation::new(1, 12, 11),
        };
        assert_eq!(
            err.to_string(),
            "Mismatched close tag at 1:12: expected </div>, found </span>"
        );
        assert_eq!(err.location(), SourceLocation::new(1, 12, 11));

        let err = ParseError::UnsupportedBlock {
            header: "await promise".to_string(),
            loc: SourceLocation::start(),
        };
        assert_eq!(err.to_string(), "Unsupported block '{#await promise}' at 1:1");
    }

    #[test]
    fn test_lex_error_conversion() {
        let lex = LexError::new(SourceLocation::start(), "'>'");
        let err: ParseError = lex.clone().into();
        assert_eq!(err, ParseError::Lex(lex));
        assert_eq!(err.location(), SourceLocation::start());
    }
}
