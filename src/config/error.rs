//! Config parse errors

use thiserror::Error;

/// A grammar violation, tagged with the 1-based line it was detected on
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub line: u32,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(line: u32, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },

    #[error("unexpected end of file")]
    UnexpectedEof,

    #[error("{what} is longer than {max} bytes")]
    TokenTooLong { what: &'static str, max: usize },

    #[error("key combination has more than {0} parts")]
    TooManyComboParts(usize),

    #[error("unknown modifier '{0}'")]
    UnknownModifier(String),

    #[error("empty flag after '--'")]
    EmptyFlag,

    #[error("hotkey has no commands")]
    EmptyCommandBlock,
}
