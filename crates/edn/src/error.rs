//! Reader error model.

use thiserror::Error;

/// 1-based location in the source text.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn start() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("input contains no form")]
    EmptyInput,

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("unmatched delimiter '{0}'")]
    UnmatchedDelimiter(char),

    #[error("unexpected input after the first form")]
    TrailingInput,

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("invalid symbol '{0}'")]
    InvalidSymbol(String),

    #[error("invalid keyword '{0}'")]
    InvalidKeyword(String),

    #[error("invalid character literal '\\{0}'")]
    InvalidCharacter(String),

    #[error("invalid string escape '\\{0}'")]
    InvalidEscape(String),

    #[error("invalid tag '{0}'")]
    InvalidTag(String),

    #[error("invalid value for #{tag}: {reason}")]
    InvalidTaggedValue { tag: String, reason: String },

    #[error("map literal must contain an even number of forms")]
    OddMapEntries,

    #[error("duplicate map key {0}")]
    DuplicateKey(String),

    #[error("duplicate set element {0}")]
    DuplicateSetElement(String),

    #[error("#_ must be followed by a form")]
    DiscardWithoutForm,

    #[error("nesting deeper than {0} levels")]
    DepthLimitExceeded(usize),
}

/// A reader failure and where it happened.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} at {position}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub position: Position,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, position: Position) -> Self {
        Self { kind, position }
    }

    pub fn line(&self) -> usize {
        self.position.line
    }

    pub fn column(&self) -> usize {
        self.position.column
    }
}
