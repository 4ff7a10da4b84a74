//! Diagnostic taxonomy for every phase of the pipeline.
//!
//! Each variant carries the source position it was raised at so the CLI can
//! print `file:line:column: message` without threading position information
//! back out of the phase that detected the problem.

use std::fmt;

/// A 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{pos}: lexical error: {message}")]
    Lexical { pos: Position, message: String },

    #[error("{pos}: syntax error: {message}")]
    Syntax { pos: Position, message: String },

    #[error("{pos}: semantic error: {message}")]
    Semantic { pos: Position, message: String },

    #[error("program exceeds tape capacity: {message}")]
    Capacity { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl Error {
    pub fn lexical(pos: Position, message: impl Into<String>) -> Self {
        Self::Lexical {
            pos,
            message: message.into(),
        }
    }

    pub fn syntax(pos: Position, message: impl Into<String>) -> Self {
        Self::Syntax {
            pos,
            message: message.into(),
        }
    }

    pub fn semantic(pos: Position, message: impl Into<String>) -> Self {
        Self::Semantic {
            pos,
            message: message.into(),
        }
    }

    pub fn capacity(message: impl Into<String>) -> Self {
        Self::Capacity {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Exit code this error maps to under the CLI contract (section 6): `2`
    /// for anything caught during compilation, `3` for a compiler bug.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Internal { .. } => 3,
            _ => 2,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
