//! Error types for parsing and editing recipes.

use thiserror::Error;

/// Structural failure while reading a recipe. Lines are 1-based.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: function {name}() is never closed")]
    UnclosedFunction { name: String, line: usize },

    #[error("line {line}: value of {name} is never closed")]
    UnclosedValue { name: String, line: usize },
}

impl ParseError {
    /// Line where the unterminated construct starts.
    pub fn line(&self) -> usize {
        match self {
            ParseError::UnclosedFunction { line, .. } | ParseError::UnclosedValue { line, .. } => *line,
        }
    }
}

/// Edit addressed an entry or value that does not exist.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EditError {
    #[error("no entry named {0}")]
    UnknownName(String),

    #[error("index {index} out of range (len {len})")]
    OutOfRange { index: usize, len: usize },
}
