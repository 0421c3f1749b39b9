//! Lexer error types

use thiserror::Error;

/// Errors raised for malformed template source
///
/// Positions are 1-based and point at the start of the offending construct.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("Unterminated string starting at {line}:{column}")]
    UnterminatedString { line: usize, column: usize },

    #[error("Unterminated comment starting at {line}:{column}")]
    UnterminatedComment { line: usize, column: usize },

    #[error("Unterminated tag starting at {line}:{column}")]
    UnterminatedTag { line: usize, column: usize },

    #[error("Unterminated regex starting at {line}:{column}")]
    UnterminatedRegex { line: usize, column: usize },

    #[error("Unexpected character {ch:?} at {line}:{column}")]
    UnexpectedCharacter { ch: char, line: usize, column: usize },
}

impl LexError {
    /// Line and column where the error starts
    pub fn position(&self) -> (usize, usize) {
        match self {
            LexError::UnterminatedString { line, column }
            | LexError::UnterminatedComment { line, column }
            | LexError::UnterminatedTag { line, column }
            | LexError::UnterminatedRegex { line, column }
            | LexError::UnexpectedCharacter { line, column, .. } => (*line, *column),
        }
    }
}

pub type LexResult<T> = Result<T, LexError>;
