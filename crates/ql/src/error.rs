use thiserror::Error;

/// Errors produced while lexing or parsing a query string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QlError {
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),

    #[error("unterminated string literal starting at position {0}")]
    UnterminatedString(usize),

    #[error("unexpected end of query, expected {0}")]
    UnexpectedEof(&'static str),

    #[error("unexpected token '{0}', expected {1}")]
    UnexpectedToken(String, &'static str),

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("trailing input after expression: '{0}'")]
    TrailingInput(String),
}
