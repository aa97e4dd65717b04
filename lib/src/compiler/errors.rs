use std::io;

use thiserror::Error;

/// Errors returned while serializing/deserializing compiled lexers.
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("not a lexgen compiled lexer file")]
    InvalidFormat,

    #[error("invalid lexgen compiled lexer file")]
    InvalidEncoding(#[from] bincode::Error),

    #[error(transparent)]
    IoError(#[from] io::Error),
}

/// Errors returned while compiling lexical rules or lexing text.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The regular expression couldn't be parsed completely. `offset` is the
    /// position, in characters, where parsing stopped.
    #[error("syntax error in regexp `{pattern}` at offset {offset}")]
    SyntaxError { pattern: String, offset: usize },

    /// A hex escape contains something that is not a hex digit.
    #[error("invalid hex digit `{digit}` in escape sequence")]
    InvalidHexDigit { digit: char },

    /// A hex escape or a shifted character evaluates to a value that is not
    /// a valid Unicode scalar value.
    #[error("invalid code point: {value}")]
    InvalidCodePoint { value: i64 },

    /// The lexer was asked to use a lexer state that has no rules.
    #[error("unknown lexer state: {state}")]
    UnknownLexerState { state: String },
}
