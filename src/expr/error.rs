use thiserror::Error;

/// Failure turning expression text into an executable predicate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("Unexpected character {ch:?} at offset {pos}")]
    Lex { pos: usize, ch: char },

    #[error("Unterminated string starting at offset {pos}")]
    UnterminatedString { pos: usize },

    #[error("Syntax error at offset {pos}: {message}")]
    Syntax { pos: usize, message: String },

    #[error("Unknown name: {0}")]
    UnknownName(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Unsupported attribute: .{0}")]
    UnsupportedAttribute(String),

    #[error("{function} expects {expected} argument(s), got {got}")]
    Arity {
        function: String,
        expected: &'static str,
        got: usize,
    },

    #[error("Expression nests deeper than {limit} levels at offset {pos}")]
    TooDeep { pos: usize, limit: usize },
}

/// Runtime failure of an otherwise valid expression against one context.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EvalError {
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Division by zero")]
    ZeroDivision,

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("Integer overflow")]
    Overflow,

    #[error("Value of type {0} is not iterable")]
    NotIterable(&'static str),

    #[error("{0}() of an empty sequence")]
    EmptySequence(&'static str),

    #[error("Invalid literal for int(): {0:?}")]
    InvalidInt(String),
}
