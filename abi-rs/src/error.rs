use thiserror::Error;

/// Failure while turning values into ABI words.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("value {value} overflows {ty}")]
    Overflow { ty: String, value: String },

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("expected a {ty} value, got {value}")]
    TypeMismatch { ty: String, value: String },

    #[error("{ty} expects {expected} elements, got {got}")]
    LengthMismatch {
        ty: String,
        expected: usize,
        got: usize,
    },

    #[error("expected {expected} arguments, got {got}")]
    ArgumentCount { expected: usize, got: usize },
}

/// Failure while reading call data or return data.
///
/// Parameter-level variants carry the parameter path (`amount`, `param2`,
/// `recipients[1]`) and the absolute byte offset into the decoded buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodingError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("data truncated at `{param}` (offset {offset}): need {needed} bytes, have {available}")]
    Truncated {
        param: String,
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("offset {target} for `{param}` (read at byte {offset}) points outside {len}-byte buffer")]
    InvalidOffset {
        param: String,
        offset: usize,
        target: String,
        len: usize,
    },

    #[error("invalid {ty} word for `{param}` at offset {offset}")]
    InvalidValue {
        param: String,
        offset: usize,
        ty: String,
    },

    #[error("selector mismatch: expected {expected}, got {got}")]
    SelectorMismatch { expected: String, got: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("unsupported ABI type `{0}`")]
    UnsupportedType(String),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Decoding(#[from] DecodingError),

    #[error("unknown function: no ABI entry matches {0}")]
    FunctionNotFound(String),

    #[error("invalid ABI JSON: {0}")]
    InvalidAbi(String),
}
