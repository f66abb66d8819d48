use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UserOpError {
    #[error("missing field {0}")]
    MissingField(&'static str),

    #[error("invalid hex in {field}: {reason}")]
    InvalidHex { field: String, reason: String },

    #[error("invalid {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("{field} value {value} exceeds {bits} bits")]
    Overflow {
        field: String,
        value: String,
        bits: usize,
    },

    #[error("invalid packed {field}: {reason}")]
    InvalidPackedField { field: &'static str, reason: String },

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),
}
