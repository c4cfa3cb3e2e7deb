use thiserror::Error;

// Rejected input, detected before any network call
// Every variant names the field at fault
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing value for field '{field}'")]
    MissingField { field: String },

    #[error("Invalid integer '{value}' for field '{field}'")]
    InvalidInteger { field: String, value: String },

    #[error("Value {value} for field '{field}' is out of range for {type_name}")]
    OutOfRange {
        field: String,
        value: String,
        type_name: &'static str,
    },

    #[error("Negative value {value} is not allowed for unsigned field '{field}'")]
    NegativeUnsigned { field: String, value: String },

    #[error("Invalid boolean '{value}' for field '{field}'")]
    InvalidBoolean { field: String, value: String },

    #[error("Malformed identity for field '{field}': {reason}")]
    MalformedIdentity { field: String, reason: String },

    #[error("Text for field '{field}' is {len} bytes, maximum is {max}")]
    TextTooLong { field: String, len: usize, max: usize },

    #[error("Array for field '{field}' has {len} elements, maximum is {max}")]
    ArrayTooLong { field: String, len: usize, max: usize },

    #[error("Array for field '{field}' has {len} elements, exactly {expected} are required")]
    ArrayLengthMismatch {
        field: String,
        len: usize,
        expected: usize,
    },

    #[error("Invalid value for field '{field}': expected {expected}")]
    UnexpectedShape {
        field: String,
        expected: &'static str,
    },

    #[error("Invalid JSON for field '{field}': {reason}")]
    InvalidJson { field: String, reason: String },

    #[error("Amount for field '{field}' must not be negative, got {amount}")]
    NegativeAmount { field: String, amount: i64 },

    #[error("Payload for field '{field}' is {size} bytes, maximum is {max}")]
    PayloadTooLarge {
        field: String,
        size: usize,
        max: usize,
    },

    #[error("Target tick {target} in field '{field}' is not after the observed tick {observed}")]
    StaleTick {
        field: String,
        target: u32,
        observed: u32,
    },

    #[error("Unknown {kind} '{name}' in field '{field}'")]
    UnknownEntry {
        field: String,
        kind: &'static str,
        name: String,
    },

    #[error("Unknown network '{value}' in field '{field}'")]
    UnknownNetwork { field: String, value: String },
}

impl ValidationError {
    // Field named by this error
    pub fn field(&self) -> &str {
        match self {
            Self::MissingField { field }
            | Self::InvalidInteger { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::NegativeUnsigned { field, .. }
            | Self::InvalidBoolean { field, .. }
            | Self::MalformedIdentity { field, .. }
            | Self::TextTooLong { field, .. }
            | Self::ArrayTooLong { field, .. }
            | Self::ArrayLengthMismatch { field, .. }
            | Self::UnexpectedShape { field, .. }
            | Self::InvalidJson { field, .. }
            | Self::NegativeAmount { field, .. }
            | Self::PayloadTooLarge { field, .. }
            | Self::StaleTick { field, .. }
            | Self::UnknownEntry { field, .. }
            | Self::UnknownNetwork { field, .. } => field,
        }
    }
}

// Received bytes or documents that do not match what the protocol expects
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Cannot decode field '{field}': needs {needed} bytes at offset {offset}, only {available} left (response is {total} bytes)")]
    CursorOverrun {
        field: String,
        needed: usize,
        available: usize,
        offset: usize,
        total: usize,
    },

    #[error("Invalid value for field '{field}' at offset {offset}")]
    InvalidFieldValue { field: String, offset: usize },

    #[error("Response is missing the expected field '{field}'")]
    MissingResponseField { field: &'static str },

    #[error("Field '{field}' is not valid base64: {reason}")]
    InvalidBase64 { field: &'static str, reason: String },

    #[error("Transaction buffer of {len} bytes is too short, at least {min} are required")]
    TransactionTooShort { len: usize, min: usize },

    #[error("Transaction declares a payload of {declared} bytes but the buffer carries {actual}")]
    PayloadSizeMismatch { declared: usize, actual: usize },
}

// Errors raised while loading a contract schema document
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Unknown type '{type_name}' for field '{field}'")]
    UnknownType { field: String, type_name: String },

    #[error("Unknown constant '{name}' used as size of field '{field}'")]
    UnknownConstant { field: String, name: String },

    #[error("Field '{field}' of type '{type_name}' requires a size")]
    MissingSize { field: String, type_name: String },

    #[error("Size of field '{field}' must be greater than zero")]
    ZeroSize { field: String },

    #[error("Field '{field}' does not fit in a payload of {max} bytes")]
    FieldTooLarge { field: String, max: usize },

    #[error("Array field '{field}' requires an element type")]
    MissingElementType { field: String },

    #[error("Duplicate {kind} '{name}'")]
    Duplicate { kind: &'static str, name: String },

    #[error("Invalid schema document: {0}")]
    InvalidDocument(String),
}
