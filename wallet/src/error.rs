use std::time::Duration;
use thiserror::Error;
use tickwire_common::{
    error::{ProtocolError, SchemaError, ValidationError},
    time::format_duration,
    transaction::AttachError,
};

// Failures talking to a remote HTTP service
// Each variant keeps the endpoint so the message says where it happened
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Invalid endpoint URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Request to {endpoint} timed out after {timeout:?}")]
    Timeout { endpoint: String, timeout: Duration },

    #[error("Cannot reach {endpoint}: {reason}")]
    Unreachable { endpoint: String, reason: String },

    #[error("{endpoint} answered with HTTP status {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Malformed JSON from {endpoint}: {reason}")]
    MalformedJson { endpoint: String, reason: String },

    #[error("Response from {endpoint} is missing the field '{field}'")]
    MissingField {
        endpoint: String,
        field: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("Signer failed: {0}")]
    Capability(String),

    #[error("Signing service unavailable: {0}")]
    Transport(#[source] NetworkError),

    #[error("Invalid signer response: {0}")]
    InvalidResponse(String),

    #[error("Signer returned {actual} bytes, expected {expected}")]
    WrongLength { expected: usize, actual: usize },

    #[error("Signer altered the signed-over transaction bytes")]
    AlteredContent,
}

impl From<AttachError> for SigningError {
    fn from(err: AttachError) -> Self {
        match err {
            AttachError::WrongLength { expected, actual } => Self::WrongLength { expected, actual },
            AttachError::AlteredContent => Self::AlteredContent,
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Sled(#[from] sled::Error),

    #[error("Corrupted record for key '{key}': {reason}")]
    Corrupted { key: String, reason: String },
}

// Broad class of an error, used to choose a status code or exit path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Network,
    Signing,
    Protocol,
    Schema,
    Storage,
    RateLimited,
    Busy,
    Rejected,
    Internal,
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Claim rate limited, next claim allowed in {}", format_duration(*.remaining))]
    RateLimited { remaining: Duration },

    #[error("A claim for {key} is already in progress")]
    ClaimInProgress { key: String },

    #[error("Another confirmation is already in progress")]
    PipelineBusy,

    #[error("Transaction was rejected")]
    Rejected,

    #[error("Confirmation task ended unexpectedly: {0}")]
    TaskFailed(String),
}

impl WalletError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Network(_) => ErrorKind::Network,
            Self::Signing(_) => ErrorKind::Signing,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::Schema(_) => ErrorKind::Schema,
            Self::Storage(_) => ErrorKind::Storage,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::ClaimInProgress { .. } | Self::PipelineBusy => ErrorKind::Busy,
            Self::Rejected => ErrorKind::Rejected,
            Self::TaskFailed(_) => ErrorKind::Internal,
        }
    }

    // Seconds to wait before retrying, for rate limited claims
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { remaining } => Some(*remaining),
            _ => None,
        }
    }
}
