use thiserror::Error;

/// Errors that can occur while converting textual identities
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Identity does not have the expected number of characters
    #[error("identity must be {expected} characters long, got {len}")]
    InvalidLength { len: usize, expected: usize },

    /// Identity contains a character outside of A-Z
    #[error("invalid character '{character}' at position {position}, only A-Z are allowed")]
    InvalidCharacter { position: usize, character: char },

    /// A 14-letter group encodes a value larger than 64 bits
    #[error("letter group {group} does not fit in 64 bits")]
    LimbOverflow { group: usize },

    /// Checksum letters do not match the decoded public key
    #[error("invalid checksum")]
    InvalidChecksum,

    /// Hex encoded key is malformed
    #[error("invalid public key hex: {0}")]
    InvalidHex(String),
}
