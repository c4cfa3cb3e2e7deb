pub mod faucet;
pub mod node;

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::ProtocolError;

// Decode a base64 field received from a remote service
pub fn decode_base64_field(field: &'static str, value: &str) -> Result<Vec<u8>, ProtocolError> {
    STANDARD
        .decode(value.trim())
        .map_err(|e| ProtocolError::InvalidBase64 {
            field,
            reason: e.to_string(),
        })
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
