use base64::{engine::general_purpose::STANDARD, Engine};
use thiserror::Error;

use super::UnsignedTransaction;
use crate::{
    config::{PAYLOAD_SIZE_OFFSET, SIGNATURE_SIZE, TRANSACTION_HEADER_SIZE},
    error::ProtocolError,
    serializer::{Reader, ReaderError, Serializer, Writer},
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttachError {
    #[error("Signed buffer is {actual} bytes, expected {expected}")]
    WrongLength { expected: usize, actual: usize },

    #[error("Signed buffer does not match the transaction that was submitted for signing")]
    AlteredContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    unsigned: UnsignedTransaction,
    signature: [u8; SIGNATURE_SIZE],
}

impl SignedTransaction {
    pub fn new(unsigned: UnsignedTransaction, signature: [u8; SIGNATURE_SIZE]) -> Self {
        Self {
            unsigned,
            signature,
        }
    }

    pub fn transaction(&self) -> &UnsignedTransaction {
        &self.unsigned
    }

    pub fn signature(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.signature
    }

    // Encoding expected by the broadcast endpoint
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }
}

impl Serializer for SignedTransaction {
    fn write(&self, writer: &mut Writer) {
        self.unsigned.write(writer);
        writer.write_bytes(&self.signature);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let unsigned = UnsignedTransaction::read(reader)?;
        let signature = reader.read_bytes::<SIGNATURE_SIZE>()?;
        Ok(Self::new(unsigned, signature))
    }

    fn size(&self) -> usize {
        self.unsigned.size() + SIGNATURE_SIZE
    }
}

// Parse a transaction buffer, with or without its signature slot
// The signature is `None` when the slot is absent or all zero
pub fn inspect_transaction(
    bytes: &[u8],
) -> Result<(UnsignedTransaction, Option<[u8; SIGNATURE_SIZE]>), ProtocolError> {
    if bytes.len() < TRANSACTION_HEADER_SIZE {
        return Err(ProtocolError::TransactionTooShort {
            len: bytes.len(),
            min: TRANSACTION_HEADER_SIZE,
        });
    }

    let mut reader = Reader::new(bytes);
    let unsigned = UnsignedTransaction::read(&mut reader).map_err(|_| {
        ProtocolError::PayloadSizeMismatch {
            declared: declared_payload_size(bytes),
            actual: bytes.len() - TRANSACTION_HEADER_SIZE,
        }
    })?;

    let signature = match reader.size() {
        0 => None,
        SIGNATURE_SIZE => {
            let signature = reader
                .read_bytes::<SIGNATURE_SIZE>()
                .map_err(|_| ProtocolError::TransactionTooShort {
                    len: bytes.len(),
                    min: unsigned.buffer_size(),
                })?;
            signature.iter().any(|b| *b != 0).then_some(signature)
        }
        _ => {
            return Err(ProtocolError::PayloadSizeMismatch {
                declared: unsigned.payload().size(),
                actual: bytes.len() - TRANSACTION_HEADER_SIZE,
            })
        }
    };

    Ok((unsigned, signature))
}

// Caller guarantees a complete header
fn declared_payload_size(bytes: &[u8]) -> usize {
    u16::from_le_bytes([bytes[PAYLOAD_SIZE_OFFSET], bytes[PAYLOAD_SIZE_OFFSET + 1]]) as usize
}
