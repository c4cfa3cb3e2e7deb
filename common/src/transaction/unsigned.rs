use log::debug;

use super::{AttachError, SignedTransaction};
use crate::{
    codec::Payload,
    config::{MAX_PAYLOAD_SIZE, PUBLIC_KEY_SIZE, SIGNATURE_SIZE, TRANSACTION_HEADER_SIZE},
    crypto::PublicKey,
    error::ValidationError,
    serializer::{Reader, ReaderError, Serializer, Writer},
    tick::TickWindow,
};

// Transaction ready to be signed
// Only built through `build_invocation`/`build_transfer` or read back from bytes,
// so `payload` always fits in the 16-bit size field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    source: PublicKey,
    destination: PublicKey,
    amount: i64,
    tick: u32,
    selector: u16,
    payload: Payload,
}

// Amounts are signed on the wire but a transaction never carries a negative one
pub fn validate_amount(amount: i64) -> Result<(), ValidationError> {
    if amount < 0 {
        return Err(ValidationError::NegativeAmount {
            field: "amount".to_owned(),
            amount,
        });
    }
    Ok(())
}

// Build a contract invocation
// The destination is the contract pseudo key: selector in byte 0, 31 zero bytes
pub fn build_invocation(
    source: PublicKey,
    contract: u8,
    selector: u16,
    amount: i64,
    window: &TickWindow,
    payload: Payload,
) -> Result<UnsignedTransaction, ValidationError> {
    validate_amount(amount)?;
    window.validate()?;
    if payload.size() > MAX_PAYLOAD_SIZE {
        return Err(ValidationError::PayloadTooLarge {
            field: "payload".to_owned(),
            size: payload.size(),
            max: MAX_PAYLOAD_SIZE,
        });
    }

    let tx = UnsignedTransaction {
        source,
        destination: PublicKey::contract(contract),
        amount,
        tick: window.target_tick,
        selector,
        payload,
    };
    if log::log_enabled!(log::Level::Debug) {
        debug!(
            "built invocation of contract {} selector {} at tick {} ({} payload bytes, {} total)",
            contract,
            selector,
            tx.tick,
            tx.payload.size(),
            tx.buffer_size()
        );
    }
    Ok(tx)
}

// Build a plain value transfer: no selector, no payload
pub fn build_transfer(
    source: PublicKey,
    destination: PublicKey,
    amount: i64,
    window: &TickWindow,
) -> Result<UnsignedTransaction, ValidationError> {
    validate_amount(amount)?;
    window.validate()?;

    let tx = UnsignedTransaction {
        source,
        destination,
        amount,
        tick: window.target_tick,
        selector: 0,
        payload: Payload::empty(),
    };
    if log::log_enabled!(log::Level::Debug) {
        debug!(
            "built transfer of {} to {} at tick {}",
            amount, destination, tx.tick
        );
    }
    Ok(tx)
}

impl UnsignedTransaction {
    pub fn source(&self) -> &PublicKey {
        &self.source
    }

    pub fn destination(&self) -> &PublicKey {
        &self.destination
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn selector(&self) -> u16 {
        self.selector
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn payload_size(&self) -> u16 {
        self.payload.size() as u16
    }

    // Contract index if the destination is a contract pseudo key
    pub fn contract_index(&self) -> Option<u8> {
        let bytes = self.destination.as_bytes();
        bytes[1..].iter().all(|b| *b == 0).then_some(bytes[0])
    }

    // Header and payload: the bytes covered by the signature
    pub fn signing_bytes(&self) -> Vec<u8> {
        self.to_bytes()
    }

    // Header + payload + signature slot
    pub fn buffer_size(&self) -> usize {
        TRANSACTION_HEADER_SIZE + self.payload.size() + SIGNATURE_SIZE
    }

    // Complete buffer handed to a signer, with a zeroed signature slot
    pub fn to_unsigned_buffer(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.buffer_size());
        let mut writer = Writer::new(&mut buffer);
        self.write(&mut writer);
        writer.write_zeroes(SIGNATURE_SIZE);
        buffer
    }

    pub fn with_signature(self, signature: [u8; SIGNATURE_SIZE]) -> SignedTransaction {
        SignedTransaction::new(self, signature)
    }

    // Accept a buffer returned by a signer
    // It must have the expected length and leave the signed-over bytes untouched
    pub fn attach_signed_buffer(self, signed: &[u8]) -> Result<SignedTransaction, AttachError> {
        let expected = self.buffer_size();
        if signed.len() != expected {
            return Err(AttachError::WrongLength {
                expected,
                actual: signed.len(),
            });
        }

        let boundary = expected - SIGNATURE_SIZE;
        if signed[..boundary] != self.signing_bytes()[..] {
            return Err(AttachError::AlteredContent);
        }

        let mut signature = [0u8; SIGNATURE_SIZE];
        signature.copy_from_slice(&signed[boundary..]);
        Ok(self.with_signature(signature))
    }
}

impl Serializer for UnsignedTransaction {
    fn write(&self, writer: &mut Writer) {
        self.source.write(writer);
        self.destination.write(writer);
        writer.write_i64(self.amount);
        writer.write_u32(self.tick);
        writer.write_u16(self.selector);
        writer.write_u16(self.payload_size());
        writer.write_bytes(self.payload.as_bytes());
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let source = PublicKey::read(reader)?;
        let destination = PublicKey::read(reader)?;
        let amount = reader.read_i64()?;
        let tick = reader.read_u32()?;
        let selector = reader.read_u16()?;
        let payload_size = reader.read_u16()? as usize;
        let payload = Payload::new(reader.read_bytes_ref(payload_size)?.to_vec());

        Ok(Self {
            source,
            destination,
            amount,
            tick,
            selector,
            payload,
        })
    }

    fn size(&self) -> usize {
        PUBLIC_KEY_SIZE * 2 + 8 + 4 + 2 + 2 + self.payload.size()
    }
}
