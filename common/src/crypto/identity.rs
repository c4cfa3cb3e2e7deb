use tiny_keccak::{Hasher, KangarooTwelve};

use super::{IdentityError, PublicKey};
use crate::config::{
    IDENTITY_BODY_LENGTH, IDENTITY_CHECKSUM_LENGTH, IDENTITY_LENGTH, IDENTITY_LETTERS_PER_LIMB,
    PUBLIC_KEY_SIZE,
};

const ALPHABET_SIZE: u64 = 26;
// Checksum keeps the low 18 bits of the first three K12 output bytes
const CHECKSUM_MASK: u32 = 0x3FFFF;

// Conversion between 60-letter identities and 32-byte public keys
pub trait IdentityCodec: Send + Sync {
    fn decode_identity(&self, identity: &str) -> Result<PublicKey, IdentityError>;

    fn encode_identity(&self, key: &PublicKey) -> String;
}

// Standard identity format
//
// Body: the key is split in four little-endian 64-bit limbs, each written as
// 14 base-26 letters, least significant letter first.
// Checksum: 4 base-26 letters of the K12 based checksum of the key.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardIdentityCodec;

impl StandardIdentityCodec {
    pub fn new() -> Self {
        Self
    }
}

fn checksum(key: &PublicKey) -> u32 {
    let mut hasher = KangarooTwelve::new(b"");
    hasher.update(key.as_bytes());
    let mut output = [0u8; 3];
    hasher.finalize(&mut output);
    u32::from_le_bytes([output[0], output[1], output[2], 0]) & CHECKSUM_MASK
}

fn push_letters(out: &mut String, mut value: u64, count: usize) {
    for _ in 0..count {
        out.push((b'A' + (value % ALPHABET_SIZE) as u8) as char);
        value /= ALPHABET_SIZE;
    }
}

// Read `letters` as little-endian base-26 digits
fn read_letters(letters: &[u8]) -> Option<u64> {
    letters.iter().rev().try_fold(0u64, |acc, letter| {
        acc.checked_mul(ALPHABET_SIZE)?
            .checked_add((letter - b'A') as u64)
    })
}

impl IdentityCodec for StandardIdentityCodec {
    fn decode_identity(&self, identity: &str) -> Result<PublicKey, IdentityError> {
        // Count chars, not bytes, so a multi-byte character is reported properly
        let len = identity.chars().count();
        if len != IDENTITY_LENGTH {
            return Err(IdentityError::InvalidLength {
                len,
                expected: IDENTITY_LENGTH,
            });
        }

        if let Some((position, character)) = identity
            .chars()
            .enumerate()
            .find(|(_, c)| !c.is_ascii_uppercase())
        {
            return Err(IdentityError::InvalidCharacter {
                position,
                character,
            });
        }

        let letters = identity.as_bytes();
        let mut bytes = [0u8; PUBLIC_KEY_SIZE];
        for (group, chunk) in letters[..IDENTITY_BODY_LENGTH]
            .chunks(IDENTITY_LETTERS_PER_LIMB)
            .enumerate()
        {
            let limb = read_letters(chunk).ok_or(IdentityError::LimbOverflow { group })?;
            bytes[group * 8..group * 8 + 8].copy_from_slice(&limb.to_le_bytes());
        }

        let key = PublicKey::new(bytes);
        let expected = read_letters(&letters[IDENTITY_BODY_LENGTH..])
            .ok_or(IdentityError::InvalidChecksum)?;
        if expected != checksum(&key) as u64 {
            return Err(IdentityError::InvalidChecksum);
        }

        Ok(key)
    }

    fn encode_identity(&self, key: &PublicKey) -> String {
        let mut out = String::with_capacity(IDENTITY_LENGTH);
        for limb in key.as_bytes().chunks(8) {
            let mut limb_bytes = [0u8; 8];
            limb_bytes.copy_from_slice(limb);
            push_letters(
                &mut out,
                u64::from_le_bytes(limb_bytes),
                IDENTITY_LETTERS_PER_LIMB,
            );
        }
        push_letters(&mut out, checksum(key) as u64, IDENTITY_CHECKSUM_LENGTH);
        out
    }
}
