use serde::{de::Error as SerdeError, Deserialize, Deserializer, Serialize, Serializer as SerdeSerializer};
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use super::IdentityError;
use crate::{
    config::PUBLIC_KEY_SIZE,
    serializer::{Reader, ReaderError, Serializer, Writer},
};

// 32-byte public key as used in transaction headers
#[derive(Eq, PartialEq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    pub const fn new(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        PublicKey(bytes)
    }

    pub const fn zero() -> Self {
        PublicKey::new([0; PUBLIC_KEY_SIZE])
    }

    // Pseudo key addressing a contract: index in byte 0, 31 zero bytes after it
    pub const fn contract(index: u8) -> Self {
        let mut bytes = [0; PUBLIC_KEY_SIZE];
        bytes[0] = index;
        PublicKey(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    pub fn to_bytes(self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for PublicKey {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| IdentityError::InvalidHex(e.to_string()))?;
        let bytes: [u8; PUBLIC_KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| IdentityError::InvalidHex("expected 32 bytes".to_owned()))?;
        Ok(PublicKey::new(bytes))
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serializer for PublicKey {
    fn write(&self, writer: &mut Writer) {
        writer.write_bytes(&self.0);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(PublicKey(reader.read_bytes_32()?))
    }

    fn size(&self) -> usize {
        PUBLIC_KEY_SIZE
    }
}

impl Serialize for PublicKey {
    fn serialize<S: SerdeSerializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'a> Deserialize<'a> for PublicKey {
    fn deserialize<D: Deserializer<'a>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        PublicKey::from_str(&hex).map_err(SerdeError::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_key_layout() {
        for index in 0..=u8::MAX {
            let key = PublicKey::contract(index);
            let bytes = key.as_bytes();
            assert_eq!(bytes[0], index);
            assert!(bytes[1..].iter().all(|b| *b == 0));
            assert_eq!(bytes[1..].len(), 31);
        }
    }

    #[test]
    fn test_hex_roundtrip() {
        let key = PublicKey::new([0xAB; 32]);
        let parsed: PublicKey = key.to_hex().parse().unwrap();
        assert_eq!(parsed, key);
        assert!("abcd".parse::<PublicKey>().is_err());
    }
}
