use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fmt,
    path::Path,
    sync::Mutex,
};
use tickwire_common::{network::Network, time::TimestampSeconds};

use crate::error::StorageError;

// Tree holding the last claim timestamp of every (network, address) pair
const CLAIMS_TREE: &[u8] = b"claims";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CooldownKey {
    pub network: Network,
    pub address: String,
}

impl CooldownKey {
    pub fn new<S: Into<String>>(network: Network, address: S) -> Self {
        Self {
            network,
            address: address.into(),
        }
    }

    fn to_storage_key(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for CooldownKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.network, self.address)
    }
}

// Last claim time per key, with an atomic conditional write
pub trait CooldownStore: Send + Sync {
    fn get(&self, key: &CooldownKey) -> Result<Option<TimestampSeconds>, StorageError>;

    // Write `new` only if the stored value is still `expected`
    // Returns false when another writer got there first
    fn compare_and_set(
        &self,
        key: &CooldownKey,
        expected: Option<TimestampSeconds>,
        new: TimestampSeconds,
    ) -> Result<bool, StorageError>;
}

// Volatile store, for tests and client-side advisory checks
#[derive(Debug, Default)]
pub struct MemoryCooldownStore {
    claims: Mutex<HashMap<CooldownKey, TimestampSeconds>>,
}

impl MemoryCooldownStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn claims(&self) -> std::sync::MutexGuard<'_, HashMap<CooldownKey, TimestampSeconds>> {
        // The map stays consistent even if a holder panicked
        self.claims.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CooldownStore for MemoryCooldownStore {
    fn get(&self, key: &CooldownKey) -> Result<Option<TimestampSeconds>, StorageError> {
        Ok(self.claims().get(key).copied())
    }

    fn compare_and_set(
        &self,
        key: &CooldownKey,
        expected: Option<TimestampSeconds>,
        new: TimestampSeconds,
    ) -> Result<bool, StorageError> {
        let mut claims = self.claims();
        if claims.get(key).copied() != expected {
            return Ok(false);
        }
        claims.insert(key.clone(), new);
        Ok(true)
    }
}

// Durable store backed by a sled database
// Timestamps are stored as big endian u64
pub struct SledCooldownStore {
    db: sled::Db,
    claims: sled::Tree,
}

impl SledCooldownStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        if log::log_enabled!(log::Level::Debug) {
            debug!("opening cooldown ledger at {}", path.as_ref().display());
        }
        let db = sled::open(path)?;
        let claims = db.open_tree(CLAIMS_TREE)?;
        Ok(Self { db, claims })
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

fn decode_timestamp(key: &CooldownKey, bytes: &[u8]) -> Result<TimestampSeconds, StorageError> {
    let bytes: [u8; 8] = bytes.try_into().map_err(|_| StorageError::Corrupted {
        key: key.to_string(),
        reason: format!("expected 8 bytes, found {}", bytes.len()),
    })?;
    Ok(u64::from_be_bytes(bytes))
}

impl CooldownStore for SledCooldownStore {
    fn get(&self, key: &CooldownKey) -> Result<Option<TimestampSeconds>, StorageError> {
        self.claims
            .get(key.to_storage_key())?
            .map(|value| decode_timestamp(key, &value))
            .transpose()
    }

    fn compare_and_set(
        &self,
        key: &CooldownKey,
        expected: Option<TimestampSeconds>,
        new: TimestampSeconds,
    ) -> Result<bool, StorageError> {
        let result = self.claims.compare_and_swap(
            key.to_storage_key(),
            expected.map(u64::to_be_bytes),
            Some(new.to_be_bytes().to_vec()),
        )?;

        match result {
            Ok(()) => {
                // A recorded claim must survive a restart
                self.claims.flush()?;
                if log::log_enabled!(log::Level::Trace) {
                    trace!("recorded claim {} at {}", key, new);
                }
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> CooldownKey {
        CooldownKey::new(Network::Testnet, "ADDR")
    }

    #[test]
    fn test_key_display() {
        assert_eq!(key().to_string(), "testnet:ADDR");
    }

    #[test]
    fn test_memory_compare_and_set() {
        let store = MemoryCooldownStore::new();
        assert_eq!(store.get(&key()).unwrap(), None);
        assert!(store.compare_and_set(&key(), None, 100).unwrap());
        assert!(!store.compare_and_set(&key(), None, 200).unwrap());
        assert!(store.compare_and_set(&key(), Some(100), 200).unwrap());
        assert_eq!(store.get(&key()).unwrap(), Some(200));
    }

    #[test]
    fn test_sled_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SledCooldownStore::open(dir.path()).unwrap();
            assert!(store.is_empty());
            assert!(store.compare_and_set(&key(), None, 1_700_000_000).unwrap());
            assert!(!store.compare_and_set(&key(), Some(1), 5).unwrap());
            store.flush().unwrap();
        }

        let store = SledCooldownStore::open(dir.path()).unwrap();
        assert_eq!(store.get(&key()).unwrap(), Some(1_700_000_000));
        assert_eq!(store.len(), 1);
    }
}
