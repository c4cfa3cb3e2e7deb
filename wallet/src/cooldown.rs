use log::warn;
use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tickwire_common::{
    network::Network,
    time::{get_current_time_in_seconds, TimestampSeconds},
};

use crate::{
    error::{StorageError, WalletError},
    storage::{CooldownKey, CooldownStore},
};

// Enforces the minimum interval between two claims of the same (network, address)
pub struct CooldownLedger {
    store: Arc<dyn CooldownStore>,
    cooldown: Duration,
    // Keys with a claim between its check and its record
    in_flight: Mutex<HashSet<CooldownKey>>,
}

impl CooldownLedger {
    pub fn new(store: Arc<dyn CooldownStore>, cooldown: Duration) -> Self {
        Self {
            store,
            cooldown,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    fn in_flight(&self) -> MutexGuard<'_, HashSet<CooldownKey>> {
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }

    // Time left before `last` allows a new claim at `now`
    // A clock behind the last claim counts as no time elapsed
    fn remaining_since(&self, last: TimestampSeconds, now: TimestampSeconds) -> Option<Duration> {
        let elapsed = now.saturating_sub(last);
        let cooldown = self.cooldown.as_secs();
        (elapsed < cooldown).then(|| Duration::from_secs(cooldown - elapsed))
    }

    // None when a claim is allowed at `now`
    pub fn remaining_at(
        &self,
        key: &CooldownKey,
        now: TimestampSeconds,
    ) -> Result<Option<Duration>, StorageError> {
        Ok(self
            .store
            .get(key)?
            .and_then(|last| self.remaining_since(last, now)))
    }

    pub fn can_claim_at(
        &self,
        network: Network,
        address: &str,
        now: TimestampSeconds,
    ) -> Result<bool, StorageError> {
        let key = CooldownKey::new(network, address);
        Ok(self.remaining_at(&key, now)?.is_none())
    }

    pub fn can_claim(&self, network: Network, address: &str) -> Result<bool, StorageError> {
        self.can_claim_at(network, address, get_current_time_in_seconds())
    }

    // Check the cooldown and reserve the key until the permit is committed or dropped
    pub fn begin_claim(
        &self,
        key: CooldownKey,
        now: TimestampSeconds,
    ) -> Result<ClaimPermit<'_>, WalletError> {
        if !self.in_flight().insert(key.clone()) {
            if log::log_enabled!(log::Level::Warn) {
                warn!("claim for {} rejected, another one is in progress", key);
            }
            return Err(WalletError::ClaimInProgress {
                key: key.to_string(),
            });
        }

        // The store is only read once the key is reserved, so no other claim
        // for it can commit in between. Returning early drops the permit.
        let mut permit = ClaimPermit {
            ledger: self,
            key,
            previous: None,
        };
        permit.previous = self.store.get(&permit.key)?;
        if let Some(remaining) = permit
            .previous
            .and_then(|last| self.remaining_since(last, now))
        {
            if log::log_enabled!(log::Level::Warn) {
                warn!("claim for {} rejected, {}s left", permit.key, remaining.as_secs());
            }
            return Err(WalletError::RateLimited { remaining });
        }

        Ok(permit)
    }

    // Record a claim made outside of a permit
    pub fn record_claim(
        &self,
        network: Network,
        address: &str,
        now: TimestampSeconds,
    ) -> Result<(), WalletError> {
        self.begin_claim(CooldownKey::new(network, address), now)?
            .commit(now)
    }

    // Write the claim if nobody else recorded one since the permit was taken
    fn commit_claim(
        &self,
        key: &CooldownKey,
        previous: Option<TimestampSeconds>,
        now: TimestampSeconds,
    ) -> Result<(), WalletError> {
        if self.store.compare_and_set(key, previous, now)? {
            return Ok(());
        }

        let remaining = self.remaining_at(key, now)?.unwrap_or(self.cooldown);
        if log::log_enabled!(log::Level::Warn) {
            warn!("claim for {} was recorded concurrently elsewhere", key);
        }
        Err(WalletError::RateLimited { remaining })
    }
}

// Reservation of a key between its cooldown check and the recorded claim
pub struct ClaimPermit<'a> {
    ledger: &'a CooldownLedger,
    key: CooldownKey,
    previous: Option<TimestampSeconds>,
}

impl ClaimPermit<'_> {
    pub fn key(&self) -> &CooldownKey {
        &self.key
    }

    // Only called once the claim was acknowledged by the network
    pub fn commit(self, now: TimestampSeconds) -> Result<(), WalletError> {
        self.ledger.commit_claim(&self.key, self.previous, now)
    }
}

impl Drop for ClaimPermit<'_> {
    fn drop(&mut self) {
        self.ledger.in_flight().remove(&self.key);
    }
}
