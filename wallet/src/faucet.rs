use log::{info, warn};
use std::{collections::HashMap, sync::Arc};
use tickwire_common::{
    api::faucet::{FaucetClaimRequest, FaucetStatusResponse},
    crypto::{IdentityCodec, PublicKey},
    error::ValidationError,
    network::Network,
    time::{get_current_time_in_seconds, TimestampSeconds},
    transaction::{build_transfer, validate_amount},
};

use crate::{
    confirmation::BroadcastReceipt,
    cooldown::CooldownLedger,
    error::WalletError,
    node_api::NodeClient,
    signer::{sign_transaction, TransactionSigner},
    storage::CooldownKey,
    tick_clock::TickClock,
};

// Node and funded signer serving one network
pub struct FaucetBackend {
    node: Arc<dyn NodeClient>,
    signer: Arc<dyn TransactionSigner>,
    clock: TickClock,
}

impl FaucetBackend {
    pub fn new(
        node: Arc<dyn NodeClient>,
        signer: Arc<dyn TransactionSigner>,
        tick_offset: u32,
    ) -> Self {
        Self {
            clock: TickClock::new(Arc::clone(&node), tick_offset),
            node,
            signer,
        }
    }
}

// Server side claims: build, sign and broadcast a fixed transfer,
// then record the claim once the node acknowledged it
pub struct FaucetService {
    backends: HashMap<Network, FaucetBackend>,
    amount: i64,
    ledger: CooldownLedger,
    identity: Arc<dyn IdentityCodec>,
}

impl FaucetService {
    pub fn new(
        amount: i64,
        ledger: CooldownLedger,
        identity: Arc<dyn IdentityCodec>,
    ) -> Result<Self, ValidationError> {
        validate_amount(amount)?;
        Ok(Self {
            backends: HashMap::new(),
            amount,
            ledger,
            identity,
        })
    }

    pub fn with_backend(mut self, network: Network, backend: FaucetBackend) -> Self {
        self.backends.insert(network, backend);
        self
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn ledger(&self) -> &CooldownLedger {
        &self.ledger
    }

    pub fn networks(&self) -> impl Iterator<Item = &Network> {
        self.backends.keys()
    }

    // Served networks only; an unconfigured one is rejected like an unknown one
    fn backend(&self, field: &str, network: &str) -> Result<(Network, &FaucetBackend), ValidationError> {
        let network = Network::parse_field(field, network)?;
        let backend = self
            .backends
            .get(&network)
            .ok_or_else(|| ValidationError::UnknownNetwork {
                field: field.to_owned(),
                value: network.to_string(),
            })?;
        Ok((network, backend))
    }

    // Key and canonical text of a valid identity
    fn parse_address(
        &self,
        field: &str,
        address: &str,
    ) -> Result<(PublicKey, String), ValidationError> {
        let key = self
            .identity
            .decode_identity(address.trim())
            .map_err(|e| ValidationError::MalformedIdentity {
                field: field.to_owned(),
                reason: e.to_string(),
            })?;
        let text = self.identity.encode_identity(&key);
        Ok((key, text))
    }

    pub async fn claim(&self, request: &FaucetClaimRequest) -> Result<BroadcastReceipt, WalletError> {
        self.claim_at(request, get_current_time_in_seconds()).await
    }

    // Validation and the cooldown check happen before any network call
    pub async fn claim_at(
        &self,
        request: &FaucetClaimRequest,
        now: TimestampSeconds,
    ) -> Result<BroadcastReceipt, WalletError> {
        let result = self.process_claim(request, now).await;
        if let Err(e) = &result {
            if log::log_enabled!(log::Level::Warn) {
                warn!(
                    "faucet claim of {} on {} rejected: {}",
                    request.target_address, request.network, e
                );
            }
        }
        result
    }

    async fn process_claim(
        &self,
        request: &FaucetClaimRequest,
        now: TimestampSeconds,
    ) -> Result<BroadcastReceipt, WalletError> {
        let (network, backend) = self.backend("network", &request.network)?;
        let (destination, address) =
            self.parse_address("targetAddress", &request.target_address)?;

        let permit = self.ledger.begin_claim(CooldownKey::new(network, address), now)?;

        let window = backend.clock.window().await?;
        let tx = build_transfer(
            *backend.signer.public_key(),
            destination,
            self.amount,
            &window,
        )?;
        let signed = sign_transaction(backend.signer.as_ref(), tx).await?;
        let tx_id = backend.node.broadcast(&signed).await?;

        if log::log_enabled!(log::Level::Info) {
            info!(
                "faucet sent {} to {} on {}: {}",
                self.amount,
                permit.key().address,
                network,
                tx_id
            );
        }
        permit.commit(now)?;

        Ok(BroadcastReceipt {
            tx_id,
            target_tick: window.target_tick,
        })
    }

    pub fn status(&self, network: &str, address: &str) -> Result<FaucetStatusResponse, WalletError> {
        self.status_at(network, address, get_current_time_in_seconds())
    }

    // Read-only view of the ledger for one address
    pub fn status_at(
        &self,
        network: &str,
        address: &str,
        now: TimestampSeconds,
    ) -> Result<FaucetStatusResponse, WalletError> {
        let (network, _) = self.backend("network", network)?;
        let (_, address) = self.parse_address("address", address)?;
        let remaining = self
            .ledger
            .remaining_at(&CooldownKey::new(network, address.clone()), now)?;

        Ok(FaucetStatusResponse {
            network,
            address,
            can_claim: remaining.is_none(),
            remaining_seconds: remaining.map(|r| r.as_secs()).unwrap_or(0),
        })
    }
}
