// In-process collaborators shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{
    atomic::{AtomicU32, AtomicUsize, Ordering},
    Mutex,
};
use tickwire_common::{
    api::{encode_base64, node::QuerySmartContractRequest},
    config::SIGNATURE_SIZE,
    crypto::{IdentityCodec, PublicKey, StandardIdentityCodec},
    transaction::SignedTransaction,
};
use tickwire_wallet::{
    error::{NetworkError, SigningError},
    node_api::NodeClient,
    signer::TransactionSigner,
};

pub fn key(seed: u8) -> PublicKey {
    let mut bytes = [0u8; 32];
    for (i, b) in bytes.iter_mut().enumerate() {
        *b = seed.wrapping_add(i as u8).wrapping_mul(31);
    }
    PublicKey::new(bytes)
}

pub fn identity(seed: u8) -> String {
    StandardIdentityCodec.encode_identity(&key(seed))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastMode {
    Accept,
    ServerError,
    MissingId,
}

pub struct FakeNode {
    tick: u32,
    mode: Mutex<BroadcastMode>,
    response: Mutex<Vec<u8>>,
    calls: AtomicUsize,
    broadcasts: Mutex<Vec<SignedTransaction>>,
    queries: Mutex<Vec<(u32, u16, u16)>>,
}

impl FakeNode {
    pub fn new(tick: u32) -> Self {
        Self {
            tick,
            mode: Mutex::new(BroadcastMode::Accept),
            response: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            broadcasts: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn set_mode(&self, mode: BroadcastMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn set_response(&self, bytes: Vec<u8>) {
        *self.response.lock().unwrap() = bytes;
    }

    // Every HTTP call the real client would have made
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn broadcasts(&self) -> Vec<SignedTransaction> {
        self.broadcasts.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<(u32, u16, u16)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl NodeClient for FakeNode {
    async fn current_tick(&self) -> Result<u32, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.tick)
    }

    async fn broadcast(&self, tx: &SignedTransaction) -> Result<String, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mode = *self.mode.lock().unwrap();
        match mode {
            BroadcastMode::Accept => {
                let mut broadcasts = self.broadcasts.lock().unwrap();
                broadcasts.push(tx.clone());
                Ok(format!("tx-{}", broadcasts.len()))
            }
            BroadcastMode::ServerError => Err(NetworkError::Status {
                endpoint: "http://node/v1/broadcast-transaction".to_owned(),
                status: 500,
                body: "internal error".to_owned(),
            }),
            BroadcastMode::MissingId => Err(NetworkError::MissingField {
                endpoint: "http://node/v1/broadcast-transaction".to_owned(),
                field: "transactionId",
            }),
        }
    }

    async fn query(&self, request: &QuerySmartContractRequest<'_>) -> Result<String, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push((
            request.contract_index,
            request.input_type,
            request.input_size,
        ));
        Ok(encode_base64(&self.response.lock().unwrap()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignerMode {
    Valid,
    Truncated,
    Tampering,
    Failing,
}

pub struct FakeSigner {
    key: PublicKey,
    mode: Mutex<SignerMode>,
    calls: AtomicUsize,
    last_len: AtomicU32,
}

impl FakeSigner {
    pub fn new(key: PublicKey) -> Self {
        Self {
            key,
            mode: Mutex::new(SignerMode::Valid),
            calls: AtomicUsize::new(0),
            last_len: AtomicU32::new(0),
        }
    }

    pub fn set_mode(&self, mode: SignerMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    // Length of the last buffer submitted for signing
    pub fn last_len(&self) -> usize {
        self.last_len.load(Ordering::SeqCst) as usize
    }
}

#[async_trait]
impl TransactionSigner for FakeSigner {
    fn public_key(&self) -> &PublicKey {
        &self.key
    }

    async fn sign(&self, unsigned: &[u8]) -> Result<Vec<u8>, SigningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_len.store(unsigned.len() as u32, Ordering::SeqCst);

        let mut signed = unsigned.to_vec();
        let slot = signed.len() - SIGNATURE_SIZE;
        signed[slot..].fill(0xAB);

        let mode = *self.mode.lock().unwrap();
        match mode {
            SignerMode::Valid => Ok(signed),
            SignerMode::Truncated => {
                signed.truncate(signed.len() - 1);
                Ok(signed)
            }
            SignerMode::Tampering => {
                // Amount field
                signed[64] ^= 0x01;
                Ok(signed)
            }
            SignerMode::Failing => Err(SigningError::Capability("user closed the wallet".to_owned())),
        }
    }
}
