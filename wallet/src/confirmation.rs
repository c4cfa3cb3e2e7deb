use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tickwire_common::transaction::{TransactionSummary, UnsignedTransaction};
use tokio::sync::watch;

use crate::{
    error::WalletError,
    node_api::NodeClient,
    signer::{sign_transaction, TransactionSigner},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ConfirmationState {
    Idle,
    AwaitingApproval,
    Signing,
    Broadcasting,
    #[serde(rename_all = "camelCase")]
    Settled { tx_id: String },
    Rejected,
    Failed { reason: String },
}

impl ConfirmationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Settled { .. } | Self::Rejected | Self::Failed { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingApproval => "awaiting approval",
            Self::Signing => "signing",
            Self::Broadcasting => "broadcasting",
            Self::Settled { .. } => "settled",
            Self::Rejected => "rejected",
            Self::Failed { .. } => "failed",
        }
    }
}

// Broadcast acknowledgement of a confirmed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastReceipt {
    pub tx_id: String,
    pub target_tick: u32,
}

struct PipelineShared {
    node: Arc<dyn NodeClient>,
    signer: Arc<dyn TransactionSigner>,
    // Set while a confirmation is awaiting approval, signing or broadcasting
    is_requesting: AtomicBool,
    state: watch::Sender<ConfirmationState>,
}

impl PipelineShared {
    fn set_state(&self, state: ConfirmationState) {
        if log::log_enabled!(log::Level::Info) {
            match &state {
                ConfirmationState::Failed { reason } => {
                    info!("confirmation {}: {}", state.name(), reason)
                }
                ConfirmationState::Settled { tx_id } => {
                    info!("confirmation {}: {}", state.name(), tx_id)
                }
                _ => info!("confirmation {}", state.name()),
            }
        }
        self.state.send_replace(state);
    }

    // Enter a terminal state and accept new requests again
    fn finish(&self, state: ConfirmationState) {
        self.set_state(state);
        self.is_requesting.store(false, Ordering::SeqCst);
    }

    // Signing strictly precedes broadcast, and nothing is broadcast if signing failed
    async fn sign_and_broadcast(
        &self,
        tx: UnsignedTransaction,
    ) -> Result<BroadcastReceipt, WalletError> {
        let target_tick = tx.tick();
        self.set_state(ConfirmationState::Signing);
        let signed = match sign_transaction(self.signer.as_ref(), tx).await {
            Ok(signed) => signed,
            Err(e) => {
                self.finish(ConfirmationState::Failed {
                    reason: e.to_string(),
                });
                return Err(e.into());
            }
        };

        self.set_state(ConfirmationState::Broadcasting);
        match self.node.broadcast(&signed).await {
            Ok(tx_id) => {
                self.finish(ConfirmationState::Settled {
                    tx_id: tx_id.clone(),
                });
                Ok(BroadcastReceipt { tx_id, target_tick })
            }
            Err(e) => {
                self.finish(ConfirmationState::Failed {
                    reason: e.to_string(),
                });
                Err(e.into())
            }
        }
    }
}

// Pairs a built transaction with a user approval gate, then drives signing and broadcast
// Only one confirmation can be in flight at a time
#[derive(Clone)]
pub struct ConfirmationPipeline {
    shared: Arc<PipelineShared>,
}

impl ConfirmationPipeline {
    pub fn new(node: Arc<dyn NodeClient>, signer: Arc<dyn TransactionSigner>) -> Self {
        let (state, _) = watch::channel(ConfirmationState::Idle);
        Self {
            shared: Arc::new(PipelineShared {
                node,
                signer,
                is_requesting: AtomicBool::new(false),
                state,
            }),
        }
    }

    pub fn state(&self) -> ConfirmationState {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConfirmationState> {
        self.shared.state.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.shared.is_requesting.load(Ordering::SeqCst)
    }

    // Submit a transaction for approval
    // A second request while one is pending is rejected, never merged
    pub fn request(
        &self,
        tx: UnsignedTransaction,
        summary: TransactionSummary,
    ) -> Result<PendingConfirmation, WalletError> {
        if self
            .shared
            .is_requesting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            if log::log_enabled!(log::Level::Warn) {
                warn!("confirmation request rejected, another one is in progress");
            }
            return Err(WalletError::PipelineBusy);
        }

        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "confirmation requested for {} bytes transaction",
                tx.buffer_size()
            );
        }
        self.shared.set_state(ConfirmationState::AwaitingApproval);
        Ok(PendingConfirmation {
            draft: Some((tx, summary)),
            shared: Arc::clone(&self.shared),
        })
    }
}

// Transaction waiting for the user's decision
// Dropping it without approving counts as a rejection
pub struct PendingConfirmation {
    draft: Option<(UnsignedTransaction, TransactionSummary)>,
    shared: Arc<PipelineShared>,
}

impl std::fmt::Debug for PendingConfirmation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingConfirmation")
            .field("draft", &self.draft)
            .finish_non_exhaustive()
    }
}

impl PendingConfirmation {
    pub fn summary(&self) -> Option<&TransactionSummary> {
        self.draft.as_ref().map(|(_, summary)| summary)
    }

    pub fn transaction(&self) -> Option<&UnsignedTransaction> {
        self.draft.as_ref().map(|(tx, _)| tx)
    }

    pub fn cancel(mut self) {
        if self.draft.take().is_some() {
            self.shared.finish(ConfirmationState::Rejected);
        }
    }

    // Once approved the cycle runs to Settled or Failed on its own task,
    // even if the returned future is dropped
    pub async fn approve(mut self) -> Result<BroadcastReceipt, WalletError> {
        let (tx, _) = self.draft.take().ok_or(WalletError::Rejected)?;
        let shared = Arc::clone(&self.shared);
        let task = tokio::spawn(async move { shared.sign_and_broadcast(tx).await });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                self.shared.finish(ConfirmationState::Failed {
                    reason: e.to_string(),
                });
                Err(WalletError::TaskFailed(e.to_string()))
            }
        }
    }
}

impl Drop for PendingConfirmation {
    fn drop(&mut self) {
        if self.draft.take().is_some() {
            self.shared.finish(ConfirmationState::Rejected);
        }
    }
}
