// Request and response bodies of the node HTTP surface
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::{codec::Payload, error::ValidationError, transaction::SignedTransaction};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickInfo {
    pub tick: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_tick: Option<u32>,
}

// GET /v1/tick-info
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickInfoResponse {
    pub tick_info: Option<TickInfo>,
}

// POST /v1/broadcast-transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastTransactionRequest<'a> {
    pub encoded_transaction: Cow<'a, str>,
}

impl BroadcastTransactionRequest<'static> {
    pub fn new(tx: &SignedTransaction) -> Self {
        Self {
            encoded_transaction: Cow::Owned(tx.to_base64()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastTransactionResponse {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peers_broadcasted: Option<u32>,
}

// POST /v1/querySmartContract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySmartContractRequest<'a> {
    pub contract_index: u32,
    pub input_type: u16,
    pub input_size: u16,
    pub request_data: Cow<'a, str>,
}

impl QuerySmartContractRequest<'static> {
    pub fn new(
        contract_index: u32,
        input_type: u16,
        payload: &Payload,
    ) -> Result<Self, ValidationError> {
        let input_size =
            u16::try_from(payload.size()).map_err(|_| ValidationError::PayloadTooLarge {
                field: "requestData".to_owned(),
                size: payload.size(),
                max: u16::MAX as usize,
            })?;

        Ok(Self {
            contract_index,
            input_type,
            input_size,
            request_data: Cow::Owned(super::encode_base64(payload.as_bytes())),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySmartContractResponse {
    #[serde(default)]
    pub response_data: Option<String>,
}
