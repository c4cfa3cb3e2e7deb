// Faucet HTTP bodies
use serde::{Deserialize, Serialize};

use crate::network::Network;

// POST /v1/faucet/claim
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaucetClaimRequest {
    // Kept as text: an unknown network is a validation error, not a parse failure
    pub network: String,
    pub target_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaucetClaimResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_tick: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

impl FaucetClaimResponse {
    pub fn claimed(tx_id: String, target_tick: u32) -> Self {
        Self {
            success: true,
            tx_id: Some(tx_id),
            target_tick: Some(target_tick),
            error: None,
            retry_after_seconds: None,
        }
    }

    pub fn failed(error: String, retry_after_seconds: Option<u64>) -> Self {
        Self {
            success: false,
            tx_id: None,
            target_tick: None,
            error: Some(error),
            retry_after_seconds,
        }
    }
}

// GET /v1/faucet/status/{network}/{address}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaucetStatusResponse {
    pub network: Network,
    pub address: String,
    pub can_claim: bool,
    pub remaining_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_claim_response_shapes() {
        let ok = FaucetClaimResponse::claimed("abc".to_owned(), 42);
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({ "success": true, "txId": "abc", "targetTick": 42 })
        );

        let limited = FaucetClaimResponse::failed("wait".to_owned(), Some(60));
        assert_eq!(
            serde_json::to_value(&limited).unwrap(),
            json!({ "success": false, "error": "wait", "retryAfterSeconds": 60 })
        );
    }
}
