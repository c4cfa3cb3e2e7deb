use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tickwire_common::{
    api::{decode_base64_field, encode_base64},
    crypto::PublicKey,
    transaction::{SignedTransaction, UnsignedTransaction},
};

use crate::{
    error::SigningError,
    node_api::{HttpJsonClient, NodeApiConfig},
};

pub const SIGN_PATH: &str = "v1/sign";

// External signing capability
// Receives the complete unsigned buffer (zeroed signature slot included)
// and returns the same buffer with the signature slot filled
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    // Key the signatures are produced with, used as transaction source
    fn public_key(&self) -> &PublicKey;

    async fn sign(&self, unsigned: &[u8]) -> Result<Vec<u8>, SigningError>;
}

// Sign a transaction and verify what the signer gave back
pub async fn sign_transaction(
    signer: &dyn TransactionSigner,
    tx: UnsignedTransaction,
) -> Result<SignedTransaction, SigningError> {
    let buffer = tx.to_unsigned_buffer();
    let signed = signer.sign(&buffer).await?;
    Ok(tx.attach_signed_buffer(&signed)?)
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRequest {
    pub unsigned_transaction: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignResponse {
    #[serde(default)]
    pub signed_transaction: Option<String>,
}

// Signing service reached over HTTP, holding the key material
pub struct RemoteSigner {
    http: HttpJsonClient,
    public_key: PublicKey,
}

impl RemoteSigner {
    pub fn new(address: &str, public_key: PublicKey, config: NodeApiConfig) -> Result<Self, SigningError> {
        Ok(Self {
            http: HttpJsonClient::new(address, config).map_err(SigningError::Transport)?,
            public_key,
        })
    }
}

#[async_trait]
impl TransactionSigner for RemoteSigner {
    fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    async fn sign(&self, unsigned: &[u8]) -> Result<Vec<u8>, SigningError> {
        let request = SignRequest {
            unsigned_transaction: encode_base64(unsigned),
        };
        let response: SignResponse = self
            .http
            .post(SIGN_PATH, &request)
            .await
            .map_err(SigningError::Transport)?;

        let signed = response.signed_transaction.ok_or_else(|| {
            SigningError::InvalidResponse("missing field 'signedTransaction'".to_owned())
        })?;
        decode_base64_field("signedTransaction", &signed)
            .map_err(|e| SigningError::InvalidResponse(e.to_string()))
    }
}
