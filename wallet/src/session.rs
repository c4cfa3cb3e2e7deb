use log::debug;
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use tickwire_common::{
    api::{decode_base64_field, node::QuerySmartContractRequest},
    codec::{DecodeResult, ParameterCodec, Payload, Value},
    crypto::PublicKey,
    error::ValidationError,
    schema::{ContractSchema, FieldDescriptor, TypeTag},
    transaction::{build_invocation, build_transfer, validate_amount, TransactionSummary},
};

use crate::{
    confirmation::{ConfirmationPipeline, PendingConfirmation},
    error::WalletError,
    node_api::NodeClient,
    signer::TransactionSigner,
    tick_clock::TickClock,
};

// One wallet: a signing key, a node, and its confirmation pipeline
// Every flow validates its inputs before the first network call
pub struct WalletSession {
    codec: ParameterCodec,
    clock: TickClock,
    queries: QueryClient,
    signer: Arc<dyn TransactionSigner>,
    pipeline: ConfirmationPipeline,
}

impl WalletSession {
    pub fn new(
        node: Arc<dyn NodeClient>,
        signer: Arc<dyn TransactionSigner>,
        codec: ParameterCodec,
        tick_offset: u32,
    ) -> Self {
        Self {
            clock: TickClock::new(Arc::clone(&node), tick_offset),
            pipeline: ConfirmationPipeline::new(Arc::clone(&node), Arc::clone(&signer)),
            queries: QueryClient::new(node, codec.clone()),
            codec,
            signer,
        }
    }

    pub fn codec(&self) -> &ParameterCodec {
        &self.codec
    }

    pub fn clock(&self) -> &TickClock {
        &self.clock
    }

    pub fn pipeline(&self) -> &ConfirmationPipeline {
        &self.pipeline
    }

    pub fn source(&self) -> &PublicKey {
        self.signer.public_key()
    }

    fn parse_amount(&self, amount: &str) -> Result<i64, ValidationError> {
        match self.codec.parse_value(
            "amount",
            &TypeTag::I64,
            &JsonValue::String(amount.trim().to_owned()),
        )? {
            Value::I64(amount) => {
                validate_amount(amount)?;
                Ok(amount)
            }
            _ => Err(ValidationError::UnexpectedShape {
                field: "amount".to_owned(),
                expected: "integer",
            }),
        }
    }

    fn parse_destination(&self, destination: &str) -> Result<PublicKey, ValidationError> {
        self.codec
            .identity()
            .decode_identity(destination.trim())
            .map_err(|e| ValidationError::MalformedIdentity {
                field: "destination".to_owned(),
                reason: e.to_string(),
            })
    }

    // Value transfer to an identity
    pub async fn prepare_transfer(
        &self,
        destination: &str,
        amount: &str,
    ) -> Result<PendingConfirmation, WalletError> {
        let destination = self.parse_destination(destination)?;
        let amount = self.parse_amount(amount)?;

        let window = self.clock.window().await?;
        let tx = build_transfer(*self.source(), destination, amount, &window)?;
        let summary = TransactionSummary::new(&tx, &window, self.codec.identity());
        self.pipeline.request(tx, summary)
    }

    // Contract procedure call
    // Without an explicit amount, the procedure fee from the schema is attached
    pub async fn prepare_invocation(
        &self,
        schema: &ContractSchema,
        procedure: &str,
        values: &Map<String, JsonValue>,
        amount: Option<&str>,
    ) -> Result<PendingConfirmation, WalletError> {
        let entry = schema.procedure(procedure)?;
        let contract = u8::try_from(schema.contract_index).map_err(|_| {
            ValidationError::OutOfRange {
                field: "contractIndex".to_owned(),
                value: schema.contract_index.to_string(),
                type_name: "uint8",
            }
        })?;
        let amount = match amount {
            Some(amount) => self.parse_amount(amount)?,
            None => {
                let fee = entry.fee.unwrap_or(0);
                i64::try_from(fee).map_err(|_| ValidationError::OutOfRange {
                    field: "fee".to_owned(),
                    value: fee.to_string(),
                    type_name: "sint64",
                })?
            }
        };
        let payload = self.codec.encode(values, &entry.inputs)?;
        let preview = self.preview(&payload, &entry.inputs);

        let window = self.clock.window().await?;
        let tx = build_invocation(
            *self.source(),
            contract,
            entry.index,
            amount,
            &window,
            payload,
        )?;

        let mut summary = TransactionSummary::new(&tx, &window, self.codec.identity())
            .with_label(format!("{}.{}", schema.name, entry.name));
        if let Some(preview) = preview {
            summary = summary.with_parameters(preview);
        }
        self.pipeline.request(tx, summary)
    }

    // Parameters as they will be read by the contract
    fn preview(&self, payload: &Payload, inputs: &[FieldDescriptor]) -> Option<JsonValue> {
        if inputs.is_empty() {
            return None;
        }
        let decoded = self.codec.decode(payload.as_bytes(), inputs).ok()?;
        let fields = decoded
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json(self.codec.identity())))
            .collect::<Map<_, _>>();
        Some(JsonValue::Object(fields))
    }

    pub fn queries(&self) -> &QueryClient {
        &self.queries
    }

    pub async fn query(
        &self,
        schema: &ContractSchema,
        function: &str,
        values: &Map<String, JsonValue>,
    ) -> Result<DecodeResult, WalletError> {
        self.queries.query(schema, function, values).await
    }
}

// Read-only contract calls, no signer involved
#[derive(Clone)]
pub struct QueryClient {
    codec: ParameterCodec,
    node: Arc<dyn NodeClient>,
}

impl QueryClient {
    pub fn new(node: Arc<dyn NodeClient>, codec: ParameterCodec) -> Self {
        Self { codec, node }
    }

    // Read-only contract function call
    pub async fn query(
        &self,
        schema: &ContractSchema,
        function: &str,
        values: &Map<String, JsonValue>,
    ) -> Result<DecodeResult, WalletError> {
        let entry = schema.function(function)?;
        let payload = self.codec.encode(values, &entry.inputs)?;
        self.query_raw(
            schema.contract_index,
            entry.index,
            &payload,
            Some(&entry.outputs),
        )
        .await
    }

    // Query with caller supplied input bytes
    // Without an output schema the response is decoded by heuristic
    pub async fn query_raw(
        &self,
        contract_index: u32,
        input_type: u16,
        payload: &Payload,
        outputs: Option<&[FieldDescriptor]>,
    ) -> Result<DecodeResult, WalletError> {
        let request = QuerySmartContractRequest::new(contract_index, input_type, payload)?;
        let response = self.node.query(&request).await?;
        let bytes = decode_base64_field("responseData", &response)?;

        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "contract {} function {} answered with {} bytes",
                contract_index,
                input_type,
                bytes.len()
            );
        }
        Ok(self.codec.decode_response(&bytes, outputs)?)
    }
}
