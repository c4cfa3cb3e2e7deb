use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use super::UnsignedTransaction;
use crate::{
    config::SIGNATURE_SIZE,
    crypto::IdentityCodec,
    tick::TickWindow,
};

fn destination_label(tx: &UnsignedTransaction, identity: &dyn IdentityCodec) -> String {
    match tx.contract_index() {
        Some(index) => format!("contract #{}", index),
        None => identity.encode_identity(tx.destination()),
    }
}

// What the user is asked to approve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub source: String,
    pub destination: String,
    pub amount: i64,
    pub selector: u16,
    pub observed_tick: u32,
    pub target_tick: u32,
    pub payload_size: u16,
    // Procedure name when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    // Decoded view of the parameters that were encoded in the payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<JsonValue>,
}

impl TransactionSummary {
    pub fn new(tx: &UnsignedTransaction, window: &TickWindow, identity: &dyn IdentityCodec) -> Self {
        Self {
            source: identity.encode_identity(tx.source()),
            destination: destination_label(tx, identity),
            amount: tx.amount(),
            selector: tx.selector(),
            observed_tick: window.observed_tick,
            target_tick: tx.tick(),
            payload_size: tx.payload_size(),
            label: None,
            parameters: None,
        }
    }

    pub fn with_label<S: Into<String>>(mut self, label: S) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_parameters(mut self, parameters: JsonValue) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

impl fmt::Display for TransactionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "From:        {}", self.source)?;
        writeln!(f, "To:          {}", self.destination)?;
        writeln!(f, "Amount:      {}", self.amount)?;
        match &self.label {
            Some(label) => writeln!(f, "Procedure:   {} ({})", label, self.selector)?,
            None if self.selector != 0 => writeln!(f, "Selector:    {}", self.selector)?,
            None => {}
        }
        writeln!(
            f,
            "Target tick: {} (current {})",
            self.target_tick, self.observed_tick
        )?;
        if self.payload_size > 0 {
            writeln!(f, "Payload:     {} bytes", self.payload_size)?;
        }
        if let Some(parameters) = &self.parameters {
            let rendered = serde_json::to_string_pretty(parameters).map_err(|_| fmt::Error)?;
            writeln!(f, "Parameters:  {}", rendered)?;
        }
        Ok(())
    }
}

// Header fields read back from a transaction buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectedTransaction {
    pub source: String,
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_index: Option<u8>,
    pub amount: i64,
    pub tick: u32,
    pub selector: u16,
    pub payload_size: u16,
    pub payload: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    pub byte_length: usize,
}

impl InspectedTransaction {
    pub fn new(
        tx: &UnsignedTransaction,
        signature: Option<&[u8; SIGNATURE_SIZE]>,
        byte_length: usize,
        identity: &dyn IdentityCodec,
    ) -> Self {
        Self {
            source: identity.encode_identity(tx.source()),
            destination: destination_label(tx, identity),
            contract_index: tx.contract_index(),
            amount: tx.amount(),
            tick: tx.tick(),
            selector: tx.selector(),
            payload_size: tx.payload_size(),
            payload: tx.payload().to_hex(),
            signature: signature.map(hex::encode),
            byte_length,
        }
    }
}
