//! Parameter codec: named values to contract payload bytes and back.
//!
//! Encoding walks an ordered schema and writes each field little-endian at
//! its declared width. Decoding walks the same schema over a bounded
//! [`Reader`](crate::serializer::Reader), or falls back to a length based
//! heuristic when no output schema is known.

mod decode;
mod encode;
mod value;

pub use decode::*;
pub use value::Value;

use std::{fmt, sync::Arc};

use crate::crypto::{IdentityCodec, StandardIdentityCodec};

// How arrays shorter than their declared size are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayPolicy {
    // Pad with zero-valued elements up to the declared size
    #[default]
    ZeroFill,
    // Write only the supplied elements
    Exact,
    // Require exactly the declared number of elements
    Strict,
}

// Encoded parameter bytes, attached to an invocation or sent as query input
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Payload(Vec<u8>);

impl Payload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    // Payload size as carried in the transaction header
    pub fn size(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

#[derive(Clone)]
pub struct ParameterCodec {
    identity: Arc<dyn IdentityCodec>,
    array_policy: ArrayPolicy,
}

impl Default for ParameterCodec {
    fn default() -> Self {
        Self::new(Arc::new(StandardIdentityCodec), ArrayPolicy::default())
    }
}

impl fmt::Debug for ParameterCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterCodec")
            .field("array_policy", &self.array_policy)
            .finish()
    }
}

impl ParameterCodec {
    pub fn new(identity: Arc<dyn IdentityCodec>, array_policy: ArrayPolicy) -> Self {
        Self {
            identity,
            array_policy,
        }
    }

    pub fn with_array_policy(mut self, array_policy: ArrayPolicy) -> Self {
        self.array_policy = array_policy;
        self
    }

    pub fn array_policy(&self) -> ArrayPolicy {
        self.array_policy
    }

    pub fn identity(&self) -> &dyn IdentityCodec {
        self.identity.as_ref()
    }

    pub fn identity_codec(&self) -> Arc<dyn IdentityCodec> {
        Arc::clone(&self.identity)
    }
}
