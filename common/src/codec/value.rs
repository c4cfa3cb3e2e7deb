use indexmap::IndexMap;
use serde_json::{json, Value as JsonValue};

use crate::{crypto::{IdentityCodec, PublicKey}, schema::TypeTag};

// Typed value of a single schema field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Bool(bool),
    Id(PublicKey),
    Chars(String),
    Array(Vec<Value>),
    Struct(IndexMap<String, Value>),
}

impl Value {
    // Zero value of a type, used to pad fixed-size arrays
    pub fn zero(type_tag: &TypeTag) -> Self {
        match type_tag {
            TypeTag::U8 => Self::U8(0),
            TypeTag::U16 => Self::U16(0),
            TypeTag::U32 => Self::U32(0),
            TypeTag::U64 => Self::U64(0),
            TypeTag::I8 => Self::I8(0),
            TypeTag::I16 => Self::I16(0),
            TypeTag::I32 => Self::I32(0),
            TypeTag::I64 => Self::I64(0),
            TypeTag::Bool => Self::Bool(false),
            TypeTag::Id => Self::Id(PublicKey::zero()),
            TypeTag::Chars(_) => Self::Chars(String::new()),
            TypeTag::Array { element, size } => {
                Self::Array((0..*size).map(|_| Self::zero(element)).collect())
            }
            TypeTag::Struct(shape) => Self::Struct(
                shape
                    .fields
                    .iter()
                    .map(|f| (f.name.clone(), Self::zero(&f.type_tag)))
                    .collect(),
            ),
        }
    }

    // Integer content widened to i128, if this is an integer
    pub fn as_i128(&self) -> Option<i128> {
        Some(match self {
            Self::U8(v) => *v as i128,
            Self::U16(v) => *v as i128,
            Self::U32(v) => *v as i128,
            Self::U64(v) => *v as i128,
            Self::I8(v) => *v as i128,
            Self::I16(v) => *v as i128,
            Self::I32(v) => *v as i128,
            Self::I64(v) => *v as i128,
            _ => return None,
        })
    }

    // JSON view of the value
    // 64-bit integers are rendered as decimal strings so no client loses precision
    pub fn to_json(&self, identity: &dyn IdentityCodec) -> JsonValue {
        match self {
            Self::U8(v) => json!(v),
            Self::U16(v) => json!(v),
            Self::U32(v) => json!(v),
            Self::U64(v) => JsonValue::String(v.to_string()),
            Self::I8(v) => json!(v),
            Self::I16(v) => json!(v),
            Self::I32(v) => json!(v),
            Self::I64(v) => JsonValue::String(v.to_string()),
            Self::Bool(v) => JsonValue::Bool(*v),
            Self::Id(key) => JsonValue::String(identity.encode_identity(key)),
            Self::Chars(text) => JsonValue::String(text.clone()),
            Self::Array(values) => {
                JsonValue::Array(values.iter().map(|v| v.to_json(identity)).collect())
            }
            Self::Struct(fields) => JsonValue::Object(
                fields
                    .iter()
                    .map(|(name, v)| (name.clone(), v.to_json(identity)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{crypto::StandardIdentityCodec, schema::TypeRegistry};

    #[test]
    fn test_large_integers_render_as_strings() {
        let codec = StandardIdentityCodec;
        assert_eq!(Value::U64(u64::MAX).to_json(&codec), json!("18446744073709551615"));
        assert_eq!(Value::I64(-1).to_json(&codec), json!("-1"));
        assert_eq!(Value::U32(7).to_json(&codec), json!(7));
    }

    #[test]
    fn test_zero_struct() {
        let registry = TypeRegistry::new();
        let shape = registry.get("TransferProposal").unwrap();
        let zero = Value::zero(&TypeTag::Struct(shape.clone()));
        match zero {
            Value::Struct(fields) => {
                assert_eq!(fields["destination"], Value::Id(PublicKey::zero()));
                assert_eq!(fields["amount"], Value::I64(0));
            }
            other => panic!("unexpected value {:?}", other),
        }
    }
}
