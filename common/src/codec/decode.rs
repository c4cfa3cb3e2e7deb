use indexmap::IndexMap;
use log::{debug, trace};
use serde_json::{json, Value as JsonValue};

use super::{ParameterCodec, Value};
use crate::{
    crypto::{IdentityCodec, PublicKey},
    error::ProtocolError,
    schema::{FieldDescriptor, TypeTag},
    serializer::{Reader, ReaderError},
};

// Response decoded against an explicit output schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedResponse {
    pub fields: IndexMap<String, Value>,
    pub raw_hex: String,
    pub byte_length: usize,
    // Bytes left after the last schema field
    pub trailing_bytes: usize,
}

impl DecodedResponse {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn to_json(&self, identity: &dyn IdentityCodec) -> JsonValue {
        let fields: serde_json::Map<String, JsonValue> = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json(identity)))
            .collect();
        json!({
            "format": "typed",
            "fields": fields,
            "rawHex": self.raw_hex,
            "byteLength": self.byte_length,
            "trailingBytes": self.trailing_bytes,
        })
    }
}

// Best guess at the structure of a response without schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Heuristic {
    Integer32 { unsigned: u32, signed: i32 },
    Integer64 { unsigned: u64, signed: i64 },
    U64Sequence(Vec<u64>),
    Unrecognized,
}

impl Heuristic {
    pub fn format(&self) -> &'static str {
        match self {
            Self::Integer32 { .. } | Self::Integer64 { .. } => "integer",
            Self::U64Sequence(_) => "u64Sequence",
            Self::Unrecognized => "unrecognized",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFallback {
    pub guess: Heuristic,
    pub raw_hex: String,
    pub byte_length: usize,
}

impl RawFallback {
    pub fn to_json(&self) -> JsonValue {
        let value = match &self.guess {
            Heuristic::Integer32 { unsigned, signed } => json!({ "unsigned": unsigned, "signed": signed }),
            Heuristic::Integer64 { unsigned, signed } => json!({
                "unsigned": unsigned.to_string(),
                "signed": signed.to_string(),
            }),
            Heuristic::U64Sequence(values) => {
                JsonValue::Array(values.iter().map(|v| JsonValue::String(v.to_string())).collect())
            }
            Heuristic::Unrecognized => JsonValue::Null,
        };
        json!({
            "format": self.guess.format(),
            "value": value,
            "rawHex": self.raw_hex,
            "byteLength": self.byte_length,
        })
    }
}

// Outcome of decoding a query response
// A heuristic guess is never presented as a schema decode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    Typed(DecodedResponse),
    RawFallback(RawFallback),
}

impl DecodeResult {
    pub fn is_typed(&self) -> bool {
        matches!(self, Self::Typed(_))
    }

    pub fn byte_length(&self) -> usize {
        match self {
            Self::Typed(response) => response.byte_length,
            Self::RawFallback(fallback) => fallback.byte_length,
        }
    }

    pub fn to_json(&self, identity: &dyn IdentityCodec) -> JsonValue {
        match self {
            Self::Typed(response) => response.to_json(identity),
            Self::RawFallback(fallback) => fallback.to_json(),
        }
    }
}

fn map_reader_error(
    field: &str,
    total: usize,
    position: usize,
) -> impl Fn(ReaderError) -> ProtocolError + '_ {
    move |e| match e {
        ReaderError::InvalidSize {
            needed,
            available,
            offset,
        } => ProtocolError::CursorOverrun {
            field: field.to_owned(),
            needed,
            available,
            offset,
            total,
        },
        ReaderError::InvalidValue => ProtocolError::InvalidFieldValue {
            field: field.to_owned(),
            offset: position,
        },
    }
}

fn read_value(reader: &mut Reader, field: &str, type_tag: &TypeTag) -> Result<Value, ProtocolError> {
    let err = map_reader_error(field, reader.total_size(), reader.total_read());
    Ok(match type_tag {
        TypeTag::U8 => Value::U8(reader.read_u8().map_err(err)?),
        TypeTag::U16 => Value::U16(reader.read_u16().map_err(err)?),
        TypeTag::U32 => Value::U32(reader.read_u32().map_err(err)?),
        TypeTag::U64 => Value::U64(reader.read_u64().map_err(err)?),
        TypeTag::I8 => Value::I8(reader.read_i8().map_err(err)?),
        TypeTag::I16 => Value::I16(reader.read_i16().map_err(err)?),
        TypeTag::I32 => Value::I32(reader.read_i32().map_err(err)?),
        TypeTag::I64 => Value::I64(reader.read_i64().map_err(err)?),
        TypeTag::Bool => Value::Bool(reader.read_bool().map_err(err)?),
        TypeTag::Id => Value::Id(PublicKey::new(reader.read_bytes_32().map_err(err)?)),
        TypeTag::Chars(size) => {
            let bytes = reader.read_bytes_ref(*size).map_err(err)?;
            let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
            Value::Chars(String::from_utf8_lossy(&bytes[..end]).into_owned())
        }
        TypeTag::Array { element, size } => {
            // Never reserve more elements than the bytes left could hold
            let mut values = Vec::with_capacity((*size).min(reader.size()));
            for i in 0..*size {
                values.push(read_value(reader, &format!("{}[{}]", field, i), element)?);
            }
            Value::Array(values)
        }
        TypeTag::Struct(shape) => {
            let mut fields = IndexMap::with_capacity(shape.fields.len());
            for sub in &shape.fields {
                let value = read_value(reader, &format!("{}.{}", field, sub.name), &sub.type_tag)?;
                fields.insert(sub.name.clone(), value);
            }
            Value::Struct(fields)
        }
    })
}

// Guess the structure of a response from its length alone
// Only whole integers are ever read, whatever the length
pub fn decode_heuristic(bytes: &[u8]) -> RawFallback {
    let guess = match bytes.len() {
        4 => {
            let mut buf = [0u8; 4];
            buf.copy_from_slice(bytes);
            Heuristic::Integer32 {
                unsigned: u32::from_le_bytes(buf),
                signed: i32::from_le_bytes(buf),
            }
        }
        8 => {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(bytes);
            Heuristic::Integer64 {
                unsigned: u64::from_le_bytes(buf),
                signed: i64::from_le_bytes(buf),
            }
        }
        len if len > 0 && len % 8 == 0 => Heuristic::U64Sequence(
            bytes
                .chunks_exact(8)
                .map(|chunk| {
                    let mut buf = [0u8; 8];
                    buf.copy_from_slice(chunk);
                    u64::from_le_bytes(buf)
                })
                .collect(),
        ),
        _ => Heuristic::Unrecognized,
    };

    RawFallback {
        guess,
        raw_hex: hex::encode(bytes),
        byte_length: bytes.len(),
    }
}

impl ParameterCodec {
    // Decode a response against an ordered output schema
    pub fn decode(
        &self,
        bytes: &[u8],
        schema: &[FieldDescriptor],
    ) -> Result<DecodedResponse, ProtocolError> {
        let mut reader = Reader::new(bytes);
        let mut fields = IndexMap::with_capacity(schema.len());
        for field in schema {
            let value = read_value(&mut reader, &field.name, &field.type_tag)?;
            fields.insert(field.name.clone(), value);
        }

        let trailing_bytes = reader.size();
        if trailing_bytes > 0 && log::log_enabled!(log::Level::Debug) {
            debug!(
                "{} trailing bytes after decoding {} fields from {} bytes",
                trailing_bytes,
                schema.len(),
                bytes.len()
            );
        }

        Ok(DecodedResponse {
            fields,
            raw_hex: hex::encode(bytes),
            byte_length: bytes.len(),
            trailing_bytes,
        })
    }

    // Decode with the output schema when one is known, by heuristic otherwise
    // An empty schema counts as unknown
    pub fn decode_response(
        &self,
        bytes: &[u8],
        schema: Option<&[FieldDescriptor]>,
    ) -> Result<DecodeResult, ProtocolError> {
        match schema {
            Some(schema) if !schema.is_empty() => self.decode(bytes, schema).map(DecodeResult::Typed),
            _ => {
                if log::log_enabled!(log::Level::Trace) {
                    trace!("no output schema, decoding {} bytes by heuristic", bytes.len());
                }
                Ok(DecodeResult::RawFallback(decode_heuristic(bytes)))
            }
        }
    }

    pub fn render(&self, result: &DecodeResult) -> JsonValue {
        result.to_json(self.identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{codec::ArrayPolicy, crypto::StandardIdentityCodec, schema::TypeRegistry};
    use std::sync::Arc;

    fn field(name: &str, type_tag: TypeTag) -> FieldDescriptor {
        FieldDescriptor::new(name, type_tag)
    }

    fn full_schema() -> Vec<FieldDescriptor> {
        let registry = TypeRegistry::new();
        let proposal = registry.get("TransferProposal").unwrap().clone();
        vec![
            field("a", TypeTag::U8),
            field("b", TypeTag::U16),
            field("c", TypeTag::U32),
            field("d", TypeTag::U64),
            field("e", TypeTag::I8),
            field("f", TypeTag::I16),
            field("g", TypeTag::I32),
            field("h", TypeTag::I64),
            field("flag", TypeTag::Bool),
            field("owner", TypeTag::Id),
            field("name", TypeTag::Chars(8)),
            field("list", TypeTag::Array { element: Box::new(TypeTag::I32), size: 3 }),
            field("proposal", TypeTag::Struct(proposal)),
        ]
    }

    #[test]
    fn test_typed_values_survive_encode_decode() {
        let codec = ParameterCodec::default();
        let schema = full_schema();
        let mut proposal = IndexMap::new();
        proposal.insert("destination".to_owned(), Value::Id(PublicKey::new([9; 32])));
        proposal.insert("amount".to_owned(), Value::I64(i64::MIN));

        let samples = [
            ("a", Value::U8(u8::MAX)),
            ("b", Value::U16(u16::MAX)),
            ("c", Value::U32(u32::MAX)),
            ("d", Value::U64(u64::MAX)),
            ("e", Value::I8(i8::MIN)),
            ("f", Value::I16(i16::MIN)),
            ("g", Value::I32(-123_456)),
            ("h", Value::I64(1_000_000_000_000)),
            ("flag", Value::Bool(true)),
            ("owner", Value::Id(PublicKey::new([0xAB; 32]))),
            ("name", Value::Chars("héllo".to_owned())),
            ("list", Value::Array(vec![Value::I32(-1), Value::I32(0), Value::I32(i32::MAX)])),
            ("proposal", Value::Struct(proposal)),
        ];
        let values: IndexMap<String, Value> =
            samples.into_iter().map(|(k, v)| (k.to_owned(), v)).collect();

        let payload = codec.encode_values(&values, &schema).unwrap();
        let decoded = codec.decode(payload.as_bytes(), &schema).unwrap();
        assert_eq!(decoded.fields, values);
        assert_eq!(decoded.byte_length, payload.size());
        assert_eq!(decoded.trailing_bytes, 0);
    }

    #[test]
    fn test_zero_filled_array_decodes_with_padding() {
        let codec = ParameterCodec::default().with_array_policy(ArrayPolicy::ZeroFill);
        let schema = [field("xs", TypeTag::Array { element: Box::new(TypeTag::U8), size: 3 })];
        let mut values = IndexMap::new();
        values.insert("xs".to_owned(), Value::Array(vec![Value::U8(4)]));
        let payload = codec.encode_values(&values, &schema).unwrap();
        let decoded = codec.decode(payload.as_bytes(), &schema).unwrap();
        assert_eq!(
            decoded.get("xs"),
            Some(&Value::Array(vec![Value::U8(4), Value::U8(0), Value::U8(0)]))
        );
    }

    #[test]
    fn test_short_buffer_reports_overrun() {
        let codec = ParameterCodec::default();
        let schema = [field("first", TypeTag::U32), field("second", TypeTag::U64)];
        let err = codec.decode(&[1, 0, 0, 0, 2, 0], &schema).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::CursorOverrun {
                field: "second".to_owned(),
                needed: 8,
                available: 2,
                offset: 4,
                total: 6,
            }
        );

        let nested = full_schema();
        let err = codec.decode(&[0u8; 80], &nested).unwrap_err();
        match err {
            ProtocolError::CursorOverrun { field, total, available, .. } => {
                assert_eq!(field, "list[2]");
                assert_eq!(available, 1);
                assert_eq!(total, 80);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_huge_declared_array_overruns_without_allocating() {
        let codec = ParameterCodec::default();
        let schema = [field(
            "orders",
            TypeTag::Array {
                element: Box::new(TypeTag::U64),
                size: 1 << 61,
            },
        )];
        let err = codec.decode(&[0u8; 4], &schema).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::CursorOverrun { field, needed: 8, available: 4, .. } if field == "orders[0]"
        ));
    }

    #[test]
    fn test_trailing_bytes_are_counted() {
        let codec = ParameterCodec::default();
        let decoded = codec.decode(&[5, 0, 1, 2, 3], &[field("v", TypeTag::U16)]).unwrap();
        assert_eq!(decoded.get("v"), Some(&Value::U16(5)));
        assert_eq!(decoded.trailing_bytes, 3);
        assert_eq!(decoded.raw_hex, "0500010203");
    }

    #[test]
    fn test_chars_trim_trailing_nul() {
        let codec = ParameterCodec::default();
        let decoded = codec.decode(b"QX\0\0", &[field("n", TypeTag::Chars(4))]).unwrap();
        assert_eq!(decoded.get("n"), Some(&Value::Chars("QX".to_owned())));
    }

    #[test]
    fn test_heuristic_rules() {
        let four = decode_heuristic(&(-2i32).to_le_bytes());
        assert_eq!(four.guess, Heuristic::Integer32 { unsigned: u32::MAX - 1, signed: -2 });

        let eight = decode_heuristic(&1_000_000_000_000u64.to_le_bytes());
        assert_eq!(
            eight.guess,
            Heuristic::Integer64 { unsigned: 1_000_000_000_000, signed: 1_000_000_000_000 }
        );

        let mut sixteen = 1u64.to_le_bytes().to_vec();
        sixteen.extend_from_slice(&u64::MAX.to_le_bytes());
        let sequence = decode_heuristic(&sixteen);
        assert_eq!(sequence.guess, Heuristic::U64Sequence(vec![1, u64::MAX]));
        assert_eq!(sequence.byte_length, 16);

        for len in [0usize, 1, 3, 5, 7, 9, 12, 17] {
            let fallback = decode_heuristic(&vec![0xEE; len]);
            assert_eq!(fallback.guess, Heuristic::Unrecognized, "length {}", len);
            assert_eq!(fallback.byte_length, len);
        }
    }

    #[test]
    fn test_decode_response_labels_fallback() {
        let codec = ParameterCodec::default();
        let bytes = 7u32.to_le_bytes();
        let schema = [field("v", TypeTag::U32)];

        assert!(codec.decode_response(&bytes, Some(&schema)).unwrap().is_typed());
        let fallback = codec.decode_response(&bytes, None).unwrap();
        assert!(!fallback.is_typed());
        assert!(!codec.decode_response(&bytes, Some(&[])).unwrap().is_typed());

        let view = codec.render(&fallback);
        assert_eq!(view["format"], "integer");
        assert_eq!(view["byteLength"], 4);
    }

    #[test]
    fn test_json_view() {
        let codec = ParameterCodec::new(Arc::new(StandardIdentityCodec), ArrayPolicy::ZeroFill);
        let key = PublicKey::new([1; 32]);
        let mut bytes = key.as_bytes().to_vec();
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());
        let schema = [field("who", TypeTag::Id), field("big", TypeTag::U64)];
        let result = codec.decode_response(&bytes, Some(&schema)).unwrap();
        let view = codec.render(&result);
        assert_eq!(view["fields"]["who"], StandardIdentityCodec.encode_identity(&key));
        assert_eq!(view["fields"]["big"], "18446744073709551615");
    }
}
