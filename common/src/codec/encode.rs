use indexmap::IndexMap;
use log::debug;
use serde_json::{Map, Value as JsonValue};
use std::borrow::Cow;

use super::{ArrayPolicy, ParameterCodec, Payload, Value};
use crate::{
    config::MAX_PAYLOAD_SIZE,
    error::ValidationError,
    schema::{schema_width, FieldDescriptor, TypeTag},
    serializer::Writer,
};

fn unexpected(field: &str, expected: &'static str) -> ValidationError {
    ValidationError::UnexpectedShape {
        field: field.to_owned(),
        expected,
    }
}

fn is_unsigned(type_tag: &TypeTag) -> bool {
    matches!(
        type_tag,
        TypeTag::U8 | TypeTag::U16 | TypeTag::U32 | TypeTag::U64
    )
}

// Narrow an integer to the declared width
fn checked<T: TryFrom<i128>>(
    field: &str,
    type_tag: &TypeTag,
    raw: i128,
) -> Result<T, ValidationError> {
    if raw < 0 && is_unsigned(type_tag) {
        return Err(ValidationError::NegativeUnsigned {
            field: field.to_owned(),
            value: raw.to_string(),
        });
    }

    T::try_from(raw).map_err(|_| ValidationError::OutOfRange {
        field: field.to_owned(),
        value: raw.to_string(),
        type_name: type_tag.name(),
    })
}

// Integers are accepted as decimal strings (exact for every 64-bit value)
// or as JSON numbers
fn parse_integer(field: &str, input: &JsonValue) -> Result<i128, ValidationError> {
    let invalid = |value: String| ValidationError::InvalidInteger {
        field: field.to_owned(),
        value,
    };

    match input {
        JsonValue::String(text) => text.trim().parse::<i128>().map_err(|_| invalid(text.clone())),
        JsonValue::Number(number) => number
            .as_i64()
            .map(i128::from)
            .or_else(|| number.as_u64().map(i128::from))
            .ok_or_else(|| invalid(number.to_string())),
        _ => Err(unexpected(field, "integer")),
    }
}

fn parse_bool(field: &str, input: &JsonValue) -> Result<bool, ValidationError> {
    let invalid = |value: String| ValidationError::InvalidBoolean {
        field: field.to_owned(),
        value,
    };

    match input {
        JsonValue::Bool(value) => Ok(*value),
        JsonValue::Number(number) => match number.as_u64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(invalid(number.to_string())),
        },
        JsonValue::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(invalid(text.clone())),
        },
        _ => Err(unexpected(field, "boolean")),
    }
}

// Arrays and aggregates may arrive as JSON text from form inputs
fn json_container<'a>(
    field: &str,
    input: &'a JsonValue,
) -> Result<Cow<'a, JsonValue>, ValidationError> {
    match input {
        JsonValue::String(text) => serde_json::from_str(text)
            .map(Cow::Owned)
            .map_err(|e| ValidationError::InvalidJson {
                field: field.to_owned(),
                reason: e.to_string(),
            }),
        other => Ok(Cow::Borrowed(other)),
    }
}

fn present<'a>(field: &str, input: Option<&'a JsonValue>) -> Result<&'a JsonValue, ValidationError> {
    input
        .filter(|v| !v.is_null())
        .ok_or_else(|| ValidationError::MissingField {
            field: field.to_owned(),
        })
}

impl ParameterCodec {
    // Encode named values from a JSON object in schema order
    pub fn encode(
        &self,
        values: &Map<String, JsonValue>,
        schema: &[FieldDescriptor],
    ) -> Result<Payload, ValidationError> {
        let mut typed = IndexMap::with_capacity(schema.len());
        for field in schema {
            let input = present(&field.name, values.get(&field.name))?;
            typed.insert(
                field.name.clone(),
                self.parse_value(&field.name, &field.type_tag, input)?,
            );
        }
        self.encode_values(&typed, schema)
    }

    // Encode already typed values in schema order
    pub fn encode_values(
        &self,
        values: &IndexMap<String, Value>,
        schema: &[FieldDescriptor],
    ) -> Result<Payload, ValidationError> {
        let width = schema_width(schema);
        if width > MAX_PAYLOAD_SIZE {
            return Err(ValidationError::PayloadTooLarge {
                field: "payload".to_owned(),
                size: width,
                max: MAX_PAYLOAD_SIZE,
            });
        }
        let mut bytes = Vec::with_capacity(width);
        let mut writer = Writer::new(&mut bytes);
        for field in schema {
            let value = values
                .get(&field.name)
                .ok_or_else(|| ValidationError::MissingField {
                    field: field.name.clone(),
                })?;
            self.write_value(&field.name, &field.type_tag, value, &mut writer)?;
        }

        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "encoded {} fields into {} bytes",
                schema.len(),
                writer.total_write()
            );
        }
        Ok(Payload::new(bytes))
    }

    // Turn one input into a typed value, validating it against its type
    pub fn parse_value(
        &self,
        field: &str,
        type_tag: &TypeTag,
        input: &JsonValue,
    ) -> Result<Value, ValidationError> {
        Ok(match type_tag {
            TypeTag::U8 => Value::U8(checked(field, type_tag, parse_integer(field, input)?)?),
            TypeTag::U16 => Value::U16(checked(field, type_tag, parse_integer(field, input)?)?),
            TypeTag::U32 => Value::U32(checked(field, type_tag, parse_integer(field, input)?)?),
            TypeTag::U64 => Value::U64(checked(field, type_tag, parse_integer(field, input)?)?),
            TypeTag::I8 => Value::I8(checked(field, type_tag, parse_integer(field, input)?)?),
            TypeTag::I16 => Value::I16(checked(field, type_tag, parse_integer(field, input)?)?),
            TypeTag::I32 => Value::I32(checked(field, type_tag, parse_integer(field, input)?)?),
            TypeTag::I64 => Value::I64(checked(field, type_tag, parse_integer(field, input)?)?),
            TypeTag::Bool => Value::Bool(parse_bool(field, input)?),
            TypeTag::Id => {
                let text = input.as_str().ok_or_else(|| unexpected(field, "identity"))?;
                let key = self.identity.decode_identity(text).map_err(|e| {
                    ValidationError::MalformedIdentity {
                        field: field.to_owned(),
                        reason: e.to_string(),
                    }
                })?;
                Value::Id(key)
            }
            TypeTag::Chars(_) => {
                let text = input.as_str().ok_or_else(|| unexpected(field, "text"))?;
                Value::Chars(text.to_owned())
            }
            TypeTag::Array { element, .. } => {
                let container = json_container(field, input)?;
                let items = container
                    .as_array()
                    .ok_or_else(|| unexpected(field, "array"))?;
                let values = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.parse_value(&format!("{}[{}]", field, i), element, item))
                    .collect::<Result<Vec<_>, _>>()?;
                Value::Array(values)
            }
            TypeTag::Struct(shape) => {
                let container = json_container(field, input)?;
                let object = container
                    .as_object()
                    .ok_or_else(|| unexpected(field, "object"))?;
                let mut fields = IndexMap::with_capacity(shape.fields.len());
                for sub in &shape.fields {
                    let path = format!("{}.{}", field, sub.name);
                    let sub_input = present(&path, object.get(&sub.name))?;
                    fields.insert(sub.name.clone(), self.parse_value(&path, &sub.type_tag, sub_input)?);
                }
                Value::Struct(fields)
            }
        })
    }

    fn write_value(
        &self,
        field: &str,
        type_tag: &TypeTag,
        value: &Value,
        writer: &mut Writer,
    ) -> Result<(), ValidationError> {
        let integer = || {
            value
                .as_i128()
                .ok_or_else(|| unexpected(field, type_tag.name()))
        };

        match type_tag {
            TypeTag::U8 => writer.write_u8(checked(field, type_tag, integer()?)?),
            TypeTag::U16 => writer.write_u16(checked(field, type_tag, integer()?)?),
            TypeTag::U32 => writer.write_u32(checked(field, type_tag, integer()?)?),
            TypeTag::U64 => writer.write_u64(checked(field, type_tag, integer()?)?),
            TypeTag::I8 => writer.write_i8(checked(field, type_tag, integer()?)?),
            TypeTag::I16 => writer.write_i16(checked(field, type_tag, integer()?)?),
            TypeTag::I32 => writer.write_i32(checked(field, type_tag, integer()?)?),
            TypeTag::I64 => writer.write_i64(checked(field, type_tag, integer()?)?),
            TypeTag::Bool => match value {
                Value::Bool(v) => writer.write_bool(*v),
                _ => return Err(unexpected(field, "boolean")),
            },
            TypeTag::Id => match value {
                Value::Id(key) => writer.write_bytes(key.as_bytes()),
                _ => return Err(unexpected(field, "identity")),
            },
            TypeTag::Chars(size) => {
                let Value::Chars(text) = value else {
                    return Err(unexpected(field, "text"));
                };
                let bytes = text.as_bytes();
                if bytes.len() > *size {
                    return Err(ValidationError::TextTooLong {
                        field: field.to_owned(),
                        len: bytes.len(),
                        max: *size,
                    });
                }
                writer.write_bytes(bytes);
                writer.write_zeroes(size - bytes.len());
            }
            TypeTag::Array { element, size } => {
                let Value::Array(items) = value else {
                    return Err(unexpected(field, "array"));
                };
                if items.len() > *size {
                    return Err(ValidationError::ArrayTooLong {
                        field: field.to_owned(),
                        len: items.len(),
                        max: *size,
                    });
                }
                if self.array_policy == ArrayPolicy::Strict && items.len() != *size {
                    return Err(ValidationError::ArrayLengthMismatch {
                        field: field.to_owned(),
                        len: items.len(),
                        expected: *size,
                    });
                }

                for (i, item) in items.iter().enumerate() {
                    self.write_value(&format!("{}[{}]", field, i), element, item, writer)?;
                }
                // Every zero value is encoded as zero bytes
                if self.array_policy == ArrayPolicy::ZeroFill {
                    writer.write_zeroes(element.width() * (size - items.len()));
                }
            }
            TypeTag::Struct(shape) => {
                let Value::Struct(fields) = value else {
                    return Err(unexpected(field, "object"));
                };
                for sub in &shape.fields {
                    let path = format!("{}.{}", field, sub.name);
                    let sub_value = fields
                        .get(&sub.name)
                        .ok_or_else(|| ValidationError::MissingField { field: path.clone() })?;
                    self.write_value(&path, &sub.type_tag, sub_value, writer)?;
                }
            }
        }
        Ok(())
    }
}
