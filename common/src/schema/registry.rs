use indexmap::IndexMap;
use log::trace;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{FieldDescriptor, StructShape, TypeTag};
use crate::{config::MAX_PAYLOAD_SIZE, error::SchemaError};

// Name of the aggregate registered in every registry
pub const TRANSFER_PROPOSAL: &str = "TransferProposal";

// Size of a field as written in a schema document:
// either a literal or the name of a contract constant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SizeRef {
    Fixed(usize),
    Constant(String),
}

// Field description as found in schema documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeRef>,
}

impl RawField {
    pub fn new<N: Into<String>, T: Into<String>>(name: N, type_name: T) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            element_type: None,
            size: None,
        }
    }
}

// Contract constants referenced by sizes
pub type Constants = IndexMap<String, usize>;

fn primitive(type_name: &str) -> Option<TypeTag> {
    Some(match type_name {
        "uint8" | "u8" => TypeTag::U8,
        "uint16" | "u16" => TypeTag::U16,
        "uint32" | "u32" => TypeTag::U32,
        "uint64" | "u64" => TypeTag::U64,
        "sint8" | "int8" | "i8" => TypeTag::I8,
        "sint16" | "int16" | "i16" => TypeTag::I16,
        "sint32" | "int32" | "i32" => TypeTag::I32,
        "sint64" | "int64" | "i64" => TypeTag::I64,
        "bool" | "bit" => TypeTag::Bool,
        "id" => TypeTag::Id,
        _ => return None,
    })
}

fn is_chars(type_name: &str) -> bool {
    matches!(type_name, "chars" | "char_array" | "string")
}

fn is_array(type_name: &str) -> bool {
    matches!(type_name, "array" | "Array")
}

// Every field must fit in a single payload, whatever it is used for
fn check_width(field: &str, type_tag: &TypeTag) -> Result<(), SchemaError> {
    match type_tag.checked_width() {
        Some(width) if width <= MAX_PAYLOAD_SIZE => Ok(()),
        _ => Err(SchemaError::FieldTooLarge {
            field: field.to_owned(),
            max: MAX_PAYLOAD_SIZE,
        }),
    }
}

// Named aggregate shapes known while resolving a schema
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    shapes: IndexMap<String, Arc<StructShape>>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    // Registry with the built-in aggregates
    pub fn new() -> Self {
        let mut shapes = IndexMap::new();
        shapes.insert(
            TRANSFER_PROPOSAL.to_owned(),
            Arc::new(StructShape {
                name: TRANSFER_PROPOSAL.to_owned(),
                fields: vec![
                    FieldDescriptor::new("destination", TypeTag::Id),
                    FieldDescriptor::new("amount", TypeTag::I64),
                ],
            }),
        );
        Self { shapes }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<StructShape>> {
        self.shapes.get(name)
    }

    // Register a new shape, resolving its fields against the shapes already known
    // A shape can never reference itself or a later shape, so no cycle is possible
    pub fn register(
        &mut self,
        name: &str,
        fields: &[RawField],
        constants: &Constants,
    ) -> Result<Arc<StructShape>, SchemaError> {
        if self.shapes.contains_key(name) || primitive(name).is_some() {
            return Err(SchemaError::Duplicate {
                kind: "type",
                name: name.to_owned(),
            });
        }

        let fields = self.resolve_fields(fields, constants)?;
        let shape = Arc::new(StructShape {
            name: name.to_owned(),
            fields,
        });
        check_width(name, &TypeTag::Struct(Arc::clone(&shape)))?;
        if log::log_enabled!(log::Level::Trace) {
            trace!("registered type {} ({} bytes)", name, shape.width());
        }
        self.shapes.insert(name.to_owned(), Arc::clone(&shape));
        Ok(shape)
    }

    pub fn resolve_fields(
        &self,
        fields: &[RawField],
        constants: &Constants,
    ) -> Result<Vec<FieldDescriptor>, SchemaError> {
        let mut resolved: Vec<FieldDescriptor> = Vec::with_capacity(fields.len());
        for raw in fields {
            if resolved.iter().any(|f| f.name == raw.name) {
                return Err(SchemaError::Duplicate {
                    kind: "field",
                    name: raw.name.clone(),
                });
            }
            resolved.push(self.resolve_field(raw, constants)?);
        }
        Ok(resolved)
    }

    pub fn resolve_field(
        &self,
        raw: &RawField,
        constants: &Constants,
    ) -> Result<FieldDescriptor, SchemaError> {
        let type_tag = if is_chars(&raw.type_name) {
            TypeTag::Chars(self.resolve_size(raw, constants)?)
        } else if is_array(&raw.type_name) {
            let element_name = raw
                .element_type
                .as_deref()
                .ok_or_else(|| SchemaError::MissingElementType {
                    field: raw.name.clone(),
                })?;
            let element = self.resolve_named(&raw.name, element_name)?;
            TypeTag::Array {
                element: Box::new(element),
                size: self.resolve_size(raw, constants)?,
            }
        } else {
            self.resolve_named(&raw.name, &raw.type_name)?
        };

        check_width(&raw.name, &type_tag)?;
        Ok(FieldDescriptor::new(raw.name.clone(), type_tag))
    }

    // Primitive or registered aggregate
    fn resolve_named(&self, field: &str, type_name: &str) -> Result<TypeTag, SchemaError> {
        if let Some(tag) = primitive(type_name) {
            return Ok(tag);
        }

        self.shapes
            .get(type_name)
            .map(|shape| TypeTag::Struct(Arc::clone(shape)))
            .ok_or_else(|| SchemaError::UnknownType {
                field: field.to_owned(),
                type_name: type_name.to_owned(),
            })
    }

    fn resolve_size(&self, raw: &RawField, constants: &Constants) -> Result<usize, SchemaError> {
        let size = match &raw.size {
            Some(SizeRef::Fixed(size)) => *size,
            Some(SizeRef::Constant(name)) => {
                *constants
                    .get(name)
                    .ok_or_else(|| SchemaError::UnknownConstant {
                        field: raw.name.clone(),
                        name: name.clone(),
                    })?
            }
            None => {
                return Err(SchemaError::MissingSize {
                    field: raw.name.clone(),
                    type_name: raw.type_name.clone(),
                })
            }
        };

        if size == 0 {
            return Err(SchemaError::ZeroSize {
                field: raw.name.clone(),
            });
        }
        Ok(size)
    }
}
