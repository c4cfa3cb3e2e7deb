//! Field schemas describing the byte layout of contract inputs and outputs.
//!
//! Type names are only looked at once, when a schema document is loaded:
//! from there on every field carries a closed [`TypeTag`] and the codec
//! dispatches with an exhaustive match.

mod contract;
mod registry;

pub use contract::*;
pub use registry::*;

use std::{fmt, sync::Arc};

use crate::config::PUBLIC_KEY_SIZE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeTag {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    // Stored as a single byte
    Bool,
    // 60-letter identity, stored as its 32-byte public key
    Id,
    // UTF-8 text left-aligned in `size` bytes, zero padded
    Chars(usize),
    // Bounded array of `size` elements
    Array { element: Box<TypeTag>, size: usize },
    // Named aggregate, fields in declaration order
    Struct(Arc<StructShape>),
}

impl TypeTag {
    // Number of bytes this type occupies on the wire
    // Saturates for hand built types too large to exist on the wire
    pub fn width(&self) -> usize {
        self.checked_width().unwrap_or(usize::MAX)
    }

    // None if the width does not fit in a usize
    pub fn checked_width(&self) -> Option<usize> {
        Some(match self {
            Self::U8 | Self::I8 | Self::Bool => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 => 4,
            Self::U64 | Self::I64 => 8,
            Self::Id => PUBLIC_KEY_SIZE,
            Self::Chars(size) => *size,
            Self::Array { element, size } => element.checked_width()?.checked_mul(*size)?,
            Self::Struct(shape) => checked_schema_width(&shape.fields)?,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::U8 => "uint8",
            Self::U16 => "uint16",
            Self::U32 => "uint32",
            Self::U64 => "uint64",
            Self::I8 => "sint8",
            Self::I16 => "sint16",
            Self::I32 => "sint32",
            Self::I64 => "sint64",
            Self::Bool => "bool",
            Self::Id => "id",
            Self::Chars(_) => "chars",
            Self::Array { .. } => "array",
            Self::Struct(_) => "struct",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chars(size) => write!(f, "chars[{}]", size),
            Self::Array { element, size } => write!(f, "array<{}>[{}]", element, size),
            Self::Struct(shape) => f.write_str(&shape.name),
            other => f.write_str(other.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub type_tag: TypeTag,
}

impl FieldDescriptor {
    pub fn new<S: Into<String>>(name: S, type_tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            type_tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructShape {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl StructShape {
    pub fn width(&self) -> usize {
        schema_width(&self.fields)
    }
}

// Total number of bytes an ordered schema occupies
pub fn schema_width(fields: &[FieldDescriptor]) -> usize {
    checked_schema_width(fields).unwrap_or(usize::MAX)
}

pub fn checked_schema_width(fields: &[FieldDescriptor]) -> Option<usize> {
    fields
        .iter()
        .try_fold(0usize, |total, f| total.checked_add(f.type_tag.checked_width()?))
}
