use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{schema_width, Constants, FieldDescriptor, RawField, TypeRegistry};
use crate::error::{SchemaError, ValidationError};

// Procedure or function as written in a schema document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEntry {
    pub name: String,
    pub index: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<u64>,
    #[serde(default)]
    pub inputs: Vec<RawField>,
    #[serde(default)]
    pub outputs: Vec<RawField>,
}

// Contract description document, typically loaded from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDocument {
    pub name: String,
    pub contract_index: u32,
    #[serde(default)]
    pub constants: Constants,
    // Order matters: a type may only use the types declared before it
    #[serde(default)]
    pub types: IndexMap<String, Vec<RawField>>,
    #[serde(default)]
    pub procedures: Vec<RawEntry>,
    #[serde(default)]
    pub functions: Vec<RawEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    // Invoked through a transaction
    Procedure,
    // Invoked through a query
    Function,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Procedure => "procedure",
            Self::Function => "function",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContractEntry {
    pub name: String,
    pub kind: EntryKind,
    pub index: u16,
    // Amount the contract expects to be attached, if any
    pub fee: Option<u64>,
    pub inputs: Vec<FieldDescriptor>,
    // Empty when the document does not describe the response
    pub outputs: Vec<FieldDescriptor>,
}

impl ContractEntry {
    pub fn input_size(&self) -> usize {
        schema_width(&self.inputs)
    }

    pub fn output_size(&self) -> usize {
        schema_width(&self.outputs)
    }

    pub fn has_outputs(&self) -> bool {
        !self.outputs.is_empty()
    }
}

// Fully resolved contract schema
#[derive(Debug, Clone)]
pub struct ContractSchema {
    pub name: String,
    pub contract_index: u32,
    registry: TypeRegistry,
    procedures: Vec<ContractEntry>,
    functions: Vec<ContractEntry>,
}

impl ContractSchema {
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let document: ContractDocument =
            serde_json::from_str(json).map_err(|e| SchemaError::InvalidDocument(e.to_string()))?;
        Self::from_document(&document)
    }

    pub fn from_document(document: &ContractDocument) -> Result<Self, SchemaError> {
        let mut registry = TypeRegistry::new();
        for (name, fields) in &document.types {
            registry.register(name, fields, &document.constants)?;
        }

        let procedures = resolve_entries(
            &registry,
            &document.procedures,
            &document.constants,
            EntryKind::Procedure,
        )?;
        let functions = resolve_entries(
            &registry,
            &document.functions,
            &document.constants,
            EntryKind::Function,
        )?;

        Ok(Self {
            name: document.name.clone(),
            contract_index: document.contract_index,
            registry,
            procedures,
            functions,
        })
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn procedures(&self) -> &[ContractEntry] {
        &self.procedures
    }

    pub fn functions(&self) -> &[ContractEntry] {
        &self.functions
    }

    // Look up a procedure by name or by numeric index
    pub fn procedure(&self, name: &str) -> Result<&ContractEntry, ValidationError> {
        find_entry(&self.procedures, name, EntryKind::Procedure)
    }

    // Look up a function by name or by numeric index
    pub fn function(&self, name: &str) -> Result<&ContractEntry, ValidationError> {
        find_entry(&self.functions, name, EntryKind::Function)
    }
}

fn resolve_entries(
    registry: &TypeRegistry,
    entries: &[RawEntry],
    constants: &Constants,
    kind: EntryKind,
) -> Result<Vec<ContractEntry>, SchemaError> {
    let mut resolved: Vec<ContractEntry> = Vec::with_capacity(entries.len());
    for raw in entries {
        if resolved
            .iter()
            .any(|e| e.name == raw.name || e.index == raw.index)
        {
            return Err(SchemaError::Duplicate {
                kind: kind.as_str(),
                name: raw.name.clone(),
            });
        }

        resolved.push(ContractEntry {
            name: raw.name.clone(),
            kind,
            index: raw.index,
            fee: raw.fee,
            inputs: registry.resolve_fields(&raw.inputs, constants)?,
            outputs: registry.resolve_fields(&raw.outputs, constants)?,
        });
    }
    Ok(resolved)
}

fn find_entry<'a>(
    entries: &'a [ContractEntry],
    name: &str,
    kind: EntryKind,
) -> Result<&'a ContractEntry, ValidationError> {
    let by_index = name.parse::<u16>().ok();
    entries
        .iter()
        .find(|e| e.name == name || Some(e.index) == by_index)
        .ok_or_else(|| ValidationError::UnknownEntry {
            field: kind.as_str().to_owned(),
            kind: kind.as_str(),
            name: name.to_owned(),
        })
}
