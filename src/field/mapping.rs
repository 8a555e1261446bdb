//! Field mapping resolution.

use std::fmt;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// The declared kind of values a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
}

impl ValueKind {
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Byte => "byte",
            ValueKind::Short => "short",
            ValueKind::Int => "int",
            ValueKind::Long => "long",
            ValueKind::Float => "float",
            ValueKind::Double => "double",
            ValueKind::String => "string",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a field name resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Name of the field in the index.
    pub index_name: String,
    /// Declared value kind.
    pub kind: ValueKind,
    /// The document type owning the field, when known precisely.
    pub doc_type: Option<String>,
}

impl FieldMapping {
    pub fn new<S: Into<String>>(index_name: S, kind: ValueKind) -> Self {
        FieldMapping {
            index_name: index_name.into(),
            kind,
            doc_type: None,
        }
    }

    pub fn with_doc_type<S: Into<String>>(mut self, doc_type: S) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }
}

/// Resolves user-facing field names to mappings.
pub trait FieldResolver: Send + Sync {
    /// Resolve `name`, which may be a plain field name or `type.field`.
    fn smart_name(&self, name: &str) -> Option<FieldMapping>;
}

/// A fixed set of mappings.
#[derive(Debug, Clone, Default)]
pub struct MemoryFieldResolver {
    fields: AHashMap<String, FieldMapping>,
}

impl MemoryFieldResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field<S: Into<String>>(mut self, name: S, mapping: FieldMapping) -> Self {
        self.fields.insert(name.into(), mapping);
        self
    }
}

impl FieldResolver for MemoryFieldResolver {
    fn smart_name(&self, name: &str) -> Option<FieldMapping> {
        if let Some(mapping) = self.fields.get(name) {
            return Some(mapping.clone());
        }

        // `type.field` pins the owning type.
        let (doc_type, field) = name.split_once('.')?;
        let mapping = self.fields.get(field)?;
        match &mapping.doc_type {
            Some(owner) if owner != doc_type => None,
            _ => Some(mapping.clone().with_doc_type(doc_type)),
        }
    }
}
