//! Field mappings, typed values, and per-segment field data.

pub mod data;
pub mod mapping;
pub mod value;

pub use data::{
    FieldData, FieldDataCache, FieldDataColumn, MemoryFieldData, MemoryFieldDataCache,
    ValueInDocProc, ValueProc,
};
pub use mapping::{FieldMapping, FieldResolver, MemoryFieldResolver, ValueKind};
pub use value::TermValue;
