//! Per-segment field data with push-based iteration.

use std::fmt::Debug;
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::error::{Result, ShardCollectError};
use crate::field::mapping::ValueKind;
use crate::field::value::TermValue;
use crate::segment::{DocId, SegmentContext, SegmentOrd};

/// Receives the values of one document.
pub trait ValueInDocProc<T> {
    fn on_value(&mut self, doc: DocId, value: T) -> Result<()>;

    /// Called once when the document has no value.
    fn on_missing(&mut self, doc: DocId);
}

/// Receives each distinct value of a column.
pub trait ValueProc<T> {
    fn on_value(&mut self, value: T) -> Result<()>;
}

/// A typed, segment-scoped column of field values.
pub trait FieldData<T>: Send + Sync + Debug {
    fn field_name(&self) -> &str;

    /// Whether any document holds more than one value.
    fn multi_valued(&self) -> bool;

    fn has_value(&self, doc: DocId) -> bool;

    /// Push every value of `doc` to `proc`, or report it missing.
    fn for_each_value_in_doc(&self, doc: DocId, proc: &mut dyn ValueInDocProc<T>) -> Result<()>;

    /// Push every distinct value in the column to `proc`, in ascending order.
    fn for_each_value(&self, proc: &mut dyn ValueProc<T>) -> Result<()>;
}

/// Field data of any supported kind.
#[derive(Debug, Clone)]
pub enum FieldDataColumn {
    Byte(Arc<dyn FieldData<i8>>),
    Short(Arc<dyn FieldData<i16>>),
    Int(Arc<dyn FieldData<i32>>),
    Long(Arc<dyn FieldData<i64>>),
}

impl FieldDataColumn {
    pub fn kind(&self) -> ValueKind {
        match self {
            FieldDataColumn::Byte(_) => ValueKind::Byte,
            FieldDataColumn::Short(_) => ValueKind::Short,
            FieldDataColumn::Int(_) => ValueKind::Int,
            FieldDataColumn::Long(_) => ValueKind::Long,
        }
    }

    /// A column with no values for any document.
    pub fn empty(kind: ValueKind, field: &str, max_doc: DocId) -> Result<Self> {
        match kind {
            ValueKind::Byte => Ok(MemoryFieldData::<i8>::empty(field, max_doc).into_column()),
            ValueKind::Short => Ok(MemoryFieldData::<i16>::empty(field, max_doc).into_column()),
            ValueKind::Int => Ok(MemoryFieldData::<i32>::empty(field, max_doc).into_column()),
            ValueKind::Long => Ok(MemoryFieldData::<i64>::empty(field, max_doc).into_column()),
            other => Err(ShardCollectError::field_data(format!(
                "no field data support for {other} field [{field}]"
            ))),
        }
    }

    /// Downcast to the column of `T`, failing on a kind mismatch.
    pub fn typed<T: TermValue>(&self) -> Result<Arc<dyn FieldData<T>>> {
        T::from_column(self).ok_or_else(|| {
            ShardCollectError::field_data(format!(
                "expected {} field data, got {}",
                T::KIND,
                self.kind()
            ))
        })
    }
}

/// Loads field data for a segment.
pub trait FieldDataCache: Send + Sync {
    fn cache(
        &self,
        kind: ValueKind,
        segment: &SegmentContext,
        field: &str,
    ) -> Result<FieldDataColumn>;
}

/// Field data held in memory, one value list per document.
#[derive(Debug, Clone)]
pub struct MemoryFieldData<T> {
    field: String,
    values: Vec<Vec<T>>,
    distinct: Vec<T>,
}

impl<T: TermValue> MemoryFieldData<T> {
    /// Build a column from per-document values, indexed by document number.
    pub fn from_docs<S: Into<String>>(field: S, values: Vec<Vec<T>>) -> Self {
        let mut distinct: Vec<T> = values.iter().flatten().copied().collect();
        distinct.sort_unstable();
        distinct.dedup();
        MemoryFieldData {
            field: field.into(),
            values,
            distinct,
        }
    }

    /// Build a single-valued column; `None` marks a missing value.
    pub fn from_single<S: Into<String>>(field: S, values: Vec<Option<T>>) -> Self {
        let values = values.into_iter().map(|v| v.into_iter().collect()).collect();
        Self::from_docs(field, values)
    }

    pub fn empty(field: &str, max_doc: DocId) -> Self {
        Self::from_docs(field, vec![Vec::new(); max_doc as usize])
    }

    pub fn into_column(self) -> FieldDataColumn {
        T::into_column(Arc::new(self))
    }
}

impl<T: TermValue> FieldData<T> for MemoryFieldData<T> {
    fn field_name(&self) -> &str {
        &self.field
    }

    fn multi_valued(&self) -> bool {
        self.values.iter().any(|v| v.len() > 1)
    }

    fn has_value(&self, doc: DocId) -> bool {
        self.values
            .get(doc as usize)
            .is_some_and(|v| !v.is_empty())
    }

    fn for_each_value_in_doc(&self, doc: DocId, proc: &mut dyn ValueInDocProc<T>) -> Result<()> {
        match self.values.get(doc as usize) {
            Some(values) if !values.is_empty() => {
                for &value in values {
                    proc.on_value(doc, value)?;
                }
            }
            _ => proc.on_missing(doc),
        }
        Ok(())
    }

    fn for_each_value(&self, proc: &mut dyn ValueProc<T>) -> Result<()> {
        for &value in &self.distinct {
            proc.on_value(value)?;
        }
        Ok(())
    }
}

/// Field data registered per segment and field.
///
/// A field never registered for a segment loads as an empty column.
#[derive(Debug, Default)]
pub struct MemoryFieldDataCache {
    columns: RwLock<AHashMap<(SegmentOrd, String), FieldDataColumn>>,
}

impl MemoryFieldDataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<S: Into<String>>(&self, ord: SegmentOrd, field: S, column: FieldDataColumn) {
        self.columns.write().insert((ord, field.into()), column);
    }

    pub fn with_column<S: Into<String>>(
        self,
        ord: SegmentOrd,
        field: S,
        column: FieldDataColumn,
    ) -> Self {
        self.insert(ord, field, column);
        self
    }
}

impl FieldDataCache for MemoryFieldDataCache {
    fn cache(
        &self,
        kind: ValueKind,
        segment: &SegmentContext,
        field: &str,
    ) -> Result<FieldDataColumn> {
        let key = (segment.ord(), field.to_string());
        match self.columns.read().get(&key) {
            Some(column) if column.kind() == kind => Ok(column.clone()),
            Some(column) => Err(ShardCollectError::field_data(format!(
                "field [{field}] in {} holds {} data, requested {kind}",
                segment.ord(),
                column.kind()
            ))),
            None => FieldDataColumn::empty(kind, field, segment.max_doc()),
        }
    }
}
