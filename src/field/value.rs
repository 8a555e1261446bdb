//! Fixed-width value kinds that can be aggregated as terms.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Number;

use crate::facet::pool::{FacetPools, RecyclingPool};
use crate::field::data::{FieldData, FieldDataColumn};
use crate::field::mapping::ValueKind;

/// A value kind usable as a terms facet key.
pub trait TermValue:
    Copy + Eq + Ord + Hash + Debug + Send + Sync + Serialize + 'static
{
    const KIND: ValueKind;

    /// Coerce a script result to this kind.
    ///
    /// Fractions are truncated toward zero, then the integer is narrowed with
    /// two's-complement wrapping.
    fn from_number(number: &Number) -> Option<Self>;

    /// The value as a script parameter.
    fn to_json(self) -> serde_json::Value;

    fn from_column(column: &FieldDataColumn) -> Option<Arc<dyn FieldData<Self>>>;

    fn into_column(data: Arc<dyn FieldData<Self>>) -> FieldDataColumn;

    /// The pool of frequency tables keyed by this kind.
    fn pool(pools: &FacetPools) -> &Arc<RecyclingPool<Self>>;
}

macro_rules! impl_term_value {
    ($ty:ty, $wide:ty, $kind:ident, $pool:ident) => {
        impl TermValue for $ty {
            const KIND: ValueKind = ValueKind::$kind;

            fn from_number(number: &Number) -> Option<Self> {
                if let Some(i) = number.as_i64() {
                    Some(i as $ty)
                } else if let Some(u) = number.as_u64() {
                    Some(u as $ty)
                } else {
                    // Floats saturate into the widening type before narrowing.
                    number.as_f64().map(|f| f as $wide as $ty)
                }
            }

            fn to_json(self) -> serde_json::Value {
                serde_json::Value::from(self)
            }

            fn from_column(column: &FieldDataColumn) -> Option<Arc<dyn FieldData<Self>>> {
                match column {
                    FieldDataColumn::$kind(data) => Some(Arc::clone(data)),
                    _ => None,
                }
            }

            fn into_column(data: Arc<dyn FieldData<Self>>) -> FieldDataColumn {
                FieldDataColumn::$kind(data)
            }

            fn pool(pools: &FacetPools) -> &Arc<RecyclingPool<Self>> {
                &pools.$pool
            }
        }
    };
}

impl_term_value!(i8, i32, Byte, byte);
impl_term_value!(i16, i32, Short, short);
impl_term_value!(i32, i32, Int, int);
impl_term_value!(i64, i64, Long, long);
