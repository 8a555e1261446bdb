//! Shard-partial terms facet results.

use serde::Serialize;

use crate::facet::comparator::ComparatorType;
use crate::field::ValueKind;

/// A term and the number of times it was counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TermEntry<T> {
    pub term: T,
    pub count: u32,
}

impl<T> TermEntry<T> {
    pub fn new(term: T, count: u32) -> Self {
        TermEntry { term, count }
    }
}

/// The terms facet computed on one shard.
///
/// `entries` holds up to `requested_size * number_of_shards` entries, sorted
/// by `comparator`, so the coordinating node can merge shards without losing
/// terms that rank lower locally than globally.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InternalTermsFacet<T> {
    name: String,
    comparator: ComparatorType,
    requested_size: usize,
    entries: Vec<TermEntry<T>>,
    missing: u64,
    total: u64,
}

impl<T> InternalTermsFacet<T> {
    pub(crate) fn new(
        name: String,
        comparator: ComparatorType,
        requested_size: usize,
        entries: Vec<TermEntry<T>>,
        missing: u64,
        total: u64,
    ) -> Self {
        InternalTermsFacet {
            name,
            comparator,
            requested_size,
            entries,
            missing,
            total,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comparator(&self) -> ComparatorType {
        self.comparator
    }

    pub fn requested_size(&self) -> usize {
        self.requested_size
    }

    /// All retained entries, over-fetched for the cross-shard merge.
    pub fn entries(&self) -> &[TermEntry<T>] {
        &self.entries
    }

    /// The first `requested_size` entries.
    pub fn top(&self) -> &[TermEntry<T>] {
        &self.entries[..self.entries.len().min(self.requested_size)]
    }

    /// Documents that had no value for the field.
    pub fn missing(&self) -> u64 {
        self.missing
    }

    /// Sum of counts over every term seen, retained or not.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Sum of counts over terms that did not make it into `entries`.
    pub fn other(&self) -> u64 {
        let retained: u64 = self.entries.iter().map(|e| e.count as u64).sum();
        self.total.saturating_sub(retained)
    }
}

/// A terms facet of any supported value kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "value_kind", rename_all = "lowercase")]
pub enum TermsFacet {
    Byte(InternalTermsFacet<i8>),
    Short(InternalTermsFacet<i16>),
    Int(InternalTermsFacet<i32>),
    Long(InternalTermsFacet<i64>),
}

impl TermsFacet {
    pub fn kind(&self) -> ValueKind {
        match self {
            TermsFacet::Byte(_) => ValueKind::Byte,
            TermsFacet::Short(_) => ValueKind::Short,
            TermsFacet::Int(_) => ValueKind::Int,
            TermsFacet::Long(_) => ValueKind::Long,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TermsFacet::Byte(f) => f.name(),
            TermsFacet::Short(f) => f.name(),
            TermsFacet::Int(f) => f.name(),
            TermsFacet::Long(f) => f.name(),
        }
    }

    pub fn missing(&self) -> u64 {
        match self {
            TermsFacet::Byte(f) => f.missing(),
            TermsFacet::Short(f) => f.missing(),
            TermsFacet::Int(f) => f.missing(),
            TermsFacet::Long(f) => f.missing(),
        }
    }

    /// Entries widened to `i64` terms.
    pub fn entries_i64(&self) -> Vec<TermEntry<i64>> {
        fn widen<T: Copy + Into<i64>>(entries: &[TermEntry<T>]) -> Vec<TermEntry<i64>> {
            entries
                .iter()
                .map(|e| TermEntry::new(e.term.into(), e.count))
                .collect()
        }

        match self {
            TermsFacet::Byte(f) => widen(f.entries()),
            TermsFacet::Short(f) => widen(f.entries()),
            TermsFacet::Int(f) => widen(f.entries()),
            TermsFacet::Long(f) => widen(f.entries()),
        }
    }
}
