//! Document type filters and their per-segment doc set cache.

use std::sync::Arc;

use ahash::AHashMap;
use bit_vec::BitVec;
use parking_lot::RwLock;

use crate::segment::{DocId, SegmentContext, SegmentOrd};

/// Restricts collection to documents of one declared type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeFilter {
    doc_type: String,
}

impl TypeFilter {
    pub fn new<S: Into<String>>(doc_type: S) -> Self {
        TypeFilter {
            doc_type: doc_type.into(),
        }
    }

    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    /// Compute the set of documents of this type in `segment`.
    pub fn doc_set(&self, segment: &SegmentContext) -> BitVec {
        let max_doc = segment.max_doc();
        let mut bits = BitVec::from_elem(max_doc as usize, false);
        for doc in 0..max_doc {
            if segment.reader().doc_type(doc) == Some(self.doc_type.as_str()) {
                bits.set(doc as usize, true);
            }
        }
        bits
    }
}

/// Caches type filter doc sets for the segments of one searcher.
///
/// Keys are segment ordinals, so a cache must never outlive the
/// [`ShardSearcher`](crate::segment::ShardSearcher) that owns it.
#[derive(Debug, Default)]
pub struct FilterCache {
    doc_sets: RwLock<AHashMap<(SegmentOrd, String), Arc<BitVec>>>,
}

impl FilterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the doc set of `filter` for `segment`, computing it on first use.
    pub fn doc_set(&self, filter: &TypeFilter, segment: &SegmentContext) -> Arc<BitVec> {
        let key = (segment.ord(), filter.doc_type().to_string());
        if let Some(bits) = self.doc_sets.read().get(&key) {
            return Arc::clone(bits);
        }

        let bits = Arc::new(filter.doc_set(segment));
        self.doc_sets
            .write()
            .entry(key)
            .or_insert_with(|| Arc::clone(&bits))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.doc_sets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Membership test for a cached doc set.
pub(crate) fn contains(bits: &BitVec, doc: DocId) -> bool {
    bits.get(doc as usize).unwrap_or(false)
}
