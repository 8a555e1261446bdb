//! Segments of a shard and the per-pass segment arena.
//!
//! A [`ShardSearcher`] is a point-in-time view over the shard's segments. It
//! assigns each segment a small [`SegmentOrd`] that every segment-scoped
//! cache in this crate is keyed by, so nothing depends on reader identity.

use std::fmt::Debug;
use std::sync::Arc;

use ahash::AHashMap;
use bit_vec::BitVec;

use crate::collector::SegmentCollector;
use crate::error::Result;
use crate::filter::FilterCache;

/// Segment-local document number.
pub type DocId = u32;

/// Index of a segment within one [`ShardSearcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentOrd(u32);

impl SegmentOrd {
    /// Create an ordinal from a raw index.
    pub fn new(ord: u32) -> Self {
        SegmentOrd(ord)
    }

    /// The raw index of this segment.
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for SegmentOrd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "segment#{}", self.0)
    }
}

/// Read access to one immutable segment.
pub trait SegmentReader: Send + Sync + Debug {
    /// One past the largest document number in this segment.
    fn max_doc(&self) -> DocId;

    /// Whether the document has been deleted.
    fn is_deleted(&self, doc: DocId) -> bool;

    /// The declared document type of `doc`, if known.
    fn doc_type(&self, doc: DocId) -> Option<&str>;
}

/// An in-memory segment.
#[derive(Debug, Clone)]
pub struct MemorySegment {
    deleted: BitVec,
    types: Vec<Option<String>>,
}

impl MemorySegment {
    /// Create a segment of `max_doc` untyped, live documents.
    pub fn new(max_doc: DocId) -> Self {
        MemorySegment {
            deleted: BitVec::from_elem(max_doc as usize, false),
            types: vec![None; max_doc as usize],
        }
    }

    /// Create a segment whose documents all have the given type.
    pub fn with_type(max_doc: DocId, doc_type: &str) -> Self {
        MemorySegment {
            deleted: BitVec::from_elem(max_doc as usize, false),
            types: vec![Some(doc_type.to_string()); max_doc as usize],
        }
    }

    /// Set the type of one document.
    pub fn set_doc_type(&mut self, doc: DocId, doc_type: &str) {
        if let Some(slot) = self.types.get_mut(doc as usize) {
            *slot = Some(doc_type.to_string());
        }
    }

    /// Mark a document as deleted. Out-of-range documents are ignored.
    pub fn delete(&mut self, doc: DocId) {
        if (doc as usize) < self.deleted.len() {
            self.deleted.set(doc as usize, true);
        }
    }
}

impl SegmentReader for MemorySegment {
    fn max_doc(&self) -> DocId {
        self.types.len() as DocId
    }

    fn is_deleted(&self, doc: DocId) -> bool {
        self.deleted.get(doc as usize).unwrap_or(false)
    }

    fn doc_type(&self, doc: DocId) -> Option<&str> {
        self.types.get(doc as usize).and_then(|t| t.as_deref())
    }
}

/// A segment as seen by one collection pass.
#[derive(Debug, Clone)]
pub struct SegmentContext {
    ord: SegmentOrd,
    doc_base: DocId,
    reader: Arc<dyn SegmentReader>,
}

impl SegmentContext {
    pub fn ord(&self) -> SegmentOrd {
        self.ord
    }

    /// Shard-wide number of the first document in this segment.
    pub fn doc_base(&self) -> DocId {
        self.doc_base
    }

    pub fn reader(&self) -> &Arc<dyn SegmentReader> {
        &self.reader
    }

    pub fn max_doc(&self) -> DocId {
        self.reader.max_doc()
    }

    pub fn is_deleted(&self, doc: DocId) -> bool {
        self.reader.is_deleted(doc)
    }
}

/// Supplies the matching documents of a query, segment by segment.
pub trait DocMatcher {
    fn matching_docs(&self, segment: &SegmentContext) -> Result<Vec<DocId>>;
}

/// Matches every document of every segment.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchAllDocs;

impl DocMatcher for MatchAllDocs {
    fn matching_docs(&self, segment: &SegmentContext) -> Result<Vec<DocId>> {
        Ok((0..segment.max_doc()).collect())
    }
}

/// Matches an explicit list of documents per segment, in the given order.
#[derive(Debug, Clone, Default)]
pub struct SegmentDocs {
    docs: AHashMap<SegmentOrd, Vec<DocId>>,
}

impl SegmentDocs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add matching documents for a segment.
    pub fn with_docs(mut self, ord: SegmentOrd, docs: impl IntoIterator<Item = DocId>) -> Self {
        self.docs.entry(ord).or_default().extend(docs);
        self
    }
}

impl DocMatcher for SegmentDocs {
    fn matching_docs(&self, segment: &SegmentContext) -> Result<Vec<DocId>> {
        Ok(self.docs.get(&segment.ord()).cloned().unwrap_or_default())
    }
}

/// Point-in-time view over the segments of a shard.
#[derive(Debug)]
pub struct ShardSearcher {
    segments: Vec<SegmentContext>,
    filter_cache: FilterCache,
}

impl ShardSearcher {
    /// Create a searcher, numbering segments in the order given.
    pub fn new(readers: Vec<Arc<dyn SegmentReader>>) -> Self {
        let mut doc_base: DocId = 0;
        let segments = readers
            .into_iter()
            .enumerate()
            .map(|(i, reader)| {
                let ctx = SegmentContext {
                    ord: SegmentOrd(i as u32),
                    doc_base,
                    reader,
                };
                doc_base = doc_base.saturating_add(ctx.max_doc());
                ctx
            })
            .collect();

        ShardSearcher {
            segments,
            filter_cache: FilterCache::new(),
        }
    }

    pub fn segments(&self) -> &[SegmentContext] {
        &self.segments
    }

    pub fn segment(&self, ord: SegmentOrd) -> Option<&SegmentContext> {
        self.segments.get(ord.as_usize())
    }

    pub fn filter_cache(&self) -> &FilterCache {
        &self.filter_cache
    }

    /// Total number of documents, deleted ones included.
    pub fn max_doc(&self) -> u64 {
        self.segments.iter().map(|s| s.max_doc() as u64).sum()
    }

    /// Drive `collector` over every segment and return its result.
    ///
    /// Deleted documents are never handed to the collector.
    pub fn search<C: SegmentCollector>(
        &self,
        matcher: &dyn DocMatcher,
        mut collector: C,
    ) -> Result<C::Fruit> {
        for segment in &self.segments {
            collector.set_next_segment(segment)?;
            for doc in matcher.matching_docs(segment)? {
                if segment.is_deleted(doc) {
                    continue;
                }
                collector.collect(doc)?;
            }
        }
        collector.finalize()
    }
}
