//! Child-to-parent join resolution.
//!
//! [`ParentJoinCollector`] runs over the child documents matching a query
//! and marks, per segment, every parent document those children reference.
//! Parents are looked up by external id, so a child and its parent may live
//! in different segments.

use std::sync::Arc;

use ahash::AHashMap;
use bit_vec::BitVec;

use crate::collector::SegmentCollector;
use crate::context::SearchContext;
use crate::error::{Result, ShardCollectError};
use crate::id_cache::IdReaderTypeCache;
use crate::segment::{DocId, SegmentContext, SegmentOrd};

/// Parent documents referenced by at least one collected child, per segment.
///
/// Segments without any marked parent have no entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParentDocs {
    docs: AHashMap<SegmentOrd, BitVec>,
}

impl ParentDocs {
    pub fn get(&self, ord: SegmentOrd) -> Option<&BitVec> {
        self.docs.get(&ord)
    }

    /// Whether `doc` in segment `ord` was marked.
    pub fn contains(&self, ord: SegmentOrd, doc: DocId) -> bool {
        self.docs
            .get(&ord)
            .and_then(|bits| bits.get(doc as usize))
            .unwrap_or(false)
    }

    /// Number of segments with at least one marked parent.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Total number of marked parents across segments.
    pub fn cardinality(&self) -> usize {
        self.docs
            .values()
            .map(|bits| bits.iter().filter(|set| *set).count())
            .sum()
    }

    /// Marked parents as `(segment, doc)` pairs, in segment then doc order.
    pub fn iter(&self) -> impl Iterator<Item = (SegmentOrd, DocId)> + '_ {
        let mut ords: Vec<_> = self.docs.keys().copied().collect();
        ords.sort();
        ords.into_iter().flat_map(move |ord| {
            self.docs[&ord]
                .iter()
                .enumerate()
                .filter(|(_, set)| *set)
                .map(move |(doc, _)| (ord, doc as DocId))
        })
    }

    pub fn into_inner(self) -> AHashMap<SegmentOrd, BitVec> {
        self.docs
    }
}

/// One segment of the shard with its parent-type identity cache.
#[derive(Debug)]
struct ParentSegment {
    segment: SegmentContext,
    type_cache: Arc<dyn IdReaderTypeCache>,
}

/// Marks the parents referenced by collected child documents.
#[derive(Debug)]
pub struct ParentJoinCollector {
    parent_type: String,
    segments: Vec<ParentSegment>,
    current: Option<Arc<dyn IdReaderTypeCache>>,
    parent_docs: ParentDocs,
}

impl ParentJoinCollector {
    /// Build a collector resolving parents of `parent_type`.
    ///
    /// Identity caches for every segment are looked up here, so the
    /// per-document path does no cache lookups.
    pub fn new<S: Into<String>>(parent_type: S, ctx: &SearchContext) -> Result<Self> {
        let parent_type = parent_type.into();
        let segments = ctx
            .searcher()
            .segments()
            .iter()
            .map(|segment| {
                Ok(ParentSegment {
                    segment: segment.clone(),
                    type_cache: ctx.id_cache().type_cache(segment, &parent_type)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            parent_type = %parent_type,
            segments = segments.len(),
            "created parent join collector"
        );

        Ok(ParentJoinCollector {
            parent_type,
            segments,
            current: None,
            parent_docs: ParentDocs::default(),
        })
    }

    pub fn parent_type(&self) -> &str {
        &self.parent_type
    }

    /// Parents marked so far.
    pub fn parent_docs(&self) -> &ParentDocs {
        &self.parent_docs
    }
}

impl SegmentCollector for ParentJoinCollector {
    type Fruit = ParentDocs;

    fn set_next_segment(&mut self, segment: &SegmentContext) -> Result<()> {
        let bound = self.segments.get(segment.ord().as_usize()).ok_or_else(|| {
            ShardCollectError::invalid_operation(format!(
                "{} is not part of the searcher this join collector was built for",
                segment.ord()
            ))
        })?;
        self.current = Some(Arc::clone(&bound.type_cache));
        tracing::trace!(
            parent_type = %self.parent_type,
            segment = %segment.ord(),
            "bound join collector to segment"
        );
        Ok(())
    }

    fn collect(&mut self, doc: DocId) -> Result<()> {
        let current = self.current.as_ref().ok_or_else(|| {
            ShardCollectError::invalid_operation(
                "join collector collected a document before any segment",
            )
        })?;
        let Some(parent_id) = current.parent_id_by_doc(doc) else {
            return Ok(());
        };

        // A parent id resolves to at most one live document; the first
        // segment holding one wins.
        for parent in &self.segments {
            let Some(parent_doc) = parent.type_cache.doc_by_id(&parent_id) else {
                continue;
            };
            if parent.segment.is_deleted(parent_doc) {
                continue;
            }
            let max_doc = parent.segment.max_doc() as usize;
            let bits = self
                .parent_docs
                .docs
                .entry(parent.segment.ord())
                .or_insert_with(|| BitVec::from_elem(max_doc, false));
            if (parent_doc as usize) >= bits.len() {
                bits.grow(parent_doc as usize + 1 - bits.len(), false);
            }
            bits.set(parent_doc as usize, true);
            return Ok(());
        }
        Ok(())
    }

    fn finalize(self) -> Result<Self::Fruit> {
        tracing::debug!(
            parent_type = %self.parent_type,
            segments = self.parent_docs.len(),
            parents = self.parent_docs.cardinality(),
            "finalized parent join collector"
        );
        Ok(self.parent_docs)
    }
}
