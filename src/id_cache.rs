//! Document identity caches: segment-local document numbers to stable ids.

use std::fmt;
use std::fmt::Debug;
use std::sync::Arc;

use ahash::AHashMap;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::error::Result;
use crate::segment::{DocId, SegmentContext, SegmentOrd};

/// Stable external identifier of a document.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BytesWrap(Bytes);

impl BytesWrap {
    pub fn new(bytes: Bytes) -> Self {
        BytesWrap(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for BytesWrap {
    fn from(s: &str) -> Self {
        BytesWrap(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for BytesWrap {
    fn from(s: String) -> Self {
        BytesWrap(Bytes::from(s))
    }
}

impl From<Vec<u8>> for BytesWrap {
    fn from(v: Vec<u8>) -> Self {
        BytesWrap(Bytes::from(v))
    }
}

impl fmt::Debug for BytesWrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BytesWrap({})", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Display for BytesWrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// Identity lookups for one segment, scoped to one document type.
pub trait IdReaderTypeCache: Send + Sync + Debug {
    /// The id of the parent referenced by `doc`, for parents of this type.
    fn parent_id_by_doc(&self, doc: DocId) -> Option<BytesWrap>;

    /// The document of this type carrying `id`.
    fn doc_by_id(&self, id: &BytesWrap) -> Option<DocId>;
}

/// Source of per-segment identity caches.
pub trait IdCache: Send + Sync {
    fn type_cache(
        &self,
        segment: &SegmentContext,
        doc_type: &str,
    ) -> Result<Arc<dyn IdReaderTypeCache>>;
}

/// In-memory identity lookups for one segment and type.
#[derive(Debug, Clone, Default)]
pub struct MemoryIdTypeCache {
    docs_by_id: AHashMap<BytesWrap, DocId>,
    parent_ids: AHashMap<DocId, BytesWrap>,
}

impl MemoryIdTypeCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdReaderTypeCache for MemoryIdTypeCache {
    fn parent_id_by_doc(&self, doc: DocId) -> Option<BytesWrap> {
        self.parent_ids.get(&doc).cloned()
    }

    fn doc_by_id(&self, id: &BytesWrap) -> Option<DocId> {
        self.docs_by_id.get(id).copied()
    }
}

/// Identity caches registered per segment and type.
///
/// An unregistered segment/type pair resolves nothing.
#[derive(Debug, Default)]
pub struct MemoryIdCache {
    caches: RwLock<AHashMap<(SegmentOrd, String), MemoryIdTypeCache>>,
}

impl MemoryIdCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `doc` in segment `ord` as the document of `doc_type` with `id`.
    pub fn add_doc(&self, ord: SegmentOrd, doc_type: &str, doc: DocId, id: impl Into<BytesWrap>) {
        self.caches
            .write()
            .entry((ord, doc_type.to_string()))
            .or_default()
            .docs_by_id
            .insert(id.into(), doc);
    }

    /// Register that `doc` in segment `ord` references a `parent_type` parent.
    pub fn add_parent_ref(
        &self,
        ord: SegmentOrd,
        parent_type: &str,
        doc: DocId,
        parent_id: impl Into<BytesWrap>,
    ) {
        self.caches
            .write()
            .entry((ord, parent_type.to_string()))
            .or_default()
            .parent_ids
            .insert(doc, parent_id.into());
    }
}

impl IdCache for MemoryIdCache {
    fn type_cache(
        &self,
        segment: &SegmentContext,
        doc_type: &str,
    ) -> Result<Arc<dyn IdReaderTypeCache>> {
        let cache = self
            .caches
            .read()
            .get(&(segment.ord(), doc_type.to_string()))
            .cloned()
            .unwrap_or_default();
        Ok(Arc::new(cache))
    }
}
