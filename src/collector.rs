//! The segment-iterating collector contract.

use crate::error::Result;
use crate::segment::{DocId, SegmentContext};

/// A collector driven across the segments of a shard.
///
/// The driver calls [`set_next_segment`](SegmentCollector::set_next_segment)
/// once per segment, then [`collect`](SegmentCollector::collect) for every
/// matching document of that segment, and finally
/// [`finalize`](SegmentCollector::finalize) once all segments are exhausted.
/// Segments may be visited in any order, and documents within a segment may
/// arrive out of order; implementations only fold commutatively.
///
/// Any error returned from a callback aborts the pass. The collector is then
/// dropped without being finalized and no partial result is produced.
pub trait SegmentCollector {
    /// Shard-partial result produced by [`finalize`](SegmentCollector::finalize).
    type Fruit;

    /// Rebind segment-scoped state to `segment`.
    fn set_next_segment(&mut self, segment: &SegmentContext) -> Result<()>;

    /// Collect a matching document of the current segment.
    fn collect(&mut self, doc: DocId) -> Result<()>;

    /// Whether documents may be delivered out of increasing order.
    fn accepts_docs_out_of_order(&self) -> bool {
        true
    }

    /// Produce the shard-partial result and release scratch state.
    fn finalize(self) -> Result<Self::Fruit>;
}
