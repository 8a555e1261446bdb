//! # Shardcollect
//!
//! Shard-local collection and aggregation for a distributed search engine.
//!
//! ## Features
//!
//! - Segment-iterating collectors driven by a [`segment::ShardSearcher`]
//! - Parent/child join resolution across segments by external id
//! - Terms facets over numeric fields with script veto and transform
//! - Over-fetched, bounded, ordered shard results for cross-shard merging
//! - Pooled frequency tables shared by concurrent queries

pub mod collector;
pub mod context;
pub mod error;
pub mod facet;
pub mod field;
pub mod filter;
pub mod id_cache;
pub mod join;
pub mod script;
pub mod segment;

pub mod prelude {
    pub use crate::collector::SegmentCollector;
    pub use crate::context::SearchContext;
    pub use crate::error::{Result, ShardCollectError};
    pub use crate::facet::{
        AnyTermsFacetCollector, ComparatorType, FacetPools, TermsFacet, TermsFacetCollector,
        TermsFacetConfig,
    };
    pub use crate::join::{ParentDocs, ParentJoinCollector};
    pub use crate::segment::{DocId, SegmentOrd, ShardSearcher};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
