//! Terms facets: per-shard value frequency aggregation.

pub mod bounded;
pub mod comparator;
pub mod config;
pub mod pool;
pub mod result;
pub mod terms;

pub use comparator::ComparatorType;
pub use config::TermsFacetConfig;
pub use pool::{FacetPools, PoolConfig, PooledTable, RecyclingPool};
pub use result::{InternalTermsFacet, TermEntry, TermsFacet};
pub use terms::{AnyTermsFacetCollector, SCRIPT_TERM_PARAM, TermsFacetCollector};
