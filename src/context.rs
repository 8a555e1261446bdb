//! The collaborators a collector is built against.

use std::sync::Arc;

use crate::error::{Result, ShardCollectError};
use crate::facet::pool::FacetPools;
use crate::field::{FieldDataCache, FieldResolver, MemoryFieldDataCache, MemoryFieldResolver};
use crate::id_cache::{IdCache, MemoryIdCache};
use crate::script::{NativeScriptService, ScriptService};
use crate::segment::ShardSearcher;

/// Per-shard execution context shared by the collectors of one query.
#[derive(Clone)]
pub struct SearchContext {
    searcher: Arc<ShardSearcher>,
    number_of_shards: usize,
    fields: Arc<dyn FieldResolver>,
    field_data: Arc<dyn FieldDataCache>,
    id_cache: Arc<dyn IdCache>,
    scripts: Arc<dyn ScriptService>,
    pools: Arc<FacetPools>,
}

impl SearchContext {
    pub fn builder(searcher: Arc<ShardSearcher>) -> SearchContextBuilder {
        SearchContextBuilder::new(searcher)
    }

    pub fn searcher(&self) -> &Arc<ShardSearcher> {
        &self.searcher
    }

    /// Number of shards the query fans out to.
    pub fn number_of_shards(&self) -> usize {
        self.number_of_shards
    }

    pub fn fields(&self) -> &dyn FieldResolver {
        self.fields.as_ref()
    }

    pub fn field_data(&self) -> &Arc<dyn FieldDataCache> {
        &self.field_data
    }

    pub fn id_cache(&self) -> &dyn IdCache {
        self.id_cache.as_ref()
    }

    pub fn scripts(&self) -> &dyn ScriptService {
        self.scripts.as_ref()
    }

    pub fn pools(&self) -> &FacetPools {
        &self.pools
    }
}

impl std::fmt::Debug for SearchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchContext")
            .field("segments", &self.searcher.segments().len())
            .field("number_of_shards", &self.number_of_shards)
            .finish_non_exhaustive()
    }
}

/// Builder for [`SearchContext`]. Collaborators left unset default to empty
/// in-memory implementations.
pub struct SearchContextBuilder {
    searcher: Arc<ShardSearcher>,
    number_of_shards: usize,
    fields: Option<Arc<dyn FieldResolver>>,
    field_data: Option<Arc<dyn FieldDataCache>>,
    id_cache: Option<Arc<dyn IdCache>>,
    scripts: Option<Arc<dyn ScriptService>>,
    pools: Option<Arc<FacetPools>>,
}

impl SearchContextBuilder {
    fn new(searcher: Arc<ShardSearcher>) -> Self {
        SearchContextBuilder {
            searcher,
            number_of_shards: 1,
            fields: None,
            field_data: None,
            id_cache: None,
            scripts: None,
            pools: None,
        }
    }

    pub fn number_of_shards(mut self, number_of_shards: usize) -> Self {
        self.number_of_shards = number_of_shards;
        self
    }

    pub fn fields(mut self, fields: Arc<dyn FieldResolver>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn field_data(mut self, field_data: Arc<dyn FieldDataCache>) -> Self {
        self.field_data = Some(field_data);
        self
    }

    pub fn id_cache(mut self, id_cache: Arc<dyn IdCache>) -> Self {
        self.id_cache = Some(id_cache);
        self
    }

    pub fn scripts(mut self, scripts: Arc<dyn ScriptService>) -> Self {
        self.scripts = Some(scripts);
        self
    }

    /// Share table pools with other contexts on the same shard.
    pub fn pools(mut self, pools: Arc<FacetPools>) -> Self {
        self.pools = Some(pools);
        self
    }

    pub fn build(self) -> Result<SearchContext> {
        if self.number_of_shards == 0 {
            return Err(ShardCollectError::invalid_argument(
                "number_of_shards must be positive",
            ));
        }

        Ok(SearchContext {
            searcher: self.searcher,
            number_of_shards: self.number_of_shards,
            fields: self
                .fields
                .unwrap_or_else(|| Arc::new(MemoryFieldResolver::new())),
            field_data: self
                .field_data
                .unwrap_or_else(|| Arc::new(MemoryFieldDataCache::new())),
            id_cache: self
                .id_cache
                .unwrap_or_else(|| Arc::new(MemoryIdCache::new())),
            scripts: self
                .scripts
                .unwrap_or_else(|| Arc::new(NativeScriptService::new())),
            pools: self.pools.unwrap_or_default(),
        })
    }
}
