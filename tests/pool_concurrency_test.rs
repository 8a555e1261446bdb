#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rayon::prelude::*;
    use shardcollect::context::SearchContext;
    use shardcollect::facet::{FacetPools, PoolConfig, TermsFacetCollector, TermsFacetConfig};
    use shardcollect::field::{
        FieldMapping, MemoryFieldData, MemoryFieldDataCache, MemoryFieldResolver, ValueKind,
    };
    use shardcollect::segment::{MatchAllDocs, MemorySegment, SegmentOrd, ShardSearcher};

    fn context(pools: Arc<FacetPools>) -> SearchContext {
        let values: Vec<Option<i32>> = (0..500).map(|i| (i % 9 != 0).then_some(i % 25)).collect();
        let searcher = Arc::new(ShardSearcher::new(vec![Arc::new(MemorySegment::new(
            values.len() as u32,
        ))]));
        let cache = MemoryFieldDataCache::new().with_column(
            SegmentOrd::new(0),
            "bucket",
            MemoryFieldData::from_single("bucket", values).into_column(),
        );

        SearchContext::builder(searcher)
            .fields(Arc::new(
                MemoryFieldResolver::new()
                    .with_field("bucket", FieldMapping::new("bucket", ValueKind::Int)),
            ))
            .field_data(Arc::new(cache))
            .pools(pools)
            .build()
            .unwrap()
    }

    #[test]
    fn test_concurrent_queries_share_pool_without_leaking() {
        let pools = Arc::new(FacetPools::new(&PoolConfig { max_retained: 8 }));
        let ctx = context(Arc::clone(&pools));
        let config = TermsFacetConfig::new("bucket").with_size(100);

        let expected = ctx
            .searcher()
            .search(
                &MatchAllDocs,
                TermsFacetCollector::<i32>::new("buckets", &config, &ctx).unwrap(),
            )
            .unwrap();

        let results: Vec<_> = (0..64)
            .into_par_iter()
            .map(|_| {
                let collector = TermsFacetCollector::<i32>::new("buckets", &config, &ctx).unwrap();
                ctx.searcher().search(&MatchAllDocs, collector).unwrap()
            })
            .collect();

        for result in &results {
            assert_eq!(result, &expected);
        }

        let pool = pools.pool::<i32>();
        assert!(pool.idle() <= 8);
        // Tables stay on loan until dropped, so hold them all at once.
        let held: Vec<_> = (0..pool.idle()).map(|_| pool.acquire()).collect();
        assert!(held.iter().all(|table| table.is_empty()));
    }

    #[test]
    fn test_abandoned_pass_returns_table() {
        let pools = Arc::new(FacetPools::default());
        let ctx = context(Arc::clone(&pools));
        let config = TermsFacetConfig::new("bucket");

        let mut collector = TermsFacetCollector::<i32>::new("buckets", &config, &ctx).unwrap();
        {
            use shardcollect::collector::SegmentCollector;
            collector
                .set_next_segment(&ctx.searcher().segments()[0])
                .unwrap();
            for doc in 0..100 {
                collector.collect(doc).unwrap();
            }
        }
        // The caller gives up on the pass.
        drop(collector);

        let table = pools.pool::<i32>().acquire();
        assert!(table.is_empty());
        assert!(table.capacity() > 0);
    }
}
