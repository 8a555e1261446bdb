//! Terms facet collection over fixed-width numeric fields.
//!
//! A [`TermsFacetCollector`] counts how often each value of a field occurs
//! across the matching documents of a shard, optionally passing every value
//! through a script that can veto it or replace it. On finalize the table is
//! cut down to `size * number_of_shards` entries under the requested
//! ordering; over-fetching keeps a term that is locally outside the top
//! `size` but globally inside it from being lost in the cross-shard merge.

use std::sync::Arc;

use bit_vec::BitVec;
use serde_json::Value;

use crate::collector::SegmentCollector;
use crate::context::SearchContext;
use crate::error::{Result, ShardCollectError};
use crate::facet::bounded::BoundedOrderedSet;
use crate::facet::comparator::ComparatorType;
use crate::facet::config::TermsFacetConfig;
use crate::facet::pool::PooledTable;
use crate::facet::result::{InternalTermsFacet, TermEntry, TermsFacet};
use crate::field::{FieldData, FieldDataCache, TermValue, ValueInDocProc, ValueKind, ValueProc};
use crate::filter::{self, TypeFilter};
use crate::script::{ScriptParams, SearchScript};
use crate::segment::{DocId, SegmentContext, ShardSearcher};

/// Script parameter holding the value being counted.
pub const SCRIPT_TERM_PARAM: &str = "term";

/// Counts values into a pooled frequency table.
#[derive(Debug)]
struct StaticAggregator<T: TermValue> {
    facets: PooledTable<T>,
    missing: u64,
}

impl<T: TermValue> StaticAggregator<T> {
    fn count(&mut self, value: T) {
        *self.facets.entry(value).or_insert(0) += 1;
    }

    /// Make `value` present without counting it.
    fn seed(&mut self, value: T) {
        self.facets.entry(value).or_insert(0);
    }
}

/// Folds field values into the aggregate.
enum ValueProcessor<T: TermValue> {
    Static(StaticAggregator<T>),
    Scripted {
        aggregator: StaticAggregator<T>,
        script: Box<dyn SearchScript>,
        params: ScriptParams,
    },
}

impl<T: TermValue> ValueProcessor<T> {
    fn aggregator_mut(&mut self) -> &mut StaticAggregator<T> {
        match self {
            ValueProcessor::Static(aggregator) => aggregator,
            ValueProcessor::Scripted { aggregator, .. } => aggregator,
        }
    }

    fn into_aggregator(self) -> StaticAggregator<T> {
        match self {
            ValueProcessor::Static(aggregator) => aggregator,
            ValueProcessor::Scripted { aggregator, .. } => aggregator,
        }
    }

    fn script_mut(&mut self) -> Option<&mut Box<dyn SearchScript>> {
        match self {
            ValueProcessor::Static(_) => None,
            ValueProcessor::Scripted { script, .. } => Some(script),
        }
    }

    fn is_scripted(&self) -> bool {
        matches!(self, ValueProcessor::Scripted { .. })
    }
}

impl<T: TermValue> ValueInDocProc<T> for ValueProcessor<T> {
    fn on_value(&mut self, doc: DocId, value: T) -> Result<()> {
        match self {
            ValueProcessor::Static(aggregator) => aggregator.count(value),
            ValueProcessor::Scripted {
                aggregator,
                script,
                params,
            } => {
                match params.get_mut(SCRIPT_TERM_PARAM) {
                    Some(slot) => *slot = value.to_json(),
                    None => {
                        params.insert(SCRIPT_TERM_PARAM.to_string(), value.to_json());
                    }
                }

                let value = match script.execute(doc, params)? {
                    Value::Null | Value::Bool(false) => return Ok(()),
                    Value::Bool(true) => value,
                    Value::Number(number) => T::from_number(&number).ok_or_else(|| {
                        ShardCollectError::script(format!(
                            "script result [{number}] can't be converted to {}",
                            T::KIND
                        ))
                    })?,
                    other => {
                        return Err(ShardCollectError::script(format!(
                            "script returned [{other}], expected a number or boolean \
                             for a {} field",
                            T::KIND
                        )));
                    }
                };
                aggregator.count(value);
            }
        }
        Ok(())
    }

    fn on_missing(&mut self, _doc: DocId) {
        self.aggregator_mut().missing += 1;
    }
}

impl<T: TermValue> ValueProc<T> for ValueProcessor<T> {
    fn on_value(&mut self, value: T) -> Result<()> {
        self.aggregator_mut().seed(value);
        Ok(())
    }
}

/// Collects a terms facet over a field of kind `T`.
pub struct TermsFacetCollector<T: TermValue> {
    facet_name: String,
    index_field_name: String,
    comparator: ComparatorType,
    size: usize,
    number_of_shards: usize,
    filter: Option<TypeFilter>,
    searcher: Arc<ShardSearcher>,
    field_data_cache: Arc<dyn FieldDataCache>,
    field_data: Option<Arc<dyn FieldData<T>>>,
    doc_set: Option<Arc<BitVec>>,
    processor: ValueProcessor<T>,
}

impl<T: TermValue> TermsFacetCollector<T> {
    /// Build a collector, resolving the field and compiling the script.
    ///
    /// Fails before touching any segment if the field is unmapped or not of
    /// kind `T`. With `all_terms`, every distinct value of every segment is
    /// seeded into the table here, before collection starts.
    pub fn new<S: Into<String>>(
        facet_name: S,
        config: &TermsFacetConfig,
        ctx: &SearchContext,
    ) -> Result<Self> {
        let facet_name = facet_name.into();
        config.validate()?;

        let mapping = ctx
            .fields()
            .smart_name(&config.field)
            .ok_or_else(|| ShardCollectError::field_not_found(&config.field))?;
        if mapping.kind != T::KIND {
            return Err(ShardCollectError::kind_mismatch(
                &config.field,
                T::KIND,
                mapping.kind,
            ));
        }

        let filter = mapping.doc_type.as_deref().map(TypeFilter::new);

        let script = config
            .script
            .as_deref()
            .map(|source| ctx.scripts().compile(config.lang.as_deref(), source, &config.params))
            .transpose()?;

        let aggregator = StaticAggregator {
            facets: T::pool(ctx.pools()).acquire(),
            missing: 0,
        };
        let processor = match script {
            None => ValueProcessor::Static(aggregator),
            Some(script) => ValueProcessor::Scripted {
                aggregator,
                script,
                params: ScriptParams::new(),
            },
        };

        let mut collector = TermsFacetCollector {
            facet_name,
            index_field_name: mapping.index_name,
            comparator: config.order,
            size: config.size,
            number_of_shards: ctx.number_of_shards(),
            filter,
            searcher: Arc::clone(ctx.searcher()),
            field_data_cache: Arc::clone(ctx.field_data()),
            field_data: None,
            doc_set: None,
            processor,
        };

        if config.all_terms {
            collector
                .seed_all_terms()
                .map_err(|e| {
                    ShardCollectError::facet_phase(
                        &collector.facet_name,
                        "failed to load all terms",
                        e,
                    )
                })?;
        }

        tracing::debug!(
            facet = %collector.facet_name,
            field = %collector.index_field_name,
            kind = %T::KIND,
            cap = collector.max_entries(),
            scripted = collector.processor.is_scripted(),
            all_terms = config.all_terms,
            type_filter = ?collector.filter.as_ref().map(TypeFilter::doc_type),
            "created terms facet collector"
        );

        Ok(collector)
    }

    pub fn facet_name(&self) -> &str {
        &self.facet_name
    }

    /// The type filter pushed down from the field mapping, if any.
    pub fn filter(&self) -> Option<&TypeFilter> {
        self.filter.as_ref()
    }

    /// Upper bound on the entries of the shard result.
    pub fn max_entries(&self) -> usize {
        self.size.saturating_mul(self.number_of_shards)
    }

    fn load_field_data(&self, segment: &SegmentContext) -> Result<Arc<dyn FieldData<T>>> {
        self.field_data_cache
            .cache(T::KIND, segment, &self.index_field_name)?
            .typed::<T>()
    }

    fn seed_all_terms(&mut self) -> Result<()> {
        let searcher = Arc::clone(&self.searcher);
        for segment in searcher.segments() {
            let field_data = self.load_field_data(segment)?;
            field_data.for_each_value(&mut self.processor)?;
        }
        Ok(())
    }

    fn build_facet(self) -> InternalTermsFacet<T> {
        let cap = self.max_entries();
        let StaticAggregator { facets, missing } = self.processor.into_aggregator();

        if facets.is_empty() {
            drop(facets);
            return InternalTermsFacet::new(
                self.facet_name,
                self.comparator,
                self.size,
                Vec::new(),
                missing,
                0,
            );
        }

        let comparator = self.comparator;
        let mut ordered = BoundedOrderedSet::new(cap, |a: &TermEntry<T>, b: &TermEntry<T>| {
            comparator.compare(a, b)
        });
        let mut total = 0u64;
        for (&term, &count) in facets.iter() {
            total += count as u64;
            ordered.insert(TermEntry::new(term, count));
        }
        drop(facets);

        InternalTermsFacet::new(
            self.facet_name,
            self.comparator,
            self.size,
            ordered.into_vec(),
            missing,
            total,
        )
    }
}

impl<T: TermValue> SegmentCollector for TermsFacetCollector<T> {
    type Fruit = InternalTermsFacet<T>;

    fn set_next_segment(&mut self, segment: &SegmentContext) -> Result<()> {
        self.field_data = Some(self.load_field_data(segment)?);
        self.doc_set = self
            .filter
            .as_ref()
            .map(|filter| self.searcher.filter_cache().doc_set(filter, segment));
        if let Some(script) = self.processor.script_mut() {
            script.set_next_segment(segment)?;
        }
        tracing::trace!(
            facet = %self.facet_name,
            segment = %segment.ord(),
            "bound terms facet to segment"
        );
        Ok(())
    }

    fn collect(&mut self, doc: DocId) -> Result<()> {
        if let Some(doc_set) = &self.doc_set {
            if !filter::contains(doc_set, doc) {
                return Ok(());
            }
        }
        let field_data = self.field_data.as_ref().ok_or_else(|| {
            ShardCollectError::invalid_operation(format!(
                "terms facet [{}] collected a document before any segment",
                self.facet_name
            ))
        })?;
        field_data.for_each_value_in_doc(doc, &mut self.processor)
    }

    fn finalize(self) -> Result<Self::Fruit> {
        let facet = self.build_facet();
        tracing::debug!(
            facet = %facet.name(),
            entries = facet.entries().len(),
            missing = facet.missing(),
            total = facet.total(),
            "finalized terms facet"
        );
        Ok(facet)
    }
}

/// A terms facet collector whose value kind is picked from the field mapping.
pub enum AnyTermsFacetCollector {
    Byte(TermsFacetCollector<i8>),
    Short(TermsFacetCollector<i16>),
    Int(TermsFacetCollector<i32>),
    Long(TermsFacetCollector<i64>),
}

impl AnyTermsFacetCollector {
    pub fn new<S: Into<String>>(
        facet_name: S,
        config: &TermsFacetConfig,
        ctx: &SearchContext,
    ) -> Result<Self> {
        let mapping = ctx
            .fields()
            .smart_name(&config.field)
            .ok_or_else(|| ShardCollectError::field_not_found(&config.field))?;

        match mapping.kind {
            ValueKind::Byte => Ok(Self::Byte(TermsFacetCollector::new(facet_name, config, ctx)?)),
            ValueKind::Short => Ok(Self::Short(TermsFacetCollector::new(facet_name, config, ctx)?)),
            ValueKind::Int => Ok(Self::Int(TermsFacetCollector::new(facet_name, config, ctx)?)),
            ValueKind::Long => Ok(Self::Long(TermsFacetCollector::new(facet_name, config, ctx)?)),
            other => Err(ShardCollectError::invalid_argument(format!(
                "terms facet can't run on {other} field [{}]",
                config.field
            ))),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Byte(_) => ValueKind::Byte,
            Self::Short(_) => ValueKind::Short,
            Self::Int(_) => ValueKind::Int,
            Self::Long(_) => ValueKind::Long,
        }
    }
}

impl SegmentCollector for AnyTermsFacetCollector {
    type Fruit = TermsFacet;

    fn set_next_segment(&mut self, segment: &SegmentContext) -> Result<()> {
        match self {
            Self::Byte(c) => c.set_next_segment(segment),
            Self::Short(c) => c.set_next_segment(segment),
            Self::Int(c) => c.set_next_segment(segment),
            Self::Long(c) => c.set_next_segment(segment),
        }
    }

    fn collect(&mut self, doc: DocId) -> Result<()> {
        match self {
            Self::Byte(c) => c.collect(doc),
            Self::Short(c) => c.collect(doc),
            Self::Int(c) => c.collect(doc),
            Self::Long(c) => c.collect(doc),
        }
    }

    fn finalize(self) -> Result<Self::Fruit> {
        Ok(match self {
            Self::Byte(c) => TermsFacet::Byte(c.finalize()?),
            Self::Short(c) => TermsFacet::Short(c.finalize()?),
            Self::Int(c) => TermsFacet::Int(c.finalize()?),
            Self::Long(c) => TermsFacet::Long(c.finalize()?),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::facet::pool::FacetPools;
    use crate::field::{FieldMapping, MemoryFieldData, MemoryFieldDataCache, MemoryFieldResolver};
    use crate::script::{FnScript, NativeScriptService};
    use crate::segment::{MatchAllDocs, MemorySegment, SegmentDocs, SegmentOrd};

    /// A native script factory evaluating `f` on the script parameters.
    fn native(
        f: fn(&ScriptParams) -> Value,
    ) -> impl Fn(&ScriptParams) -> Result<Box<dyn SearchScript>> + Send + Sync {
        move |_: &ScriptParams| -> Result<Box<dyn SearchScript>> {
            Ok(FnScript::boxed(
                move |_seg: &SegmentContext, _doc: DocId, params: &ScriptParams| -> Result<Value> {
                    Ok(f(params))
                },
            ))
        }
    }

    fn short_context(values: Vec<Vec<Option<i16>>>, pools: Arc<FacetPools>) -> SearchContext {
        let segments = values
            .iter()
            .map(|v| {
                Arc::new(MemorySegment::new(v.len() as DocId))
                    as Arc<dyn crate::segment::SegmentReader>
            })
            .collect();
        let searcher = Arc::new(ShardSearcher::new(segments));

        let cache = MemoryFieldDataCache::new();
        for (i, v) in values.into_iter().enumerate() {
            cache.insert(
                SegmentOrd::new(i as u32),
                "rating",
                MemoryFieldData::from_single("rating", v).into_column(),
            );
        }

        let scripts = NativeScriptService::new()
            .register(
                "double",
                native(|params| json!(params[SCRIPT_TERM_PARAM].as_i64().unwrap_or(0) * 2)),
            )
            .register(
                "skip_twenty",
                native(|params| json!(params[SCRIPT_TERM_PARAM] != json!(20))),
            )
            .register("null", native(|_| Value::Null))
            .register("text", native(|_| json!("ten")));

        SearchContext::builder(searcher)
            .number_of_shards(2)
            .fields(Arc::new(
                MemoryFieldResolver::new()
                    .with_field("rating", FieldMapping::new("rating", ValueKind::Short))
                    .with_field("title", FieldMapping::new("title", ValueKind::String)),
            ))
            .field_data(Arc::new(cache))
            .scripts(Arc::new(scripts))
            .pools(pools)
            .build()
            .unwrap()
    }

    fn run(ctx: &SearchContext, config: TermsFacetConfig) -> Result<InternalTermsFacet<i16>> {
        let collector = TermsFacetCollector::<i16>::new("ratings", &config, ctx)?;
        ctx.searcher().search(&MatchAllDocs, collector)
    }

    fn counts(facet: &InternalTermsFacet<i16>) -> Vec<(i16, u32)> {
        facet.entries().iter().map(|e| (e.term, e.count)).collect()
    }

    #[test]
    fn test_static_counting_and_missing() {
        let ctx = short_context(
            vec![vec![Some(3), Some(1), None, Some(3)], vec![Some(1), None, Some(3)]],
            Arc::new(FacetPools::default()),
        );

        let facet = run(&ctx, TermsFacetConfig::new("rating")).unwrap();
        assert_eq!(counts(&facet), vec![(3, 3), (1, 2)]);
        assert_eq!(facet.missing(), 2);
        assert_eq!(facet.total(), 5);
    }

    #[test]
    fn test_scripted_veto_and_transform() {
        let ctx = short_context(
            vec![vec![Some(10), Some(20), Some(30)]],
            Arc::new(FacetPools::default()),
        );

        let vetoed = run(
            &ctx,
            TermsFacetConfig::new("rating")
                .with_script("skip_twenty")
                .with_order(ComparatorType::Term),
        )
        .unwrap();
        assert_eq!(counts(&vetoed), vec![(10, 1), (30, 1)]);

        let doubled = run(
            &ctx,
            TermsFacetConfig::new("rating")
                .with_script("double")
                .with_order(ComparatorType::Term),
        )
        .unwrap();
        assert_eq!(counts(&doubled), vec![(20, 1), (40, 1), (60, 1)]);

        let nulled = run(&ctx, TermsFacetConfig::new("rating").with_script("null")).unwrap();
        assert!(nulled.entries().is_empty());
        assert_eq!(nulled.missing(), 0);
    }

    #[test]
    fn test_script_non_numeric_result_aborts() {
        let ctx = short_context(vec![vec![Some(10)]], Arc::new(FacetPools::default()));
        let err = run(&ctx, TermsFacetConfig::new("rating").with_script("text")).unwrap_err();
        assert!(matches!(err, ShardCollectError::Script(_)));
    }

    #[test]
    fn test_all_terms_seeds_zero_counts() {
        let ctx = short_context(
            vec![vec![Some(1), Some(2), Some(3)]],
            Arc::new(FacetPools::default()),
        );
        let collector = TermsFacetCollector::<i16>::new(
            "ratings",
            &TermsFacetConfig::new("rating")
                .with_all_terms(true)
                .with_order(ComparatorType::Term),
            &ctx,
        )
        .unwrap();

        let facet = ctx.searcher().search(&SegmentDocs::new(), collector).unwrap();
        assert_eq!(counts(&facet), vec![(1, 0), (2, 0), (3, 0)]);
        assert_eq!(facet.missing(), 0);
    }

    #[test]
    fn test_result_is_bounded_by_size_times_shards() {
        let values = (0..50).map(|v| Some(v as i16)).collect();
        let ctx = short_context(vec![values], Arc::new(FacetPools::default()));

        let facet = run(&ctx, TermsFacetConfig::new("rating").with_size(3)).unwrap();
        assert_eq!(facet.entries().len(), 6);
        assert_eq!(facet.top().len(), 3);
        assert_eq!(facet.other(), 44);
    }

    #[test]
    fn test_fail_fast_on_bad_field() {
        let ctx = short_context(vec![vec![Some(1)]], Arc::new(FacetPools::default()));

        let err = TermsFacetCollector::<i16>::new("f", &TermsFacetConfig::new("nope"), &ctx)
            .err()
            .unwrap();
        assert!(matches!(err, ShardCollectError::FieldNotFound { .. }));

        let err = TermsFacetCollector::<i64>::new("f", &TermsFacetConfig::new("rating"), &ctx)
            .err()
            .unwrap();
        match err {
            ShardCollectError::FieldKindMismatch {
                field,
                expected,
                actual,
            } => {
                assert_eq!(field, "rating");
                assert_eq!(expected, ValueKind::Long);
                assert_eq!(actual, ValueKind::Short);
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = AnyTermsFacetCollector::new("f", &TermsFacetConfig::new("title"), &ctx)
            .err()
            .unwrap();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_table_returns_to_pool() {
        let pools = Arc::new(FacetPools::default());
        let ctx = short_context(vec![vec![Some(1), Some(2)]], Arc::clone(&pools));

        run(&ctx, TermsFacetConfig::new("rating")).unwrap();
        assert_eq!(pools.pool::<i16>().idle(), 1);

        // An abandoned collector hands its table back too.
        let collector =
            TermsFacetCollector::<i16>::new("ratings", &TermsFacetConfig::new("rating"), &ctx)
                .unwrap();
        assert_eq!(pools.pool::<i16>().idle(), 0);
        drop(collector);
        assert_eq!(pools.pool::<i16>().idle(), 1);
    }

    #[test]
    fn test_collect_before_segment_is_rejected() {
        let ctx = short_context(vec![vec![Some(1)]], Arc::new(FacetPools::default()));
        let mut collector =
            TermsFacetCollector::<i16>::new("ratings", &TermsFacetConfig::new("rating"), &ctx)
                .unwrap();
        let err = collector.collect(0).unwrap_err();
        assert!(matches!(err, ShardCollectError::InvalidOperation(_)));
    }

    #[test]
    fn test_any_collector_dispatches_on_kind() {
        let ctx = short_context(vec![vec![Some(4), Some(4)]], Arc::new(FacetPools::default()));
        let collector =
            AnyTermsFacetCollector::new("ratings", &TermsFacetConfig::new("rating"), &ctx)
                .unwrap();
        assert_eq!(collector.kind(), ValueKind::Short);

        let facet = ctx.searcher().search(&MatchAllDocs, collector).unwrap();
        assert_eq!(facet.kind(), ValueKind::Short);
        assert_eq!(facet.entries_i64(), vec![TermEntry::new(4i64, 2)]);
    }
}
