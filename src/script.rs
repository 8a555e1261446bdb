//! Script contract used to veto or transform facet values.
//!
//! Scripts are compiled once per collector by a [`ScriptService`] and then
//! evaluated per document. A script must be bound to the current segment
//! with [`SearchScript::set_next_segment`] before it is executed against any
//! of that segment's documents.

use std::sync::Arc;

use ahash::AHashMap;
use serde_json::Value;

use crate::error::{Result, ShardCollectError};
use crate::segment::{DocId, SegmentContext};

/// Language name of scripts registered with [`NativeScriptService`].
pub const NATIVE_LANG: &str = "native";

/// Named script parameters.
pub type ScriptParams = serde_json::Map<String, Value>;

/// A compiled script evaluated per document.
pub trait SearchScript: Send {
    /// Bind the script's `doc` view to `segment`.
    fn set_next_segment(&mut self, segment: &SegmentContext) -> Result<()>;

    /// Evaluate for `doc` of the bound segment.
    fn execute(&mut self, doc: DocId, params: &ScriptParams) -> Result<Value>;
}

/// Compiles script sources.
pub trait ScriptService: Send + Sync {
    fn compile(
        &self,
        lang: Option<&str>,
        source: &str,
        params: &ScriptParams,
    ) -> Result<Box<dyn SearchScript>>;
}

/// Builds instances of one native script.
pub trait NativeScriptFactory: Send + Sync {
    fn new_script(&self, params: &ScriptParams) -> Result<Box<dyn SearchScript>>;
}

impl<F> NativeScriptFactory for F
where
    F: Fn(&ScriptParams) -> Result<Box<dyn SearchScript>> + Send + Sync,
{
    fn new_script(&self, params: &ScriptParams) -> Result<Box<dyn SearchScript>> {
        self(params)
    }
}

/// Script service whose sources name registered Rust scripts.
#[derive(Default, Clone)]
pub struct NativeScriptService {
    factories: AHashMap<String, Arc<dyn NativeScriptFactory>>,
}

impl NativeScriptService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S, F>(mut self, name: S, factory: F) -> Self
    where
        S: Into<String>,
        F: NativeScriptFactory + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }
}

impl std::fmt::Debug for NativeScriptService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("NativeScriptService")
            .field("scripts", &names)
            .finish()
    }
}

impl ScriptService for NativeScriptService {
    fn compile(
        &self,
        lang: Option<&str>,
        source: &str,
        params: &ScriptParams,
    ) -> Result<Box<dyn SearchScript>> {
        if let Some(lang) = lang {
            if lang != NATIVE_LANG {
                return Err(ShardCollectError::invalid_argument(format!(
                    "script lang [{lang}] is not supported"
                )));
            }
        }
        let factory = self.factories.get(source).ok_or_else(|| {
            ShardCollectError::invalid_argument(format!("native script [{source}] not found"))
        })?;
        factory.new_script(params)
    }
}

/// Adapts a closure into a [`SearchScript`].
///
/// Executing before any segment is bound is an error.
pub struct FnScript<F> {
    segment: Option<SegmentContext>,
    f: F,
}

impl<F> FnScript<F>
where
    F: FnMut(&SegmentContext, DocId, &ScriptParams) -> Result<Value> + Send,
{
    pub fn new(f: F) -> Self {
        FnScript { segment: None, f }
    }

    pub fn boxed(f: F) -> Box<dyn SearchScript>
    where
        F: 'static,
    {
        Box::new(Self::new(f))
    }
}

impl<F> SearchScript for FnScript<F>
where
    F: FnMut(&SegmentContext, DocId, &ScriptParams) -> Result<Value> + Send,
{
    fn set_next_segment(&mut self, segment: &SegmentContext) -> Result<()> {
        self.segment = Some(segment.clone());
        Ok(())
    }

    fn execute(&mut self, doc: DocId, params: &ScriptParams) -> Result<Value> {
        let segment = self.segment.as_ref().ok_or_else(|| {
            ShardCollectError::script("script executed before a segment was bound")
        })?;
        (self.f)(segment, doc, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{MemorySegment, ShardSearcher};
    use serde_json::json;

    fn doubling(_params: &ScriptParams) -> Result<Box<dyn SearchScript>> {
        Ok(FnScript::boxed(
            |_segment: &SegmentContext, _doc: DocId, params: &ScriptParams| -> Result<Value> {
                let term = params.get("term").and_then(Value::as_i64).unwrap_or(0);
                Ok(json!(term * 2))
            },
        ))
    }

    #[test]
    fn test_native_service_compiles_registered_script() {
        let service = NativeScriptService::new().register("double", doubling);
        let searcher = ShardSearcher::new(vec![Arc::new(MemorySegment::new(1))]);

        let mut script = service.compile(Some("native"), "double", &ScriptParams::new()).unwrap();
        script.set_next_segment(&searcher.segments()[0]).unwrap();

        let mut params = ScriptParams::new();
        params.insert("term".to_string(), json!(21));
        assert_eq!(script.execute(0, &params).unwrap(), json!(42));
    }

    #[test]
    fn test_native_service_rejects_unknown_scripts() {
        let service = NativeScriptService::new().register("double", doubling);

        let err = service.compile(None, "triple", &ScriptParams::new()).err().unwrap();
        assert!(err.is_configuration_error());

        let err = service.compile(Some("mvel"), "double", &ScriptParams::new()).err().unwrap();
        assert!(err.to_string().contains("mvel"));
    }

    #[test]
    fn test_fn_script_requires_bound_segment() {
        let mut script = FnScript::new(
            |_segment: &SegmentContext, doc: DocId, _params: &ScriptParams| -> Result<Value> {
                Ok(json!(doc))
            },
        );
        assert!(script.execute(0, &ScriptParams::new()).is_err());
    }
}
