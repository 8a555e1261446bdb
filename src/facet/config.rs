//! Terms facet request configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShardCollectError};
use crate::facet::comparator::ComparatorType;
use crate::script::ScriptParams;

/// Configuration of one terms facet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TermsFacetConfig {
    /// Field to aggregate, optionally as `type.field`.
    pub field: String,

    /// Number of entries the caller wants back after the cross-shard merge.
    #[serde(default = "default_size")]
    pub size: usize,

    /// Ranking of entries.
    #[serde(default)]
    pub order: ComparatorType,

    /// Seed every distinct value of the field, not only matched ones.
    #[serde(default)]
    pub all_terms: bool,

    /// Script applied to each value before it is counted.
    #[serde(default)]
    pub script: Option<String>,

    /// Script language; the script service default when absent.
    #[serde(default)]
    pub lang: Option<String>,

    /// Parameters handed to the script at compile time.
    #[serde(default)]
    pub params: ScriptParams,
}

fn default_size() -> usize {
    10
}

impl TermsFacetConfig {
    pub fn new<S: Into<String>>(field: S) -> Self {
        TermsFacetConfig {
            field: field.into(),
            size: default_size(),
            order: ComparatorType::default(),
            all_terms: false,
            script: None,
            lang: None,
            params: ScriptParams::new(),
        }
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn with_order(mut self, order: ComparatorType) -> Self {
        self.order = order;
        self
    }

    pub fn with_all_terms(mut self, all_terms: bool) -> Self {
        self.all_terms = all_terms;
        self
    }

    pub fn with_script<S: Into<String>>(mut self, script: S) -> Self {
        self.script = Some(script.into());
        self
    }

    pub fn with_lang<S: Into<String>>(mut self, lang: S) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_param<S: Into<String>>(mut self, name: S, value: serde_json::Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Parse and validate a JSON facet body.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TermsFacetConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.field.trim().is_empty() {
            return Err(ShardCollectError::invalid_argument(
                "terms facet requires a field",
            ));
        }
        if self.size == 0 {
            return Err(ShardCollectError::invalid_argument(format!(
                "terms facet on [{}] requires a positive size",
                self.field
            )));
        }
        if self.script.is_none() && (self.lang.is_some() || !self.params.is_empty()) {
            return Err(ShardCollectError::invalid_argument(format!(
                "terms facet on [{}] has script lang or params but no script",
                self.field
            )));
        }
        Ok(())
    }
}
