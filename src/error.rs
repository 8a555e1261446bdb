//! Error types for shard-local collection.
//!
//! All failures are represented by [`ShardCollectError`]. Configuration
//! failures (unknown field, wrong value kind, malformed arguments) are raised
//! while a collector is being built, before any segment is touched. Execution
//! failures (script errors, field data reads) propagate out of the
//! per-document callbacks and abort the whole collection pass.
//!
//! # Examples
//!
//! ```
//! use shardcollect::error::{Result, ShardCollectError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(ShardCollectError::invalid_argument("size must be positive"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

use crate::field::ValueKind;

/// The main error type for collection and aggregation.
#[derive(Error, Debug)]
pub enum ShardCollectError {
    /// The field has no mapping in the shard's schema.
    #[error("Field [{field}] doesn't have a type, can't run a terms facet collector on it")]
    FieldNotFound { field: String },

    /// The field is mapped with a different value kind than requested.
    #[error("Field [{field}] is not of {expected} type (found {actual}), can't run terms {expected} facet collector on it")]
    FieldKindMismatch {
        field: String,
        expected: ValueKind,
        actual: ValueKind,
    },

    /// Malformed comparator, size, or script arguments.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Script compilation or evaluation failure.
    #[error("Script error: {0}")]
    Script(String),

    /// Field data could not be loaded or read.
    #[error("Field data error: {0}")]
    FieldData(String),

    /// Failure while executing a facet outside the per-document path.
    #[error("Facet [{facet}]: {message}")]
    FacetPhase {
        facet: String,
        message: String,
        #[source]
        source: Box<ShardCollectError>,
    },

    /// A collector was driven out of its lifecycle contract.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for operations that may fail with ShardCollectError.
pub type Result<T> = std::result::Result<T, ShardCollectError>;

impl ShardCollectError {
    /// Create a new field-not-found error.
    pub fn field_not_found<S: Into<String>>(field: S) -> Self {
        ShardCollectError::FieldNotFound {
            field: field.into(),
        }
    }

    /// Create a new kind mismatch error.
    pub fn kind_mismatch<S: Into<String>>(
        field: S,
        expected: ValueKind,
        actual: ValueKind,
    ) -> Self {
        ShardCollectError::FieldKindMismatch {
            field: field.into(),
            expected,
            actual,
        }
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        ShardCollectError::InvalidArgument(msg.into())
    }

    /// Create a new script error.
    pub fn script<S: Into<String>>(msg: S) -> Self {
        ShardCollectError::Script(msg.into())
    }

    /// Create a new field data error.
    pub fn field_data<S: Into<String>>(msg: S) -> Self {
        ShardCollectError::FieldData(msg.into())
    }

    /// Wrap an error raised while executing the named facet.
    pub fn facet_phase<F, M>(facet: F, message: M, source: ShardCollectError) -> Self
    where
        F: Into<String>,
        M: Into<String>,
    {
        ShardCollectError::FacetPhase {
            facet: facet.into(),
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// Create a new invalid operation error.
    pub fn invalid_operation<S: Into<String>>(msg: S) -> Self {
        ShardCollectError::InvalidOperation(msg.into())
    }

    /// Whether this error was raised while configuring a collector, as
    /// opposed to while executing one.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ShardCollectError::FieldNotFound { .. }
                | ShardCollectError::FieldKindMismatch { .. }
                | ShardCollectError::InvalidArgument(_)
                | ShardCollectError::Json(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = ShardCollectError::field_not_found("price");
        assert_eq!(
            error.to_string(),
            "Field [price] doesn't have a type, can't run a terms facet collector on it"
        );

        let error = ShardCollectError::kind_mismatch("price", ValueKind::Short, ValueKind::Long);
        assert_eq!(
            error.to_string(),
            "Field [price] is not of short type (found long), can't run terms short facet collector on it"
        );

        let error = ShardCollectError::script("boom");
        assert_eq!(error.to_string(), "Script error: boom");
    }

    #[test]
    fn test_configuration_taxonomy() {
        assert!(ShardCollectError::field_not_found("f").is_configuration_error());
        assert!(ShardCollectError::invalid_argument("bad order").is_configuration_error());
        assert!(!ShardCollectError::script("boom").is_configuration_error());

        let wrapped = ShardCollectError::facet_phase(
            "tags",
            "failed to load all terms",
            ShardCollectError::field_data("corrupt column"),
        );
        assert!(!wrapped.is_configuration_error());
        assert_eq!(wrapped.to_string(), "Facet [tags]: failed to load all terms");
        assert!(std::error::Error::source(&wrapped).is_some());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = ShardCollectError::from(json_error);

        match error {
            ShardCollectError::Json(_) => {} // Expected
            _ => panic!("Expected JSON error variant"),
        }
    }
}
