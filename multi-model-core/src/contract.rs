//! # contract: Interfaces for the collaborators an aggregation runs over
//!
//! The aggregator never executes queries, filters or serializes records itself.
//! It drives three collaborators supplied by the host:
//!
//! - [`DataSource`]: a queryable record collection with a resolvable type name
//!   (think "queryset").
//! - [`Filterer`]: narrows a data source by some policy (think "filter backend").
//! - [`Transformer`]: turns a data source into serializable JSON objects
//!   (think "serializer").
//!
//! ## Mocking & Testing
//! - The traits are annotated for `mockall`; the generated `Mock*` types are
//!   exported under the `test-export-mocks` feature so integration tests can
//!   script collaborators deterministically.
//!
//! ## Ownership
//! Data sources are handed around as `Arc<dyn DataSource>`. A filter receives
//! its input by value and returns a (possibly new) source; passing the same
//! `Arc` back is a valid no-op filter.

use std::sync::Arc;

/// One transformed record: a JSON object keyed by field name.
pub type ResultItem = serde_json::Map<String, serde_json::Value>;

/// Error type for collaborator failures (simple boxed error, passed through untouched).
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// A record collection the aggregator can filter, label and transform.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
pub trait DataSource: Send + Sync {
    /// Name of the record type this source yields (e.g. the model name).
    ///
    /// The aggregator lowercases it to derive a default label.
    fn type_name(&self) -> String;

    /// Fetch the records currently selected by this source.
    fn records(&self) -> Result<Vec<ResultItem>, CollaboratorError>;
}

/// Narrows a data source according to a pluggable policy.
///
/// Implementations are expected to be pure: no side effects beyond producing
/// the narrowed source.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
pub trait Filterer: Send + Sync {
    fn filter(
        &self,
        source: Arc<dyn DataSource>,
    ) -> Result<Arc<dyn DataSource>, CollaboratorError>;
}

/// Converts the records of a data source into serializable objects.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
pub trait Transformer: Send + Sync {
    fn transform(&self, source: Arc<dyn DataSource>)
        -> Result<Vec<ResultItem>, CollaboratorError>;
}
