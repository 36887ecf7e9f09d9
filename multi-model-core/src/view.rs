//! # view: a list endpoint that serves several query/transformer pairs at once
//!
//! Implement [`MultipleModelView`] on a handler type and supply its query list;
//! [`MultipleModelView::respond`] then produces the full response for one
//! request. The handler's settings (`aggregation_config`, `default_filter`)
//! are read once per request and handed to [`aggregate`] explicitly, so
//! entries never observe each other's filters.
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use multi_model_core::memory::{FieldSelector, MemorySource};
//! use multi_model_core::query::SourceSpec;
//! use multi_model_core::view::MultipleModelView;
//! use serde_json::json;
//!
//! struct TextView;
//!
//! impl MultipleModelView for TextView {
//!     fn query_list(&self) -> Option<Vec<SourceSpec>> {
//!         let plays = MemorySource::from_json("Play", json!([{"title": "Hamlet"}])).ok()?;
//!         Some(vec![SourceSpec::new(Arc::new(plays), Arc::new(FieldSelector::all()))])
//!     }
//! }
//!
//! let response = TextView.respond();
//! assert_eq!(response.status, 200);
//! assert_eq!(response.body, json!([{"play": [{"title": "Hamlet"}]}]));
//! ```

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::aggregate::{aggregate, AggregatedResult};
use crate::config::AggregationConfig;
use crate::contract::Filterer;
use crate::error::AggregateError;
use crate::query::SourceSpec;

/// Status and JSON body handed back to the transport layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn from_error(err: &AggregateError) -> Self {
        Self {
            status: err.status_code(),
            body: json!({ "detail": err.to_string() }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait MultipleModelView {
    /// The entries to aggregate, or `None` when this view has none configured.
    fn query_list(&self) -> Option<Vec<SourceSpec>>;

    fn aggregation_config(&self) -> AggregationConfig {
        AggregationConfig::default()
    }

    /// Filter applied to every entry that does not set its own.
    fn default_filter(&self) -> Option<Arc<dyn Filterer>> {
        None
    }

    fn view_name(&self) -> &str {
        "MultipleModelView"
    }

    /// The query list, or a configuration error naming this view.
    fn get_query_list(&self) -> Result<Vec<SourceSpec>, AggregateError> {
        self.query_list().ok_or_else(|| {
            error!(view = self.view_name(), "[VIEW][ERROR] No query list configured");
            AggregateError::configuration(format!(
                "'{}' should either include a query list or override `query_list()`",
                self.view_name()
            ))
        })
    }

    fn list(&self) -> Result<AggregatedResult, AggregateError> {
        let specs = self.get_query_list()?;
        let config = self.aggregation_config();
        config.trace_loaded();
        let default_filter = self.default_filter();
        aggregate(Some(specs.as_slice()), &config, default_filter.as_ref())
    }

    /// Run [`list`](Self::list) and map the outcome onto a response.
    fn respond(&self) -> Response {
        let body = self.list().and_then(|result| {
            info!(view = self.view_name(), items = result.len(), "[VIEW] Responding");
            serde_json::to_value(&result).map_err(AggregateError::from)
        });
        match body {
            Ok(body) => Response::ok(body),
            Err(e) => {
                error!(view = self.view_name(), error = %e, "[VIEW][ERROR] Request failed");
                Response::from_error(&e)
            }
        }
    }
}
