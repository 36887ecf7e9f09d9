//! One entry of the query list: a data source, the transformer that renders it,
//! and the per-entry options.

use std::fmt;
use std::sync::Arc;

use crate::contract::{DataSource, Filterer, Transformer};

/// Per-entry options.
///
/// A bare label string converts into options carrying only that label.
#[derive(Clone, Default)]
pub struct QueryOptions {
    pub label: Option<String>,
    /// Filter for this entry only; overrides the call's default filter.
    pub filter: Option<Arc<dyn Filterer>>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_filter(mut self, filter: Arc<dyn Filterer>) -> Self {
        self.filter = Some(filter);
        self
    }

    /// The explicit label, treating an empty string as absent.
    pub fn explicit_label(&self) -> Option<&str> {
        self.label.as_deref().filter(|label| !label.is_empty())
    }
}

impl From<&str> for QueryOptions {
    fn from(label: &str) -> Self {
        Self::new().with_label(label)
    }
}

impl From<String> for QueryOptions {
    fn from(label: String) -> Self {
        Self::new().with_label(label)
    }
}

impl fmt::Debug for QueryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryOptions")
            .field("label", &self.label)
            .field("filter", &self.filter.as_ref().map(|_| "<filter>"))
            .finish()
    }
}

/// A (source, transformer, options) triple.
#[derive(Clone)]
pub struct SourceSpec {
    pub source: Arc<dyn DataSource>,
    pub transformer: Arc<dyn Transformer>,
    pub options: QueryOptions,
}

impl SourceSpec {
    /// An entry with empty options.
    pub fn new(source: Arc<dyn DataSource>, transformer: Arc<dyn Transformer>) -> Self {
        Self {
            source,
            transformer,
            options: QueryOptions::default(),
        }
    }

    pub fn with_options(
        source: Arc<dyn DataSource>,
        transformer: Arc<dyn Transformer>,
        options: impl Into<QueryOptions>,
    ) -> Self {
        Self {
            source,
            transformer,
            options: options.into(),
        }
    }
}

impl fmt::Debug for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSpec")
            .field("source", &self.source.type_name())
            .field("options", &self.options)
            .finish()
    }
}
