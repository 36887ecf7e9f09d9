//! In-memory collaborators: a record-vector data source, field-based filters
//! and a projecting transformer.
//!
//! Enough to drive an aggregation without a database behind it (CLI, tests).

use std::sync::Arc;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::contract::{CollaboratorError, DataSource, Filterer, ResultItem, Transformer};

#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("Records for `{type_name}` must be a JSON array")]
    NotAnArray { type_name: String },
    #[error("Record {index} of `{type_name}` is not a JSON object")]
    NotAnObject { type_name: String, index: usize },
    #[error("Invalid filter pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// A data source over records held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySource {
    type_name: String,
    records: Vec<ResultItem>,
}

impl MemorySource {
    pub fn new(type_name: impl Into<String>, records: Vec<ResultItem>) -> Self {
        Self {
            type_name: type_name.into(),
            records,
        }
    }

    /// Build a source from a JSON array of objects.
    pub fn from_json(type_name: impl Into<String>, value: Value) -> Result<Self, MemoryError> {
        let type_name = type_name.into();
        let Value::Array(values) = value else {
            return Err(MemoryError::NotAnArray { type_name });
        };
        let mut records = Vec::with_capacity(values.len());
        for (index, value) in values.into_iter().enumerate() {
            match value {
                Value::Object(record) => records.push(record),
                _ => {
                    return Err(MemoryError::NotAnObject {
                        type_name: type_name.clone(),
                        index,
                    })
                }
            }
        }
        Ok(Self::new(type_name, records))
    }
}

impl DataSource for MemorySource {
    fn type_name(&self) -> String {
        self.type_name.clone()
    }

    fn records(&self) -> Result<Vec<ResultItem>, CollaboratorError> {
        Ok(self.records.clone())
    }
}

/// Keeps the records of a source that satisfy one field condition.
#[derive(Debug, Clone)]
pub enum FieldFilter {
    /// Field present and equal to `value`.
    Equals { field: String, value: Value },
    /// Field is a string matched by `pattern`.
    Matches { field: String, pattern: Regex },
    /// Field present, whatever its value.
    Exists { field: String },
}

impl FieldFilter {
    pub fn equals(field: impl Into<String>, value: Value) -> Self {
        FieldFilter::Equals {
            field: field.into(),
            value,
        }
    }

    pub fn matches(field: impl Into<String>, pattern: &str) -> Result<Self, MemoryError> {
        Ok(FieldFilter::Matches {
            field: field.into(),
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn exists(field: impl Into<String>) -> Self {
        FieldFilter::Exists {
            field: field.into(),
        }
    }

    pub fn accepts(&self, record: &ResultItem) -> bool {
        match self {
            FieldFilter::Equals { field, value } => record.get(field) == Some(value),
            FieldFilter::Matches { field, pattern } => match record.get(field) {
                Some(Value::String(text)) => pattern.is_match(text),
                _ => false,
            },
            FieldFilter::Exists { field } => record.contains_key(field),
        }
    }
}

impl Filterer for FieldFilter {
    fn filter(
        &self,
        source: Arc<dyn DataSource>,
    ) -> Result<Arc<dyn DataSource>, CollaboratorError> {
        let records = source.records()?;
        let before = records.len();
        let kept: Vec<ResultItem> = records.into_iter().filter(|r| self.accepts(r)).collect();
        debug!(filter = ?self, before, after = kept.len(), "Filtered in-memory source");
        Ok(Arc::new(MemorySource::new(source.type_name(), kept)))
    }
}

/// Projects each record onto a fixed list of fields.
///
/// An empty field list keeps every field. Fields a record lacks are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelector {
    fields: Vec<String>,
}

impl FieldSelector {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// A selector that passes records through whole.
    pub fn all() -> Self {
        Self::default()
    }

    fn project(&self, record: ResultItem) -> ResultItem {
        if self.fields.is_empty() {
            return record;
        }
        let mut projected = ResultItem::new();
        for field in &self.fields {
            if let Some(value) = record.get(field) {
                projected.insert(field.clone(), value.clone());
            }
        }
        projected
    }
}

impl Transformer for FieldSelector {
    fn transform(
        &self,
        source: Arc<dyn DataSource>,
    ) -> Result<Vec<ResultItem>, CollaboratorError> {
        let records = source.records()?;
        Ok(records.into_iter().map(|r| self.project(r)).collect())
    }
}
