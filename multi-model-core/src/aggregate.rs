//! High-level pipeline: runs every entry of a query list through filter → transform
//! and combines the output into one response collection.
//!
//! # Major Types
//! - [`AggregatedResult`]: the combined output, grouped per entry or flattened
//! - [`Group`]: one entry's records in grouped mode, optionally keyed by label
//!
//! # Responsibilities
//! - Single, ordered pass over the query list; each entry is filtered and
//!   transformed exactly once
//! - Resolves a label per entry (explicit label, else lowercased type name)
//! - Optional stable sort of the flattened output (see [`crate::sort`])
//!
//! # Error Handling
//! Fail-fast: the first failing entry stops the pass and its error is returned
//! as-is. Collaborator errors are wrapped in [`AggregateError::Collaborator`]
//! without added context.
//!
//! # Navigation
//! - Main entrypoint: [`aggregate`]

use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::config::AggregationConfig;
use crate::contract::{DataSource, Filterer, ResultItem};
use crate::error::AggregateError;
use crate::query::{QueryOptions, SourceSpec};
use crate::sort::sort_by_field;

/// Field a flattened record's label is written to.
pub const TYPE_FIELD: &str = "type";

/// One entry's records in grouped (non-flattened) output.
#[derive(Debug, Clone, PartialEq)]
pub enum Group {
    /// Records without a label, emitted as a plain list.
    Bare(Vec<ResultItem>),
    /// Records emitted as `{label: [records...]}`.
    Labeled {
        label: String,
        records: Vec<ResultItem>,
    },
}

impl Group {
    pub fn label(&self) -> Option<&str> {
        match self {
            Group::Bare(_) => None,
            Group::Labeled { label, .. } => Some(label),
        }
    }

    pub fn records(&self) -> &[ResultItem] {
        match self {
            Group::Bare(records) | Group::Labeled { records, .. } => records,
        }
    }
}

impl Serialize for Group {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Group::Bare(records) => records.serialize(serializer),
            Group::Labeled { label, records } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(label, records)?;
                map.end()
            }
        }
    }
}

/// Combined output of one aggregation call. Serializes to a JSON array either way.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum AggregatedResult {
    /// One element per query-list entry, in input order.
    Grouped(Vec<Group>),
    /// Every entry's records in one list, tagged with their label.
    Flat(Vec<ResultItem>),
}

impl AggregatedResult {
    pub fn len(&self) -> usize {
        match self {
            AggregatedResult::Grouped(groups) => groups.len(),
            AggregatedResult::Flat(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Label for one entry: the explicit label when set, else the lowercased type
/// name of the filtered source if type labels are enabled.
fn resolve_label(
    options: &QueryOptions,
    config: &AggregationConfig,
    filtered: &dyn DataSource,
) -> Option<String> {
    if let Some(label) = options.explicit_label() {
        return Some(label.to_owned());
    }
    if config.include_type_label {
        return Some(filtered.type_name().to_lowercase());
    }
    None
}

/// Aggregate every entry of `specs` into one result.
///
/// `default_filter` applies to entries that do not carry their own filter; it
/// is fixed for the whole call. Passing `None` for `specs` means no query list
/// was supplied and fails with [`AggregateError::Configuration`].
pub fn aggregate(
    specs: Option<&[SourceSpec]>,
    config: &AggregationConfig,
    default_filter: Option<&Arc<dyn Filterer>>,
) -> Result<AggregatedResult, AggregateError> {
    let Some(specs) = specs else {
        error!("[AGGREGATE][ERROR] No query list supplied");
        return Err(AggregateError::configuration(
            "a query list must be supplied to aggregate",
        ));
    };

    info!(
        entries = specs.len(),
        flatten = config.flatten,
        include_type_label = config.include_type_label,
        has_default_filter = default_filter.is_some(),
        "[AGGREGATE] Starting aggregation"
    );

    let mut groups: Vec<Group> = Vec::new();
    let mut flat: Vec<ResultItem> = Vec::new();

    for (position, spec) in specs.iter().enumerate() {
        // --- Step 1: Filter ---
        let filter = spec.options.filter.as_ref().or(default_filter);
        let filtered = match filter {
            Some(filter) => match filter.filter(Arc::clone(&spec.source)) {
                Ok(filtered) => filtered,
                Err(e) => {
                    error!(position, error = %e, "[AGGREGATE][ERROR] Filter failed");
                    return Err(AggregateError::Collaborator(e));
                }
            },
            None => Arc::clone(&spec.source),
        };

        // --- Step 2: Label ---
        let label = resolve_label(&spec.options, config, filtered.as_ref());

        // --- Step 3: Transform ---
        let records = match spec.transformer.transform(Arc::clone(&filtered)) {
            Ok(records) => records,
            Err(e) => {
                error!(position, error = %e, "[AGGREGATE][ERROR] Transform failed");
                return Err(AggregateError::Collaborator(e));
            }
        };
        debug!(
            position,
            label = label.as_deref().unwrap_or("<none>"),
            records = records.len(),
            filtered = filter.is_some(),
            "[AGGREGATE] Entry transformed"
        );

        // --- Step 4: Accumulate ---
        if config.flatten {
            for mut record in records {
                if let Some(label) = &label {
                    record.insert(TYPE_FIELD.to_owned(), Value::String(label.clone()));
                }
                flat.push(record);
            }
        } else {
            groups.push(match label {
                Some(label) => Group::Labeled { label, records },
                None => Group::Bare(records),
            });
        }
    }

    if !config.flatten {
        info!(groups = groups.len(), "[AGGREGATE] Aggregation complete");
        return Ok(AggregatedResult::Grouped(groups));
    }

    if let Some(sort_key) = config.effective_sort_key() {
        sort_by_field(&mut flat, sort_key)?;
    }
    info!(records = flat.len(), "[AGGREGATE] Aggregation complete");
    Ok(AggregatedResult::Flat(flat))
}
