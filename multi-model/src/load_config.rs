//! `load_config` module: Loads a YAML query file into typed sections.
//!
//! This module is the only place where untrusted YAML is parsed. Mapping the
//! sections onto collaborators (sources, filters, transformers) happens in
//! [`crate::view`].
//!
//! # Accepted shape
//! ```yaml
//! aggregation:
//!   flatten: true
//!   sort_key: rank
//! default_filter:
//!   kind: equals
//!   field: published
//!   value: true
//! queries:
//!   - source:
//!       type_name: Play
//!       records: [{title: Hamlet, rank: 3}]
//!     fields: [title, rank]
//!     options: plays
//! ```
//!
//! # Errors
//! All errors in this module use `anyhow::Error` for context-rich diagnostics,
//! and are surfaced at the CLI boundary.

use anyhow::Result;
use multi_model_core::config::AggregationConfig;
use multi_model_core::memory::{FieldFilter, MemoryError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Debug, Deserialize)]
pub struct QueryFile {
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub default_filter: Option<FilterSection>,
    /// Absent means the file supplies no query list at all.
    #[serde(default)]
    pub queries: Option<Vec<QuerySection>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuerySection {
    pub source: SourceSection,
    /// Fields to keep per record; empty keeps all.
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub options: Option<OptionsSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceSection {
    pub type_name: String,
    #[serde(default)]
    pub records: Option<serde_json::Value>,
    /// JSON file with the records, relative to the query file.
    #[serde(default)]
    pub records_path: Option<PathBuf>,
}

/// Either a bare label or the full options mapping.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OptionsSection {
    Label(String),
    Full {
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        filter: Option<FilterSection>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterSection {
    Equals {
        field: String,
        value: serde_json::Value,
    },
    Matches {
        field: String,
        pattern: String,
    },
    Exists {
        field: String,
    },
}

impl FilterSection {
    pub fn build(&self) -> Result<FieldFilter, MemoryError> {
        match self {
            FilterSection::Equals { field, value } => {
                Ok(FieldFilter::equals(field.clone(), value.clone()))
            }
            FilterSection::Matches { field, pattern } => {
                FieldFilter::matches(field.clone(), pattern)
            }
            FilterSection::Exists { field } => Ok(FieldFilter::exists(field.clone())),
        }
    }
}

/// Loads and parses a YAML query file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<QueryFile> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading query file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Query file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read query file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let query_file: QueryFile = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed query file YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse query file YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    info!(
        queries = query_file.queries.as_ref().map_or(0, Vec::len),
        has_default_filter = query_file.default_filter.is_some(),
        "Query file loaded"
    );
    Ok(query_file)
}
