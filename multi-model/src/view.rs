//! A [`MultipleModelView`] assembled from a loaded query file.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use multi_model_core::contract::{DataSource, Filterer};
use multi_model_core::memory::{FieldSelector, MemorySource};
use multi_model_core::view::MultipleModelView;
use multi_model_core::{AggregationConfig, QueryOptions, SourceSpec};
use tracing::{debug, info};

use crate::load_config::{load_config, OptionsSection, QueryFile, QuerySection, SourceSection};

/// View whose query list, settings and default filter come from a query file.
pub struct ConfiguredView {
    name: String,
    specs: Option<Vec<SourceSpec>>,
    config: AggregationConfig,
    default_filter: Option<Arc<dyn Filterer>>,
}

impl MultipleModelView for ConfiguredView {
    fn query_list(&self) -> Option<Vec<SourceSpec>> {
        self.specs.clone()
    }

    fn aggregation_config(&self) -> AggregationConfig {
        self.config.clone()
    }

    fn default_filter(&self) -> Option<Arc<dyn Filterer>> {
        self.default_filter.clone()
    }

    fn view_name(&self) -> &str {
        &self.name
    }
}

impl ConfiguredView {
    /// Build the view from parsed sections. Record paths resolve against `base_dir`.
    pub fn from_query_file(
        name: impl Into<String>,
        file: QueryFile,
        base_dir: &Path,
    ) -> Result<Self> {
        let default_filter = match &file.default_filter {
            Some(section) => {
                let filter = section.build().context("Invalid default_filter")?;
                Some(Arc::new(filter) as Arc<dyn Filterer>)
            }
            None => None,
        };

        let specs = match file.queries {
            Some(queries) => {
                let mut specs = Vec::with_capacity(queries.len());
                for (position, query) in queries.into_iter().enumerate() {
                    let spec = build_spec(query, base_dir)
                        .with_context(|| format!("Invalid query at position {position}"))?;
                    specs.push(spec);
                }
                Some(specs)
            }
            None => None,
        };

        info!(
            queries = specs.as_ref().map_or(0, Vec::len),
            "Configured view from query file"
        );

        Ok(Self {
            name: name.into(),
            specs,
            config: file.aggregation,
            default_filter,
        })
    }
}

/// Load a query file and build its view, named after the file.
pub fn load_view<P: AsRef<Path>>(path: P) -> Result<ConfiguredView> {
    let path = path.as_ref();
    let file = load_config(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "query file".to_owned());
    ConfiguredView::from_query_file(name, file, base_dir)
}

fn build_spec(query: QuerySection, base_dir: &Path) -> Result<SourceSpec> {
    let source = build_source(&query.source, base_dir)?;
    let transformer = Arc::new(FieldSelector::new(query.fields));
    let options = match query.options {
        None => QueryOptions::new(),
        Some(OptionsSection::Label(label)) => QueryOptions::from(label),
        Some(OptionsSection::Full { label, filter }) => {
            let mut options = QueryOptions::new();
            options.label = label;
            if let Some(section) = filter {
                let filter = section.build().context("Invalid filter")?;
                options = options.with_filter(Arc::new(filter));
            }
            options
        }
    };
    debug!(?options, type_name = %query.source.type_name, "Built query entry");
    Ok(SourceSpec::with_options(source, transformer, options))
}

fn build_source(section: &SourceSection, base_dir: &Path) -> Result<Arc<dyn DataSource>> {
    let records = match (&section.records, &section.records_path) {
        (Some(records), None) => records.clone(),
        (None, Some(relative)) => {
            let path = base_dir.join(relative);
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read records file {:?}", path))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse records file {:?} as JSON", path))?
        }
        (Some(_), Some(_)) => anyhow::bail!(
            "Source `{}` sets both records and records_path",
            section.type_name
        ),
        (None, None) => anyhow::bail!(
            "Source `{}` needs either records or records_path",
            section.type_name
        ),
    };
    let source = MemorySource::from_json(section.type_name.clone(), records)?;
    Ok(Arc::new(source))
}
