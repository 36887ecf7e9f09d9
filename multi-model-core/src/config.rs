use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Per-call aggregation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Mix every entry's records into one list instead of grouping per entry.
    pub flatten: bool,
    /// Field to sort the flat list by. Ignored unless `flatten` is set.
    pub sort_key: Option<String>,
    /// Fall back to the lowercased source type name when an entry has no label.
    pub include_type_label: bool,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            flatten: false,
            sort_key: None,
            include_type_label: true,
        }
    }
}

impl AggregationConfig {
    /// Sort key that actually applies to this call.
    pub fn effective_sort_key(&self) -> Option<&str> {
        if self.flatten {
            self.sort_key.as_deref()
        } else {
            None
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            flatten = self.flatten,
            sort_key = self.sort_key.as_deref().unwrap_or("<none>"),
            include_type_label = self.include_type_label,
            "Loaded AggregationConfig"
        );
        if self.sort_key.is_some() && !self.flatten {
            debug!("sort_key is set but flatten is off; results will not be sorted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_type_labels_and_group() {
        let config = AggregationConfig::default();
        assert!(!config.flatten);
        assert!(config.include_type_label);
        assert_eq!(config.sort_key, None);
    }

    #[test]
    fn sort_key_only_applies_when_flattened() {
        let mut config = AggregationConfig {
            sort_key: Some("rank".into()),
            ..Default::default()
        };
        assert_eq!(config.effective_sort_key(), None);
        config.flatten = true;
        assert_eq!(config.effective_sort_key(), Some("rank"));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: AggregationConfig =
            serde_json::from_str(r#"{"flatten": true}"#).expect("partial config should parse");
        assert!(config.flatten);
        assert!(config.include_type_label);
        assert_eq!(config.sort_key, None);
    }
}
