use crate::contract::CollaboratorError;

/// Every way a single aggregation call can fail.
///
/// Nothing is recovered locally: each variant surfaces to the caller, which
/// decides the user-visible response.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    /// Required aggregation input was missing or malformed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A flattened record lacks the requested sort field.
    #[error("Record {index} has no field `{field}` to sort by")]
    FieldAccess { field: String, index: usize },

    /// Two sort values cannot be ordered against each other.
    #[error("Cannot order `{field}` values {left} and {right}")]
    Comparison {
        field: String,
        left: serde_json::Value,
        right: serde_json::Value,
    },

    /// A data source, filter or transformer failed.
    #[error("{0}")]
    Collaborator(#[from] CollaboratorError),

    /// The result could not be written out as a JSON body.
    #[error("Failed to serialize result: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AggregateError {
    pub fn configuration(context: impl Into<String>) -> Self {
        Self::Configuration(context.into())
    }

    /// Transport status for this failure.
    ///
    /// Every kind is fatal for the request and none is the client's fault in a
    /// way the aggregator can tell, so all map to 500.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Configuration(_)
            | Self::FieldAccess { .. }
            | Self::Comparison { .. }
            | Self::Collaborator(_)
            | Self::Serialization(_) => 500,
        }
    }
}
