#![doc = "multi-model-core: core logic library for multi-model."]

//! Aggregates several data-source / transformer pairs into one list response,
//! grouped per source or flattened, labeled, sorted and filtered.
//!
//! # Usage
//! Implement the collaborator traits in [`contract`] (or use the ones in
//! [`memory`]), build a query list of [`query::SourceSpec`]s and either call
//! [`aggregate::aggregate`] directly or implement [`view::MultipleModelView`].

pub mod aggregate;
pub mod config;
pub mod contract;
pub mod error;
pub mod memory;
pub mod query;
pub mod sort;
pub mod view;

pub use aggregate::{aggregate, AggregatedResult, Group};
pub use config::AggregationConfig;
pub use error::AggregateError;
pub use query::{QueryOptions, SourceSpec};
