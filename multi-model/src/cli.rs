//!
//! This module implements the CLI interface for multi-model: command parsing,
//! the main entrypoint and user-visible output.
//!
//! All aggregation logic lives in the [`multi-model-core`] crate. This module
//! is strictly CLI glue: it loads a query file, runs the view for one
//! "request" and writes the response body.
//!
//! ## How To Use
//! - For command-line users: use the installed `multi-model` binary with `--help`.
//! - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
//!
//! [`multi-model-core`]: ../../multi-model-core/

use crate::view::load_view;
use anyhow::Result;
use clap::{Parser, Subcommand};
use multi_model_core::view::MultipleModelView;
use std::path::PathBuf;

/// CLI for multi-model: serve several record sources as one aggregated list.
#[derive(Parser)]
#[clap(
    name = "multi-model",
    version,
    about = "Aggregate several record sources into one JSON list, grouped or flattened"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the aggregation described by a query file and print the JSON response
    List {
        /// Path to the YAML query file
        #[clap(long)]
        config: PathBuf,
        /// Pretty-print the JSON body
        #[clap(long)]
        pretty: bool,
    },
}

/// Extracted CLI logic entrypoint for integration tests and main()
pub fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::List { config, pretty } => {
            let view = load_view(&config)?;
            tracing::info!(command = "list", view = view.view_name(), "Serving list request");
            let response = view.respond();
            let body = if pretty {
                serde_json::to_string_pretty(&response.body)?
            } else {
                serde_json::to_string(&response.body)?
            };

            if response.is_success() {
                tracing::info!(command = "list", status = response.status, "List request complete");
                println!("{body}");
                Ok(())
            } else {
                tracing::error!(command = "list", status = response.status, "List request failed");
                eprintln!("{body}");
                anyhow::bail!("List request failed with status {}", response.status)
            }
        }
    }
}
