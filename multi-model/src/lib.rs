pub mod cli;
pub mod load_config;
pub mod view;

pub use cli::{run, Cli, Commands};
