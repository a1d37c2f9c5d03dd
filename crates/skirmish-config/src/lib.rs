//! Configuration for the Skirmish client.
//!
//! Settings persist to disk as a RON file, accept CLI overrides via clap,
//! and tolerate missing or unknown fields so older and newer config files
//! keep loading.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CONFIG_FILE, Config, ConnectionConfig, DebugConfig, GridConfig, default_config_dir,
};
pub use error::ConfigError;
