//! CLI, configuration, and command wiring
//!
//! This crate provides the `calsync` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
