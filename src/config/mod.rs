//! Configuration module for the endpoint registry
//!
//! Supports loading configuration from TOML files and environment variables.

mod settings;

pub use settings::*;
