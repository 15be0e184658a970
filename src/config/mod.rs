//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions, one per TOML section
//! - [`defaults`]: Serde default value functions
//! - [`validation`]: Startup checks run after parsing

mod defaults;
mod types;
mod validation;

pub use types::{Config, HeaderConfig};
pub use validation::validate;
