//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use std::net::SocketAddr;

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

pub fn default_database_path() -> String {
    "eureka.db".to_string()
}

// =============================================================================
// Cache Defaults
// =============================================================================

pub fn default_cache_ttl() -> u64 {
    300
}

pub fn default_cache_prune_interval() -> u64 {
    60
}

// =============================================================================
// Usage Defaults
// =============================================================================

/// The summary job is idempotent per day, so an hourly check is enough.
pub fn default_summary_interval() -> u64 {
    3600
}

pub fn default_metric_retention_days() -> i64 {
    7
}

// =============================================================================
// Gadget Defaults
// =============================================================================

pub fn default_undelete_window_days() -> i64 {
    7
}

pub fn default_gadget_purge_interval() -> u64 {
    3600
}
