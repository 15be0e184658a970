//! Telemetry utilities for action timing and tracing spans.

use std::time::Instant;

/// Guard for timing action execution and recording metrics.
///
/// Records action latency when dropped.
pub struct ActionTimer {
    action: String,
    start: Instant,
}

impl ActionTimer {
    /// Start timing an action.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for ActionTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_action(&self.action, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span for one action execution.
    pub fn action(name: &str, principal: Option<&str>) -> Span {
        if let Some(principal) = principal {
            info_span!("action", name = %name, principal = %principal)
        } else {
            info_span!("action", name = %name)
        }
    }

    /// Span for one run of a background task.
    pub fn task(name: &'static str) -> Span {
        info_span!("task", name = %name)
    }
}
