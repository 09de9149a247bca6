//! # XMP Telemetry
//!
//! Structured logging and Prometheus metrics for the XMP agents.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` with an `EnvFilter`, human-readable or
//!   JSON output
//! - **Metrics**: a global Prometheus registry holding the protocol counters
//!   (dispatched, signed, proven, processed) and per-role leaf-index gauges
//!
//! ## Usage
//!
//! ```rust,ignore
//! use xmp_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! // Logs and metrics are now being collected
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `XMP_SERVICE_NAME` | `xmp-node` | Service name in logs |
//! | `XMP_LOG_LEVEL` | `info` | Log level filter |
//! | `XMP_JSON_LOGS` | `false` | JSON log lines |
//! | `XMP_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `XMP_METRICS_PORT` | `9100` | Prometheus port |
//! | `XMP_NETWORK` | `testnet` | Network name |

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging, StructuredLogger};
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, MetricsHandle, AGENT_ERRORS,
    CHECKPOINTS_PROVEN, CHECKPOINTS_SIGNED, LATEST_LEAF_INDEX, MESSAGES_DISPATCHED,
    MESSAGES_PROCESSED, PROCESS_DURATION, QUORUM_REJECTIONS, REGISTRY,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global subscriber could not be installed
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// A metric could not be registered or encoded
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Invalid filter directive or other configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Metrics first so early log lines can already count errors.
    let metrics = register_metrics()?;
    let logger = init_logging(&config)?;

    Ok(TelemetryGuard {
        config,
        metrics,
        _logger: logger,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    config: TelemetryConfig,
    metrics: MetricsHandle,
    _logger: StructuredLogger,
}

impl TelemetryGuard {
    /// Configuration telemetry was started with.
    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    /// Registered metrics.
    pub fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.config.full_service_name(), "Shutting down telemetry");
    }
}

/// Convenience macro for creating a span with component context.
///
/// ```rust,ignore
/// let _span = component_span!("relay", component = "relayer", destination = 2000).entered();
/// ```
#[macro_export]
macro_rules! component_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Convenience macro for recording a metric with a value.
#[macro_export]
macro_rules! metric_observe {
    ($metric:expr, $value:expr) => {
        $metric.observe($value)
    };
    ($metric:expr, $labels:expr, $value:expr) => {
        $metric.with_label_values($labels).observe($value)
    };
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_service_name() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "xmp-node");
    }

    #[test]
    fn test_metric_macros() {
        metric_inc!(CHECKPOINTS_SIGNED);
        metric_inc!(AGENT_ERRORS, &["test", "macro"]);
        assert!(AGENT_ERRORS.with_label_values(&["test", "macro"]).get() >= 1.0);
    }

    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
