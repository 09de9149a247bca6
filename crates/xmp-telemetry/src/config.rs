//! Telemetry configuration from environment variables.

use serde::{Deserialize, Serialize};
use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive
    pub log_level: String,

    /// Whether to write logs to stdout at all
    pub console_output: bool,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Prometheus metrics port
    pub metrics_port: u16,

    /// Network identifier (testnet, mainnet, devnet)
    pub network: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "xmp-node".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            metrics_port: 9100,
            network: "testnet".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `XMP_SERVICE_NAME`: Service name (default: xmp-node)
    /// - `XMP_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `XMP_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `XMP_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `XMP_METRICS_PORT`: Prometheus metrics port (default: 9100)
    /// - `XMP_NETWORK`: Network name (default: testnet)
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply any `XMP_*` variables on top of `self`.
    pub fn with_env_overrides(mut self) -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        if let Ok(name) = env::var("XMP_SERVICE_NAME") {
            self.service_name = name;
        }
        if let Ok(level) = env::var("XMP_LOG_LEVEL").or_else(|_| env::var("RUST_LOG")) {
            self.log_level = level;
        }
        if let Ok(v) = env::var("XMP_CONSOLE_OUTPUT") {
            self.console_output = parse_flag(&v, true);
        }
        match env::var("XMP_JSON_LOGS") {
            Ok(v) => self.json_logs = parse_flag(&v, false),
            Err(_) if is_container => self.json_logs = true,
            Err(_) => {}
        }
        if let Some(port) = env::var("XMP_METRICS_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.metrics_port = port;
        }
        if let Ok(network) = env::var("XMP_NETWORK") {
            self.network = network;
        }
        self
    }

    /// Service name qualified by network, e.g. `xmp-node-testnet`.
    pub fn full_service_name(&self) -> String {
        if self.network.is_empty() {
            self.service_name.clone()
        } else {
            format!("{}-{}", self.service_name, self.network)
        }
    }
}

fn parse_flag(value: &str, default: bool) -> bool {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => true,
        "false" | "0" | "no" => false,
        _ => default,
    }
}
