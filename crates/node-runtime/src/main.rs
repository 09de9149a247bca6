//! # XMP Node
//!
//! Runs the validator and relayer agents for one origin domain.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (`XMP_CONFIG` file, then `XMP_*` environment)
//! 2. Initialize telemetry (logging, metrics registry)
//! 3. Restore persisted state and build the runtime
//! 4. Spawn the agents and the admin endpoint
//! 5. Wait for Ctrl+C, then shut down and persist

use anyhow::{Context, Result};
use node_runtime::{NodeConfig, NodeRuntime};
use tracing::info;
use xmp_telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::load().context("Failed to load configuration")?;

    let _telemetry =
        init_telemetry(config.telemetry.clone()).context("Failed to initialize telemetry")?;

    let runtime = NodeRuntime::new(config).context("Failed to build node runtime")?;
    runtime.start().await.context("Failed to start node runtime")?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime
        .shutdown()
        .await
        .context("Failed to persist state during shutdown")?;
    Ok(())
}
