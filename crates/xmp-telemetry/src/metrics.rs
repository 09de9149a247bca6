//! Prometheus metrics for XMP agents.
//!
//! All metrics follow the naming convention: `xmp_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., messages_dispatched_total)
//! - **Gauge**: Value that can go up or down (e.g., latest_leaf_index)
//! - **Histogram**: Distribution of values (e.g., process_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, GaugeVec, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // OUTBOX METRICS
    // =========================================================================

    /// Messages committed to the outbox
    pub static ref MESSAGES_DISPATCHED: CounterVec = CounterVec::new(
        Opts::new("xmp_outbox_messages_dispatched_total", "Messages committed to the outbox"),
        &["destination"]
    ).expect("metric creation failed");

    // =========================================================================
    // VALIDATOR METRICS
    // =========================================================================

    /// Checkpoints signed and published by the local validator
    pub static ref CHECKPOINTS_SIGNED: Counter = Counter::new(
        "xmp_validator_checkpoints_signed_total",
        "Checkpoints signed and written to the checkpoint syncer"
    ).expect("metric creation failed");

    // =========================================================================
    // INBOX METRICS
    // =========================================================================

    /// Roots admitted as proven
    pub static ref CHECKPOINTS_PROVEN: CounterVec = CounterVec::new(
        Opts::new("xmp_inbox_checkpoints_proven_total", "Checkpoint roots admitted by an inbox"),
        &["destination"]
    ).expect("metric creation failed");

    /// Checkpoints rejected by the quorum verifier
    pub static ref QUORUM_REJECTIONS: CounterVec = CounterVec::new(
        Opts::new("xmp_inbox_quorum_rejections_total", "Checkpoints rejected by the quorum verifier"),
        &["reason"]  // reason: below_threshold/unsorted/invalid_signature/domain
    ).expect("metric creation failed");

    /// Delivery attempts by outcome
    pub static ref MESSAGES_PROCESSED: CounterVec = CounterVec::new(
        Opts::new("xmp_inbox_messages_processed_total", "Message delivery attempts"),
        &["outcome"]  // outcome: delivered/already_processed/skipped/retry/failed
    ).expect("metric creation failed");

    /// Time spent proving and delivering one message
    pub static ref PROCESS_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "xmp_inbox_process_duration_seconds",
            "Time spent proving and delivering one message"
        ).buckets(exponential_buckets(0.0001, 2.0, 15).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // AGENT METRICS
    // =========================================================================

    /// Last leaf index seen by each agent role
    pub static ref LATEST_LEAF_INDEX: GaugeVec = GaugeVec::new(
        Opts::new("xmp_agent_latest_leaf_index", "Last leaf index handled by an agent"),
        &["role"]  // role: outbox/validator/relayer
    ).expect("metric creation failed");

    /// Agent errors by component and type
    pub static ref AGENT_ERRORS: CounterVec = CounterVec::new(
        Opts::new("xmp_agent_errors_total", "Errors by component and type"),
        &["component", "error_type"]
    ).expect("metric creation failed");
}

/// Handle to the registered metrics.
#[derive(Clone)]
pub struct MetricsHandle {
    registry: Registry,
}

impl MetricsHandle {
    /// Render every registered metric in the Prometheus text format.
    pub fn gather_text(&self) -> Result<String, TelemetryError> {
        encode(&self.registry)
    }
}

/// Register all metrics with the global registry.
///
/// Calling it more than once is harmless.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(MESSAGES_DISPATCHED.clone()),
        Box::new(CHECKPOINTS_SIGNED.clone()),
        Box::new(CHECKPOINTS_PROVEN.clone()),
        Box::new(QUORUM_REJECTIONS.clone()),
        Box::new(MESSAGES_PROCESSED.clone()),
        Box::new(PROCESS_DURATION.clone()),
        Box::new(LATEST_LEAF_INDEX.clone()),
        Box::new(AGENT_ERRORS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        registry: REGISTRY.clone(),
    })
}

/// Encode all metrics in the global registry as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    encode(&REGISTRY)
}

fn encode(registry: &Registry) -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::HistogramTimer::new(&$histogram)
    };
}
