//! Prometheus metrics for the device runtime.
//!
//! Core metrics (coordinator, readiness, overlays) are registered here
//! alongside the runtime's own operator command counter.

use once_cell::sync::Lazy;
use prometheus::{self, Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Operator commands handled, by command.
pub static COMMANDS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("holosync_commands_total", "Total operator commands handled"),
        &["command"], // "ready", "marker", "skip", "status", "quit"
    )
    .unwrap()
});

/// Live overlays at the last evaluated frame.
pub static OVERLAYS_LIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("holosync_overlays_live", "Overlays not yet retired").unwrap()
});

fn register_metrics(registry: &Registry) {
    registry.register(Box::new(COMMANDS_TOTAL.clone())).unwrap();
    registry.register(Box::new(OVERLAYS_LIVE.clone())).unwrap();

    for metric in holosync_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return format!("# failed to encode metrics: {}\n", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
