//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Coordinator requests (configuration, ready announce, status polls)
//! - Readiness handshake (poll attempts, wait duration)
//! - Overlay lifecycle and frame scheduling

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Coordinator Metrics
// =============================================================================

/// Coordinator requests total by endpoint and result.
pub static COORDINATOR_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "holosync_coordinator_requests_total",
            "Total coordinator requests",
        ),
        &["endpoint", "status"], // status: "success", "error"
    )
    .unwrap()
});

/// Coordinator request duration.
pub static COORDINATOR_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "holosync_coordinator_request_duration_seconds",
            "Duration of coordinator requests",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["endpoint"],
    )
    .unwrap()
});

// =============================================================================
// Readiness Metrics
// =============================================================================

/// Status polls total by result.
pub static READINESS_POLLS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("holosync_readiness_polls_total", "Total readiness status polls"),
        &["result"], // "waiting", "started", "failed"
    )
    .unwrap()
});

/// Time from ready announcement to start signal (or give-up).
pub static READINESS_WAIT_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "holosync_readiness_wait_seconds",
            "Duration of the readiness handshake",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
        &["result"], // "started", "cancelled", "failed"
    )
    .unwrap()
});

// =============================================================================
// Overlay / Scheduler Metrics
// =============================================================================

/// Overlays created total by outcome.
pub static OVERLAYS_CREATED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("holosync_overlays_created_total", "Total overlay entities created"),
        &["state"], // "active", "disabled"
    )
    .unwrap()
});

/// Overlays retired total.
pub static OVERLAYS_RETIRED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("holosync_overlays_retired_total", "Total overlay entities retired").unwrap()
});

/// Frames evaluated by the scheduler.
pub static FRAMES_EVALUATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "holosync_frames_evaluated_total",
        "Total frames evaluated by the timeline scheduler",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Coordinator
        Box::new(COORDINATOR_REQUESTS.clone()),
        Box::new(COORDINATOR_REQUEST_DURATION.clone()),
        // Readiness
        Box::new(READINESS_POLLS.clone()),
        Box::new(READINESS_WAIT_DURATION.clone()),
        // Overlays
        Box::new(OVERLAYS_CREATED.clone()),
        Box::new(OVERLAYS_RETIRED.clone()),
        Box::new(FRAMES_EVALUATED.clone()),
    ]
}
