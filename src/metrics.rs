//! Metric helpers for `engine_bridge`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! the helpers compile to nothing.

#[cfg(feature = "metrics")]
use metrics::counter;

use crate::dispatch::EventKind;

/// Name of the counter tracking bootstraps handed to the engine.
pub const BOOTSTRAPS_CREATED: &str = "engine_bridge_bootstraps_created_total";
/// Name of the counter tracking events submitted to executors.
pub const EVENTS_DISPATCHED: &str = "engine_bridge_events_dispatched_total";
/// Name of the counter tracking streams aborted for protocol violations.
pub const PROTOCOL_VIOLATIONS: &str = "engine_bridge_protocol_violations_total";
/// Name of the counter tracking panics raised by application callbacks.
pub const CALLBACK_PANICS: &str = "engine_bridge_callback_panics_total";

/// Record a bootstrap created by the engine.
pub fn inc_bootstraps() {
    #[cfg(feature = "metrics")]
    counter!(BOOTSTRAPS_CREATED).increment(1);
}

/// Record an event submitted for the given kind.
pub fn inc_events(kind: EventKind) {
    #[cfg(feature = "metrics")]
    counter!(EVENTS_DISPATCHED, "kind" => kind.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = kind;
}

/// Record a stream aborted by a protocol violation.
pub fn inc_protocol_violations() {
    #[cfg(feature = "metrics")]
    counter!(PROTOCOL_VIOLATIONS).increment(1);
}

/// Record a panic caught while running an application callback.
pub fn inc_callback_panics() {
    #[cfg(feature = "metrics")]
    counter!(CALLBACK_PANICS).increment(1);
}
