#![cfg(feature = "metrics")]
//! Tests for `engine_bridge` metrics.
//!
//! These tests verify that counters update as expected using
//! `metrics_util::debugging::DebuggingRecorder`.

use std::sync::Arc;

use engine_bridge::{
    EngineConfiguration,
    StreamRegistry,
    engine::{DryRunEngine, Engine},
    init,
    metrics::{BOOTSTRAPS_CREATED, CALLBACK_PANICS, EVENTS_DISPATCHED, PROTOCOL_VIOLATIONS},
};
use engine_bridge_testing::{RecordingCallbacks, final_intel, stream_intel};
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use rstest::rstest;

/// Creates a debugging recorder and snapshotter for metrics testing.
fn debugging_recorder_setup() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

fn counter(snapshotter: &Snapshotter, name: &str, label: Option<(&str, &str)>) -> u64 {
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter(|(k, _, _, _)| k.key().name() == name)
        .filter(|(k, _, _, _)| {
            label.is_none_or(|(key, value)| {
                k.key()
                    .labels()
                    .any(|l| l.key() == key && l.value() == value)
            })
        })
        .map(|(_, _, _, v)| match v {
            DebugValue::Counter(c) => c,
            _ => 0,
        })
        .sum()
}

#[test]
fn assembly_counts_bootstraps() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    init::initialize();
    let engine: Arc<dyn Engine> = Arc::new(DryRunEngine::new());
    let config = EngineConfiguration::builder().build().expect("initialised");

    let _handle = metrics::with_local_recorder(&recorder, || config.assemble(&engine))
        .expect("assembly succeeds");

    assert_eq!(counter(&snapshotter, BOOTSTRAPS_CREATED, None), 1);
}

#[rstest]
#[case::headers("headers")]
#[case::data("data")]
#[case::complete("complete")]
fn dispatched_events_are_counted_by_kind(#[case] kind: &str) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        let registry = StreamRegistry::new();
        let id = registry.open(init::initialize(), Arc::new(RecordingCallbacks::inline()));
        registry
            .on_headers(id, 0, false, &stream_intel(1))
            .expect("headers");
        registry
            .on_data(id, b"a", false, &stream_intel(1))
            .expect("first chunk");
        registry
            .on_data(id, b"b", true, &stream_intel(1))
            .expect("second chunk");
        registry
            .on_complete(id, &stream_intel(1), &final_intel())
            .expect("complete");
    });

    let expected = if kind == "data" { 2 } else { 1 };
    assert_eq!(
        counter(&snapshotter, EVENTS_DISPATCHED, Some(("kind", kind))),
        expected
    );
}

#[test]
fn protocol_violations_are_counted() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        let registry = StreamRegistry::new();
        let id = registry.open(init::initialize(), Arc::new(RecordingCallbacks::inline()));
        let _ = registry.on_data(id, b"x", false, &[1, 2]);
    });

    assert_eq!(counter(&snapshotter, PROTOCOL_VIOLATIONS, None), 1);
}

fn failing_callback() { panic!("counted") }

#[test]
fn callback_panics_are_counted() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        engine_bridge::executor::run_job(Box::new(failing_callback));
    });

    assert_eq!(counter(&snapshotter, CALLBACK_PANICS, None), 1);
}
