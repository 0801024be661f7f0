#![cfg(feature = "metrics")]
//! Tests for the inspection metrics.
//!
//! Counters and gauges are observed through
//! `metrics_util::debugging::DebuggingRecorder`.

use std::sync::Arc;

use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use rstest::rstest;
use sni_peek::{InspectConfig, Inspector, pool::BufferPool};
use sni_peek_testing::{ClientHelloBuilder, ScriptedReader};

fn debugging_recorder_setup() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

fn counter_with_label(snapshotter: &Snapshotter, name: &str, label: &str, value: &str) -> u64 {
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter(|(k, _, _, _)| {
            k.key().name() == name
                && k.key()
                    .labels()
                    .any(|l| l.key() == label && l.value() == value)
        })
        .map(|(_, _, _, v)| match v {
            DebugValue::Counter(c) => c,
            _ => 0,
        })
        .sum()
}

fn inspect(bytes: Vec<u8>, fast_path: bool) {
    let inspector = Inspector::with_pool(
        InspectConfig::default().with_fast_path(fast_path),
        Arc::new(BufferPool::new()),
    );
    let _ = inspector.read_hostname(ScriptedReader::new(bytes));
}

#[test]
fn successful_inspection_is_counted() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        inspect(ClientHelloBuilder::new("example.com").record(), true);
    });
    assert_eq!(
        counter_with_label(&snapshotter, sni_peek::metrics::INSPECTIONS_TOTAL, "outcome", "ok"),
        1
    );
    assert_eq!(
        counter_with_label(&snapshotter, sni_peek::metrics::FAST_PATH_TOTAL, "verdict", "resolved"),
        1
    );
}

#[rstest]
#[case(vec![0x17, 0x03, 0x03, 0x00, 0x01, 0x00], "invalid_record")]
#[case(vec![0x16, 0x03, 0x01], "io")]
fn failures_are_counted_by_label(#[case] bytes: Vec<u8>, #[case] outcome: &str) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || inspect(bytes, false));
    assert_eq!(
        counter_with_label(&snapshotter, sni_peek::metrics::INSPECTIONS_TOTAL, "outcome", outcome),
        1
    );
}

#[test]
fn pool_gauge_returns_to_zero() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        inspect(ClientHelloBuilder::new("example.com").record(), true);
    });
    let gauge = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .find(|(k, _, _, _)| k.key().name() == sni_peek::metrics::POOL_OUTSTANDING)
        .map(|(_, _, _, v)| v);
    assert!(
        matches!(gauge, Some(DebugValue::Gauge(g)) if g.into_inner().abs() < f64::EPSILON),
        "unexpected gauge: {gauge:?}"
    );
}
