use super::test_helpers::*;
use crate::config::RetryConfig;
use crate::progress::tests::RecordingReporter;
use crate::types::{Event, ProgressEvent};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::Ordering;
use std::time::Duration;


/// Drain every event currently buffered on a receiver
fn drain_events(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Bounded, transient-agnostic retry for tests that must terminate on failure
fn bounded_retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries: Some(max_retries),
        ..RetryConfig::default()
    }
}
