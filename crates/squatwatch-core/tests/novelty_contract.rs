//! Contract Test: Novelty & History
//!
//! Constraints verified:
//! - With empty history every hit is novel, persisted and notified
//! - An unregistered look-alike is reported once it gets registered
//! - A domain present in history never reappears in a Finding Batch
//! - History only grows
//! - A failed write is still reported, and reported again next run
//! - A notifier failure never rolls back history
//! - Unreadable history aborts the run before anything is reported
//! - Local mode touches neither history nor notifier
//! - A shutdown still reports the hits found so far
//!
//! If this test fails, clients will either miss findings or be spammed
//! with repeats.

mod common;

use common::*;
use squatwatch_core::config::MonitorConfig;
use squatwatch_core::diff::DiffPhase;
use squatwatch_core::{Error, Invocation, Monitor, MonitorEvent};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const HITS: [&str; 2] = ["examp1e.com", "example.co"];

fn monitor(
    prober: &ScriptedProber,
    store: &RecordingHistoryStore,
    notifier: &RecordingNotifier,
    config: MonitorConfig,
) -> (Monitor, mpsc::Receiver<MonitorEvent>) {
    Monitor::new(
        Arc::new(prober.clone()),
        Box::new(store.clone()),
        Box::new(notifier.clone()),
        config,
    )
    .expect("monitor construction succeeds")
}

/// Diff every cleaned candidate, registered or not
fn all_candidates() -> MonitorConfig {
    let mut config = test_config();
    config.engine.registered_only = false;
    config
}

fn names(values: &[&str]) -> HashSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn invocation() -> Invocation {
    Invocation::new("example.com", "ABC0")
}

#[tokio::test]
async fn empty_history_reports_and_persists_every_candidate() {
    let prober = ScriptedProber::new().with_hits(&HITS);
    let store = RecordingHistoryStore::new();
    let notifier = RecordingNotifier::new();

    let (monitor, _events) = monitor(&prober, &store, &notifier, all_candidates());
    let report = monitor.run(&invocation()).await.unwrap();

    assert_eq!(report.hits, 2);
    assert_eq!(report.probed, report.candidates);
    assert_eq!(report.findings.len(), report.variants.len());

    let found: HashSet<String> = report.findings.iter().map(|v| v.domain_name.clone()).collect();
    assert!(found.is_superset(&names(&HITS)));
    assert_eq!(store.domains("ABC0"), found);
    assert_eq!(notifier.call_count(), 1);
    assert_eq!(notifier.detected(), found);
}

#[tokio::test]
async fn registered_only_reports_hits_with_their_records() {
    let prober = ScriptedProber::new().with_hits(&HITS);
    let store = RecordingHistoryStore::new();
    let notifier = RecordingNotifier::new();

    let (monitor, _events) = monitor(&prober, &store, &notifier, test_config());
    let report = monitor.run(&invocation()).await.unwrap();

    assert_eq!(store.domains("ABC0"), names(&HITS));
    assert_eq!(notifier.detected(), names(&HITS));
    assert_eq!(report.findings.len(), 2);

    let batch = &notifier.batches()[0];
    for finding in batch {
        assert_eq!(finding.original_domain, "example.com");
        assert_eq!(finding.client_code, "ABC0");
        assert_eq!(finding.raw_data["dns-a"][0], "192.0.2.10");
    }
}

#[tokio::test]
async fn squat_registered_after_first_run_is_reported() {
    let store = RecordingHistoryStore::new();
    let notifier = RecordingNotifier::new();

    let quiet = ScriptedProber::new();
    let (first, _events) = monitor(&quiet, &store, &notifier, test_config());
    let report = first.run(&invocation()).await.unwrap();

    assert_eq!(report.hits, 0);
    assert!(report.findings.is_empty());
    assert!(store.domains("ABC0").is_empty(), "unregistered candidates stay out of history");
    assert_eq!(notifier.call_count(), 0);

    let registered = ScriptedProber::new().with_hits(&["examp1e.com"]);
    let (second, _events) = monitor(&registered, &store, &notifier, test_config());
    let report = second.run(&invocation()).await.unwrap();

    let found: Vec<_> = report.findings.iter().map(|v| v.domain_name.as_str()).collect();
    assert_eq!(found, vec!["examp1e.com"]);
    assert_eq!(notifier.detected(), names(&["examp1e.com"]));
    assert_eq!(store.domains("ABC0"), names(&["examp1e.com"]));
}

#[tokio::test]
async fn known_domain_never_reappears() {
    let prober = ScriptedProber::new().with_hits(&HITS);
    let store = RecordingHistoryStore::new().with_known("ABC0", &["examp1e.com"]);
    let notifier = RecordingNotifier::new();

    let (monitor, _events) = monitor(&prober, &store, &notifier, test_config());
    let report = monitor.run(&invocation()).await.unwrap();

    let found: Vec<_> = report.findings.iter().map(|v| v.domain_name.as_str()).collect();
    assert_eq!(found, vec!["example.co"]);
    assert_eq!(notifier.detected(), names(&["example.co"]));
}

#[tokio::test]
async fn history_is_per_client() {
    let prober = ScriptedProber::new().with_hits(&HITS);
    let store = RecordingHistoryStore::new().with_known("XYZ9", &HITS);
    let notifier = RecordingNotifier::new();

    let (monitor, _events) = monitor(&prober, &store, &notifier, test_config());
    let report = monitor.run(&invocation()).await.unwrap();

    assert_eq!(report.findings.len(), 2, "another client's history must not hide findings");
}

#[tokio::test]
async fn second_run_is_quiet_and_history_only_grows() {
    let prober = ScriptedProber::new().with_hits(&HITS);
    let store = RecordingHistoryStore::new();
    let notifier = RecordingNotifier::new();

    let (first, _events) = monitor(&prober, &store, &notifier, test_config());
    first.run(&invocation()).await.unwrap();
    let after_first = store.domains("ABC0");

    let (second, _events) = monitor(&prober, &store, &notifier, test_config());
    let report = second.run(&invocation()).await.unwrap();

    assert!(report.findings.is_empty());
    assert_eq!(notifier.call_count(), 1, "an empty batch is not sent");
    assert!(store.domains("ABC0").is_superset(&after_first));
}

#[tokio::test]
async fn failed_write_is_reported_now_and_again_next_run() {
    let prober = ScriptedProber::new().with_hits(&HITS);
    let store = RecordingHistoryStore::new().with_failing_puts(&["example.co"]);
    let notifier = RecordingNotifier::new();

    let (first, _events) = monitor(&prober, &store, &notifier, test_config());
    let report = first.run(&invocation()).await.unwrap();

    assert_eq!(report.persist_failures, 1);
    assert_eq!(notifier.detected(), names(&HITS), "persist failure must not hide a finding");
    assert_eq!(store.domains("ABC0"), names(&["examp1e.com"]));

    let (second, _events) = monitor(&prober, &store, &notifier, test_config());
    let report = second.run(&invocation()).await.unwrap();

    let found: Vec<_> = report.findings.iter().map(|v| v.domain_name.as_str()).collect();
    assert_eq!(found, vec!["example.co"]);
}

#[tokio::test]
async fn notifier_failure_keeps_history() {
    let prober = ScriptedProber::new().with_hits(&HITS);
    let store = RecordingHistoryStore::new();
    let notifier = RecordingNotifier::failing();

    let (monitor, _events) = monitor(&prober, &store, &notifier, test_config());
    let report = monitor.run(&invocation()).await.unwrap();

    assert!(report.notifier_failed);
    assert_eq!(notifier.call_count(), 1, "the notifier is not retried");
    assert_eq!(store.domains("ABC0"), names(&HITS));
}

#[tokio::test]
async fn unreadable_history_is_fatal() {
    let prober = ScriptedProber::new().with_hits(&HITS);
    let store = RecordingHistoryStore::new().with_failing_scan();
    let notifier = RecordingNotifier::new();

    let (monitor, _events) = monitor(&prober, &store, &notifier, test_config());
    let result = monitor.run(&invocation()).await;

    assert!(matches!(result, Err(Error::HistoryLoad { .. })));
    assert_eq!(store.put_count(), 0);
    assert_eq!(notifier.call_count(), 0);
}

#[tokio::test]
async fn invalid_domain_fails_before_probing() {
    let prober = ScriptedProber::new();
    let store = RecordingHistoryStore::new();
    let notifier = RecordingNotifier::new();

    let (monitor, _events) = monitor(&prober, &store, &notifier, test_config());
    let result = monitor.run(&Invocation::new("not a domain", "ABC0")).await;

    assert!(matches!(result, Err(Error::InvalidInput(_))));
    assert_eq!(prober.total_calls(), 0);
    assert_eq!(store.scan_count(), 0);
}

#[tokio::test]
async fn local_mode_bypasses_history_and_notifier() {
    let prober = ScriptedProber::new().with_hits(&HITS);
    let store = RecordingHistoryStore::new();
    let notifier = RecordingNotifier::new();

    let (monitor, _events) = monitor(&prober, &store, &notifier, test_config());
    let report = monitor
        .run(&invocation().with_local_mode(true))
        .await
        .unwrap();

    assert!(report.local_mode);
    assert!(report.findings.is_empty());
    assert_eq!(report.hit_variants().count(), 2);
    assert_eq!(store.scan_count(), 0);
    assert_eq!(store.put_count(), 0);
    assert_eq!(notifier.call_count(), 0);
}

/// Run with a slow prober and signal shutdown after 50 ms
async fn run_interrupted(
    store: &RecordingHistoryStore,
    notifier: &RecordingNotifier,
    config: MonitorConfig,
) -> squatwatch_core::RunReport {
    let prober = ScriptedProber::new()
        .with_hits(&HITS)
        .with_delay(Duration::from_millis(20));
    let (monitor, _events) = monitor(&prober, store, notifier, config);
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let handle = tokio::spawn(async move {
        monitor
            .run_with_shutdown(&invocation(), Some(shutdown_rx))
            .await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown_tx.send(()).unwrap();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("monitor should stop within 5 seconds")
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn shutdown_during_probing_reports_hits_found_so_far() {
    let store = RecordingHistoryStore::new();
    let notifier = RecordingNotifier::new();

    let report = run_interrupted(&store, &notifier, test_config()).await;

    assert!(report.cancelled);
    assert!(report.unprobed > 0);
    assert_eq!(report.probed + report.unprobed, report.candidates);
    assert_eq!(store.scan_count(), 1);

    let found: HashSet<String> = report.findings.iter().map(|v| v.domain_name.clone()).collect();
    assert!(found.is_subset(&names(&HITS)));
    assert_eq!(store.domains("ABC0"), found, "only probed hits enter history");
    assert_eq!(notifier.detected(), found);
}

#[tokio::test]
async fn shutdown_without_registered_only_skips_history_and_notifier() {
    let store = RecordingHistoryStore::new();
    let notifier = RecordingNotifier::new();

    let report = run_interrupted(&store, &notifier, all_candidates()).await;

    assert!(report.cancelled);
    assert!(report.unprobed > 0);
    assert_eq!(store.scan_count(), 0);
    assert_eq!(notifier.call_count(), 0);
}

#[tokio::test]
async fn events_follow_the_run() {
    let prober = ScriptedProber::new().with_hits(&HITS);
    let store = RecordingHistoryStore::new();
    let notifier = RecordingNotifier::new();

    let (monitor, mut events) = monitor(&prober, &store, &notifier, test_config());
    monitor.run(&invocation()).await.unwrap();
    assert_eq!(store.flush_count(), 1);
    drop(monitor);

    let mut received = Vec::new();
    while let Some(event) = events.recv().await {
        received.push(event);
    }

    assert!(matches!(received.first(), Some(MonitorEvent::Started { .. })));
    assert!(matches!(received.last(), Some(MonitorEvent::Stopped { .. })));

    let phases: Vec<DiffPhase> = received
        .iter()
        .filter_map(|e| match e {
            MonitorEvent::Diff { phase } => Some(*phase),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            DiffPhase::LoadingHistory,
            DiffPhase::Comparing,
            DiffPhase::Persisting,
            DiffPhase::Done
        ]
    );
    assert!(received.contains(&MonitorEvent::FindingsReported {
        count: 2,
        notifier_failed: false
    }));
}
