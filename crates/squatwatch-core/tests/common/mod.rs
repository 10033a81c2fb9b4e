//! Test doubles and common utilities for contract tests
//!
//! The doubles share their counters through `Arc`, so a clone handed to the
//! `Monitor` can be inspected from the test afterwards.

#![allow(dead_code)]

use squatwatch_core::config::{EngineConfig, MonitorConfig, ProbeConfig};
use squatwatch_core::error::{Error, Result};
use squatwatch_core::traits::{Finding, HistoryRecord, HistoryStore, Notifier, Prober};
use squatwatch_core::variant::{DomainVariant, ProbeRecords};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A prober that answers from a script and records every call
#[derive(Clone, Default)]
pub struct ScriptedProber {
    /// Records returned per domain; unknown domains get no records
    answers: Arc<HashMap<String, ProbeRecords>>,
    /// Domains whose probe returns an error
    failing: Arc<HashSet<String>>,
    /// Artificial latency per probe
    delay: Duration,
    /// Probe count per domain
    calls: Arc<Mutex<HashMap<String, usize>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl ScriptedProber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `domains` with one A record each
    pub fn with_hits(mut self, domains: &[&str]) -> Self {
        let mut answers = (*self.answers).clone();
        for domain in domains {
            answers.insert(
                domain.to_string(),
                ProbeRecords {
                    dns_a: vec!["192.0.2.10".to_string()],
                    ..ProbeRecords::default()
                },
            );
        }
        self.answers = Arc::new(answers);
        self
    }

    /// Fail the probe for `domains`
    pub fn with_failures(mut self, domains: &[&str]) -> Self {
        let mut failing = (*self.failing).clone();
        failing.extend(domains.iter().map(|d| d.to_string()));
        self.failing = Arc::new(failing);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// How often each domain was probed
    pub fn calls(&self) -> HashMap<String, usize> {
        self.calls.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    /// Highest number of concurrent probes observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, variant: &DomainVariant) -> Result<ProbeRecords> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        *self
            .calls
            .lock()
            .unwrap()
            .entry(variant.domain_name.clone())
            .or_default() += 1;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&variant.domain_name) {
            return Err(Error::probe(&variant.domain_name, "SERVFAIL"));
        }
        Ok(self
            .answers
            .get(&variant.domain_name)
            .cloned()
            .unwrap_or_default())
    }

    fn prober_name(&self) -> &'static str {
        "scripted"
    }
}

/// A history store that records calls and can be told to fail
#[derive(Clone, Default)]
pub struct RecordingHistoryStore {
    records: Arc<Mutex<HashMap<String, Vec<HistoryRecord>>>>,
    failing_puts: Arc<HashSet<String>>,
    fail_scan: bool,
    scan_count: Arc<AtomicUsize>,
    put_count: Arc<AtomicUsize>,
    flush_count: Arc<AtomicUsize>,
}

impl RecordingHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate history for a client
    pub fn with_known(self, client: &str, domains: &[&str]) -> Self {
        {
            let mut records = self.records.lock().unwrap();
            let entry = records.entry(client.to_string()).or_default();
            for domain in domains {
                entry.push(HistoryRecord::new(
                    &DomainVariant::new("seed", *domain),
                    "example.com",
                    client,
                ));
            }
        }
        self
    }

    /// Make `put` fail for `domains`
    pub fn with_failing_puts(mut self, domains: &[&str]) -> Self {
        self.failing_puts = Arc::new(domains.iter().map(|d| d.to_string()).collect());
        self
    }

    /// Make `scan_all` fail
    pub fn with_failing_scan(mut self) -> Self {
        self.fail_scan = true;
        self
    }

    /// Domains recorded for a client
    pub fn domains(&self, client: &str) -> HashSet<String> {
        self.records
            .lock()
            .unwrap()
            .get(client)
            .map(|r| r.iter().map(|r| r.domain_name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn scan_count(&self) -> usize {
        self.scan_count.load(Ordering::SeqCst)
    }

    pub fn put_count(&self) -> usize {
        self.put_count.load(Ordering::SeqCst)
    }

    pub fn flush_count(&self) -> usize {
        self.flush_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl HistoryStore for RecordingHistoryStore {
    async fn scan_all(&self, client_id: &str) -> Result<Vec<HistoryRecord>> {
        self.scan_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_scan {
            return Err(Error::history_load(client_id, "table unavailable"));
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(client_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn put(&self, record: &HistoryRecord) -> Result<()> {
        self.put_count.fetch_add(1, Ordering::SeqCst);
        if self.failing_puts.contains(&record.domain_name) {
            return Err(Error::persistence(&record.domain_name, "write throttled"));
        }
        let mut records = self.records.lock().unwrap();
        let entry = records.entry(record.client_id.clone()).or_default();
        if !entry.iter().any(|r| r.domain_name == record.domain_name) {
            entry.push(record.clone());
        }
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.flush_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A notifier that records every batch it receives
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    batches: Arc<Mutex<Vec<Vec<Finding>>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier that records the batch, then reports failure
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn batches(&self) -> Vec<Vec<Finding>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    /// Detected domains across all batches
    pub fn detected(&self) -> HashSet<String> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .map(|f| f.detected_domain.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, findings: &[Finding]) -> Result<()> {
        self.batches.lock().unwrap().push(findings.to_vec());
        if self.fail {
            return Err(Error::notifier("recording", "endpoint returned 503"));
        }
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "recording"
    }
}

/// Candidates named `c0.com` .. `c{n-1}.com`
pub fn candidates(n: usize) -> Vec<DomainVariant> {
    (0..n)
        .map(|i| DomainVariant::new("test", format!("c{}.com", i)))
        .collect()
}

/// A config with a small pool and fast polling
pub fn test_config() -> MonitorConfig {
    MonitorConfig {
        probe: ProbeConfig {
            base_workers: 4,
            worker_multiplier: 2,
            ..ProbeConfig::default()
        },
        engine: EngineConfig {
            poll_interval_ms: 5,
            progress_step_percent: 15,
            event_channel_capacity: 1000,
            registered_only: true,
        },
        ..MonitorConfig::default()
    }
}
