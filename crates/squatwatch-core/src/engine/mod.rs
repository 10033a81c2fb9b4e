//! Monitoring engine
//!
//! The Monitor runs one pass of the pipeline for one invocation:
//!
//! ```text
//! ┌───────────┐   ┌───────────┐   ┌────────────┐   ┌──────────────┐
//! │ Generator │──►│ ProbePool │──►│ Aggregator │──►│ NoveltyDiffer│──► Notifier
//! └───────────┘   └───────────┘   └────────────┘   └──────────────┘
//!                       │                                 │
//!                    Prober                          HistoryStore
//! ```
//!
//! ## Run Flow
//!
//! 1. Validate the invocation and generate candidates (fatal on bad input)
//! 2. Start the probe pool and poll until it drains, logging progress
//! 3. Stop the pool and aggregate hit statistics
//! 4. Local mode: log the hits and stop here
//! 5. Otherwise diff against history, persist, notify (only candidates with
//!    DNS records when `registered_only` is set)
//!
//! A shutdown signal during probing stops the pool early and the partial
//! result is aggregated. With `registered_only` the hits found so far are
//! still diffed and reported; otherwise history and notifier are not touched,
//! since unprobed candidates would be recorded as unregistered.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, info, warn};

use crate::aggregate::aggregate;
use crate::config::MonitorConfig;
use crate::diff::{DiffPhase, NoveltyDiffer};
use crate::error::Result;
use crate::fuzz::DomainFuzzer;
use crate::invocation::Invocation;
use crate::pool::{PoolOutcome, ProbePool};
use crate::traits::{HistoryStore, Notifier, Prober};
use crate::variant::DomainVariant;

/// Events emitted by the Monitor
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// Run started
    Started {
        original_domain: String,
        client_code: String,
        candidates: usize,
    },

    /// Probe progress crossed another reporting step
    Progress { percent: u32, dequeued: usize, total: usize },

    /// Probe pool stopped
    ProbingFinished { probed: usize, unprobed: usize },

    /// Hit statistics computed
    Aggregated { hits: usize, total: usize, hit_rate: f64 },

    /// Differ entered a phase
    Diff { phase: DiffPhase },

    /// A novel variant could not be written to history
    PersistenceFailed { domain: String },

    /// Findings were handed to the notifier
    FindingsReported { count: usize, notifier_failed: bool },

    /// Run finished
    Stopped { reason: String },
}

/// Outcome of one monitoring run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Parsed root host
    pub original_domain: String,
    pub client_code: String,
    /// Candidates generated
    pub candidates: usize,
    /// Candidates probed
    pub probed: usize,
    /// Candidates left unprobed by a shutdown
    pub unprobed: usize,
    /// Probes that returned an error
    pub probe_errors: usize,
    /// Candidates with at least one A or NS record
    pub hits: usize,
    /// `hits / probed`
    pub hit_rate: f64,
    /// Cleaned candidate list
    pub variants: Vec<DomainVariant>,
    /// The Finding Batch
    pub findings: Vec<DomainVariant>,
    /// Findings whose history write failed
    pub persist_failures: usize,
    /// Whether the notifier returned an error
    pub notifier_failed: bool,
    pub local_mode: bool,
    pub cancelled: bool,
}

impl RunReport {
    /// Cleaned candidates with DNS records
    pub fn hit_variants(&self) -> impl Iterator<Item = &DomainVariant> {
        self.variants.iter().filter(|v| v.is_hit())
    }
}

/// Typosquatting monitor
///
/// ## Lifecycle
///
/// 1. Create with [`Monitor::new()`]
/// 2. Call [`Monitor::run()`] once per invocation
///
/// The Monitor keeps no state between runs apart from what its history
/// store persists.
pub struct Monitor {
    prober: Arc<dyn Prober>,
    history: Box<dyn HistoryStore>,
    notifier: Box<dyn Notifier>,
    workers: usize,
    poll_interval: Duration,
    progress_step: u32,
    registered_only: bool,
    event_tx: mpsc::Sender<MonitorEvent>,
}

impl Monitor {
    /// Create a new monitor
    ///
    /// # Returns
    ///
    /// A tuple of (monitor, event_receiver) where event_receiver yields
    /// monitor events
    pub fn new(
        prober: Arc<dyn Prober>,
        history: Box<dyn HistoryStore>,
        notifier: Box<dyn Notifier>,
        config: MonitorConfig,
    ) -> Result<(Self, mpsc::Receiver<MonitorEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let monitor = Self {
            prober,
            history,
            notifier,
            workers: config.probe.concurrency(),
            poll_interval: config.engine.poll_interval(),
            progress_step: config.engine.progress_step_percent.max(1),
            registered_only: config.engine.registered_only,
            event_tx: tx,
        };

        Ok((monitor, rx))
    }

    /// Run one monitoring pass
    ///
    /// Ctrl-C during probing cancels the run.
    ///
    /// # Returns
    ///
    /// - `Ok(RunReport)`: Run completed (possibly with recoverable failures)
    /// - `Err(Error)`: Fatal error (`InvalidInput`, `HistoryLoad`)
    pub async fn run(&self, invocation: &Invocation) -> Result<RunReport> {
        self.run_internal(invocation, None).await
    }

    /// Run one pass with a programmatic shutdown signal instead of Ctrl-C
    ///
    /// Dropping the sender does not cancel the run. A signal during probing
    /// stops the pool and marks the report `cancelled`. The candidates probed
    /// so far are still diffed when `registered_only` is set; otherwise
    /// history and notifier are skipped.
    pub async fn run_with_shutdown(
        &self,
        invocation: &Invocation,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<RunReport> {
        self.run_internal(invocation, shutdown_rx).await
    }

    async fn run_internal(
        &self,
        invocation: &Invocation,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<RunReport> {
        invocation.validate()?;
        let fuzzer = DomainFuzzer::new(&invocation.original_domain)?;
        let root = fuzzer.root().host().to_string();
        let client = invocation.client_code.as_str();

        let candidates = fuzzer.generate();
        info!(
            "Monitoring {} for {}: {} candidates",
            root,
            client,
            candidates.len()
        );
        self.emit_event(MonitorEvent::Started {
            original_domain: root.clone(),
            client_code: client.to_string(),
            candidates: candidates.len(),
        });

        let mut report = RunReport {
            original_domain: root.clone(),
            client_code: client.to_string(),
            candidates: candidates.len(),
            local_mode: invocation.local_mode,
            ..RunReport::default()
        };

        let pool = ProbePool::start(candidates, Arc::clone(&self.prober), self.workers);
        let (outcome, cancelled) = self.await_pool(pool, shutdown_rx).await;

        report.probed = outcome.probed.len();
        report.unprobed = outcome.unprobed;
        report.probe_errors = outcome.probe_errors;
        report.cancelled = cancelled;
        self.emit_event(MonitorEvent::ProbingFinished {
            probed: report.probed,
            unprobed: report.unprobed,
        });
        if outcome.probe_errors > 0 {
            debug!("{} probes failed and were treated as no records", outcome.probe_errors);
        }

        let aggregated = aggregate(outcome.probed);
        info!(
            "Found {} registered variants of {} ({:.1}% of {})",
            aggregated.hits,
            root,
            aggregated.hit_percent(),
            aggregated.total
        );
        self.emit_event(MonitorEvent::Aggregated {
            hits: aggregated.hits,
            total: aggregated.total,
            hit_rate: aggregated.hit_rate(),
        });
        report.hits = aggregated.hits;
        report.hit_rate = aggregated.hit_rate();
        report.variants = aggregated.variants;

        if cancelled && !self.registered_only {
            warn!(
                "Run for {} cancelled with {} candidates unprobed; history and notifier skipped",
                root, report.unprobed
            );
            self.emit_event(MonitorEvent::Stopped {
                reason: "Shutdown signal".to_string(),
            });
            return Ok(report);
        }

        if invocation.local_mode {
            for variant in report.hit_variants() {
                info!("{} ({}): {}", variant.domain_name, variant.fuzzer, variant.to_json());
            }
            self.emit_event(MonitorEvent::Stopped {
                reason: "Local mode".to_string(),
            });
            return Ok(report);
        }

        let registered: Vec<DomainVariant>;
        let diff_input: &[DomainVariant] = if self.registered_only {
            registered = report.hit_variants().cloned().collect();
            &registered
        } else {
            &report.variants
        };

        let differ = NoveltyDiffer::new(self.history.as_ref(), self.notifier.as_ref());
        let diff = differ
            .run(&root, client, diff_input, |phase| {
                self.emit_event(MonitorEvent::Diff { phase })
            })
            .await?;

        for domain in &diff.persist_failed {
            self.emit_event(MonitorEvent::PersistenceFailed {
                domain: domain.clone(),
            });
        }
        if diff.notified {
            self.emit_event(MonitorEvent::FindingsReported {
                count: diff.novel.len(),
                notifier_failed: diff.notifier_failed,
            });
        }

        if let Err(e) = self.history.flush().await {
            warn!("Failed to flush history: {}", e);
        }

        info!("{} new finding(s) for {}", diff.novel.len(), client);
        report.persist_failures = diff.persist_failed.len();
        report.notifier_failed = diff.notifier_failed;
        report.findings = diff.novel;

        self.emit_event(MonitorEvent::Stopped {
            reason: if cancelled { "Shutdown signal" } else { "Completed" }.to_string(),
        });
        Ok(report)
    }

    /// Poll the pool until drained or shut down, then stop it
    ///
    /// Returns the pool outcome and whether shutdown cut probing short.
    async fn await_pool(
        &self,
        pool: ProbePool,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> (PoolOutcome, bool) {
        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    if rx.await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        warn!("Cannot listen for Ctrl-C: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
        };
        tokio::pin!(shutdown);

        let mut ticks = IntervalStream::new(tokio::time::interval(self.poll_interval));
        let mut last_logged = 0;
        let mut cancelled = false;

        loop {
            tokio::select! {
                Some(_) = ticks.next() => {
                    if pool.is_drained().await {
                        break;
                    }
                    let progress = pool.progress();
                    let percent = progress.percent();
                    if percent >= last_logged + self.progress_step {
                        info!("Probing progress: {}%", percent);
                        self.emit_event(MonitorEvent::Progress {
                            percent,
                            dequeued: progress.dequeued,
                            total: progress.total,
                        });
                        last_logged = percent - percent % self.progress_step;
                    }
                }

                _ = &mut shutdown => {
                    info!("Shutdown signal received, stopping probe pool");
                    cancelled = true;
                    break;
                }
            }
        }

        (pool.stop().await, cancelled)
    }

    /// Emit a monitor event
    fn emit_event(&self, event: MonitorEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // nobody is listening
            Err(TrySendError::Closed(_)) => {}
        }
    }
}
