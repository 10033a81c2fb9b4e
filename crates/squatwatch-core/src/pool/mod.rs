//! Probe worker pool
//!
//! A fixed set of tokio tasks pulling candidates from one shared queue.
//!
//! ## Lifecycle
//!
//! ```text
//! start(candidates) ──► workers pull / probe / push ──► is_drained() ──► stop()
//!                                   │                                      │
//!                                   └──── stop() mid-run ──────────────────┘
//! ```
//!
//! 1. [`ProbePool::start`] enqueues every candidate and spawns the workers.
//!    The returned pool owns the worker handles.
//! 2. The caller polls [`ProbePool::is_drained`] (queue empty *and* no probe
//!    in flight) and may sample [`ProbePool::progress`] meanwhile.
//! 3. [`ProbePool::stop`] signals the workers, awaits every handle and hands
//!    back the probed candidates. Called before drain, it leaves the rest of
//!    the queue unprobed; those candidates are counted, not returned.
//!
//! ## Invariants
//!
//! - A candidate is popped at most once, under the queue lock, and owned by
//!   the popping worker until it is pushed to the result set.
//! - The in-flight counter is raised while the queue lock is held, so an
//!   observer holding the lock never sees "queue empty, nothing in flight"
//!   while a popped candidate is still being probed.
//! - A probe error is not retried; the candidate is kept without records.
//! - Each probe runs in its own task, so a panicking prober costs that one
//!   probe (counted as an error) and never the worker or the candidate.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_stream::Stream;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, warn};

use crate::traits::Prober;
use crate::variant::DomainVariant;

/// Snapshot of pool progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolProgress {
    /// Candidates enqueued at start
    pub total: usize,
    /// Candidates taken off the queue
    pub dequeued: usize,
    /// Candidates whose probe has returned
    pub completed: usize,
}

impl PoolProgress {
    /// Percentage of the queue drained
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            100
        } else {
            (self.dequeued * 100 / self.total) as u32
        }
    }
}

/// What a stopped pool hands back
#[derive(Debug, Default)]
pub struct PoolOutcome {
    /// Candidates whose probe returned (with or without records)
    pub probed: Vec<DomainVariant>,
    /// Candidates left on the queue by an early stop
    pub unprobed: usize,
    /// Probes that returned an error
    pub probe_errors: usize,
}

struct Shared {
    queue: Mutex<VecDeque<DomainVariant>>,
    results: Mutex<Vec<DomainVariant>>,
    in_flight: AtomicUsize,
    probe_errors: AtomicUsize,
    progress: watch::Sender<PoolProgress>,
}

/// Decrements the in-flight counter even if the probe panics
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Bounded pool of probe workers
pub struct ProbePool {
    shared: Arc<Shared>,
    stop_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl ProbePool {
    /// Enqueue `candidates` and spawn up to `workers` workers
    ///
    /// No more workers than candidates are spawned. Must be called from
    /// within a tokio runtime.
    pub fn start(candidates: Vec<DomainVariant>, prober: Arc<dyn Prober>, workers: usize) -> Self {
        let total = candidates.len();
        let (progress, _) = watch::channel(PoolProgress {
            total,
            ..PoolProgress::default()
        });

        let shared = Arc::new(Shared {
            queue: Mutex::new(candidates.into()),
            results: Mutex::new(Vec::with_capacity(total)),
            in_flight: AtomicUsize::new(0),
            probe_errors: AtomicUsize::new(0),
            progress,
        });

        let (stop_tx, stop_rx) = watch::channel(false);
        let worker_count = workers.min(total);

        let handles = (0..worker_count)
            .map(|id| {
                let shared = Arc::clone(&shared);
                let prober = Arc::clone(&prober);
                let stop_rx = stop_rx.clone();
                tokio::spawn(async move { worker_loop(id, shared, prober, stop_rx).await })
            })
            .collect();

        debug!(
            "Probe pool started: {} candidates, {} workers ({})",
            total,
            worker_count,
            prober.prober_name()
        );

        Self {
            shared,
            stop_tx,
            handles,
        }
    }

    /// Number of spawned workers
    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// Current progress
    pub fn progress(&self) -> PoolProgress {
        *self.shared.progress.borrow()
    }

    /// Progress updates as a stream
    pub fn progress_stream(&self) -> impl Stream<Item = PoolProgress> + Send + 'static {
        WatchStream::new(self.shared.progress.subscribe())
    }

    /// True when the queue is empty and no probe is in flight
    pub async fn is_drained(&self) -> bool {
        let queue = self.shared.queue.lock().await;
        queue.is_empty() && self.shared.in_flight.load(Ordering::SeqCst) == 0
    }

    /// Stop the workers and collect results
    ///
    /// Workers finish their current probe and exit. Anything still queued is
    /// reported as `unprobed`.
    pub async fn stop(self) -> PoolOutcome {
        // Err only means every worker already exited
        let _ = self.stop_tx.send(true);

        for (id, handle) in self.handles.into_iter().enumerate() {
            if let Err(e) = handle.await {
                warn!("Probe worker {} ended abnormally: {}", id, e);
            }
        }

        let unprobed = self.shared.queue.lock().await.len();
        let probed = std::mem::take(&mut *self.shared.results.lock().await);
        let probe_errors = self.shared.probe_errors.load(Ordering::SeqCst);

        if unprobed > 0 {
            debug!("Probe pool stopped with {} candidates unprobed", unprobed);
        }

        PoolOutcome {
            probed,
            unprobed,
            probe_errors,
        }
    }

    /// Wait for drain, polling every `interval`, then stop
    pub async fn drain(self, interval: std::time::Duration) -> PoolOutcome {
        while !self.is_drained().await {
            tokio::time::sleep(interval).await;
        }
        self.stop().await
    }
}

async fn worker_loop(
    id: usize,
    shared: Arc<Shared>,
    prober: Arc<dyn Prober>,
    stop_rx: watch::Receiver<bool>,
) {
    loop {
        if *stop_rx.borrow() {
            debug!("Probe worker {} stopping", id);
            break;
        }

        let next = {
            let mut queue = shared.queue.lock().await;
            let next = queue.pop_front();
            if next.is_some() {
                shared.in_flight.fetch_add(1, Ordering::SeqCst);
            }
            next
        };

        let Some(mut variant) = next else {
            break;
        };

        let _in_flight = InFlight(&shared.in_flight);
        shared.progress.send_modify(|p| p.dequeued += 1);

        let probe = {
            let prober = Arc::clone(&prober);
            let candidate = variant.clone();
            tokio::spawn(async move { prober.probe(&candidate).await })
        };

        match probe.await {
            Ok(Ok(records)) => variant.apply(records),
            Ok(Err(e)) => {
                shared.probe_errors.fetch_add(1, Ordering::SeqCst);
                debug!("{}", e);
            }
            Err(e) => {
                shared.probe_errors.fetch_add(1, Ordering::SeqCst);
                warn!("Probe for {} aborted: {}", variant.domain_name, e);
            }
        }

        shared.results.lock().await.push(variant);
        shared.progress.send_modify(|p| p.completed += 1);
    }
}
