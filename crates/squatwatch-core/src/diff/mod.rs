//! Novelty differ
//!
//! Compares the cleaned candidate set against a client's history, records
//! what is new and hands the new findings to the notifier.
//!
//! ## Phases
//!
//! ```text
//! LoadingHistory ──► Comparing ──► Persisting ──► Done
//! ```
//!
//! - **LoadingHistory**: one `scan_all` for the client. Failure is fatal.
//! - **Comparing**: pure set membership against the snapshot taken while
//!   loading. Writes made later in the run are not visible to it.
//! - **Persisting**: one independent `put` per novel candidate. A failed put
//!   is logged and the candidate is still reported.
//! - **Done**: a non-empty batch goes to the notifier. A notifier failure is
//!   logged and never undoes persisted records.

use std::collections::HashSet;

use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::traits::{Finding, HistoryRecord, HistoryStore, Notifier};
use crate::variant::DomainVariant;

/// Differ phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffPhase {
    LoadingHistory,
    Comparing,
    Persisting,
    Done,
}

impl std::fmt::Display for DiffPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DiffPhase::LoadingHistory => "loading-history",
            DiffPhase::Comparing => "comparing",
            DiffPhase::Persisting => "persisting",
            DiffPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result of one diff
#[derive(Debug, Clone, Default)]
pub struct DiffOutcome {
    /// Candidates absent from history (the Finding Batch)
    pub novel: Vec<DomainVariant>,
    /// Records in the history snapshot
    pub known: usize,
    /// Novel candidates whose history write failed
    pub persist_failed: Vec<String>,
    /// Whether the batch was handed to the notifier
    pub notified: bool,
    /// Whether the notifier returned an error
    pub notifier_failed: bool,
}

/// Candidates of `variants` whose domain is not in `known`
///
/// Pure. Preserves input order; a domain repeated in the input is returned
/// once.
pub fn compare(known: &HashSet<String>, variants: &[DomainVariant]) -> Vec<DomainVariant> {
    let mut seen = HashSet::new();
    variants
        .iter()
        .filter(|v| !known.contains(&v.domain_name) && seen.insert(v.domain_name.as_str()))
        .cloned()
        .collect()
}

/// Diffs candidates against one store and notifies one sink
pub struct NoveltyDiffer<'a> {
    history: &'a dyn HistoryStore,
    notifier: &'a dyn Notifier,
}

impl<'a> NoveltyDiffer<'a> {
    pub fn new(history: &'a dyn HistoryStore, notifier: &'a dyn Notifier) -> Self {
        Self { history, notifier }
    }

    /// Run all phases for one client
    ///
    /// `on_phase` is called on entry to each phase.
    ///
    /// # Errors
    ///
    /// Only `Error::HistoryLoad` (or whatever `scan_all` returns). Persist and
    /// notifier failures are reported in the outcome.
    pub async fn run<F>(
        &self,
        original_domain: &str,
        client_code: &str,
        variants: &[DomainVariant],
        mut on_phase: F,
    ) -> Result<DiffOutcome>
    where
        F: FnMut(DiffPhase) + Send,
    {
        on_phase(DiffPhase::LoadingHistory);
        let known: HashSet<String> = self
            .history
            .scan_all(client_code)
            .await?
            .into_iter()
            .map(|record| record.domain_name)
            .collect();
        debug!("History for {}: {} known variants", client_code, known.len());

        on_phase(DiffPhase::Comparing);
        let novel = compare(&known, variants);
        info!(
            "{} of {} candidates are new for {}",
            novel.len(),
            variants.len(),
            client_code
        );

        on_phase(DiffPhase::Persisting);
        let mut persist_failed = Vec::new();
        for variant in &novel {
            let record = HistoryRecord::new(variant, original_domain, client_code);
            if let Err(e) = self.history.put(&record).await {
                warn!("{} (will still be reported)", e);
                persist_failed.push(variant.domain_name.clone());
            }
        }

        on_phase(DiffPhase::Done);
        let mut outcome = DiffOutcome {
            known: known.len(),
            persist_failed,
            ..DiffOutcome::default()
        };

        if !novel.is_empty() {
            let findings: Vec<Finding> = novel
                .iter()
                .map(|v| Finding::new(v, original_domain, client_code))
                .collect();

            outcome.notified = true;
            match self.notifier.notify(&findings).await {
                Ok(()) => info!(
                    "Reported {} finding(s) via {}",
                    findings.len(),
                    self.notifier.notifier_name()
                ),
                Err(e) => {
                    error!("Failed to report {} finding(s): {}", findings.len(), e);
                    outcome.notifier_failed = true;
                }
            }
        }

        outcome.novel = novel;
        Ok(outcome)
    }
}
