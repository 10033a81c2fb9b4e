//! Core traits for the squatwatch system
//!
//! This module defines the abstract interfaces that collaborators implement.
//!
//! - [`Prober`]: Look up DNS/WHOIS records for a candidate
//! - [`HistoryStore`]: Durable per-client record of known variants
//! - [`Notifier`]: Deliver a Finding Batch downstream

pub mod history_store;
pub mod notifier;
pub mod prober;

pub use history_store::{HistoryRecord, HistoryStore, HistoryStoreFactory};
pub use notifier::{Finding, Notifier, NotifierFactory};
pub use prober::{Prober, ProberFactory};
