// # squatwatch-core
//
// Core library for the squatwatch typosquatting monitor.
//
// ## Architecture Overview
//
// One monitoring run for one (root domain, client) pair:
// - **fuzz**: Generates lexical variants of the root domain
// - **pool**: Probes every variant concurrently through a `Prober`
// - **aggregate**: Computes hit statistics and drops malformed candidates
// - **diff**: Compares against a `HistoryStore`, persists and notifies
// - **engine**: `Monitor`, which wires the stages together
// - **registry**: Plugin registry for probers, history stores and notifiers
//
// ## Design Principles
//
// 1. **Library-First**: The daemon is a thin shell over `Monitor`
// 2. **Plugin-Based**: DNS probing and external notifiers live in their own
//    crates and register factories by name
// 3. **Append-Only History**: A variant is reported the first time it is
//    seen and recorded so it is not reported again
// 4. **Degrade, Don't Abort**: Probe, persistence and notifier failures are
//    logged; only bad input and unreadable history end a run

pub mod aggregate;
pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod fuzz;
pub mod history;
pub mod invocation;
pub mod notify;
pub mod pool;
pub mod registry;
pub mod traits;
pub mod variant;

// Re-export core types for convenience
pub use config::{HistoryStoreConfig, MonitorConfig, NotifierConfig, ProbeConfig};
pub use engine::{Monitor, MonitorEvent, RunReport};
pub use error::{Error, Result};
pub use history::{FileHistoryStore, MemoryHistoryStore};
pub use invocation::Invocation;
pub use notify::LogNotifier;
pub use registry::PluginRegistry;
pub use traits::{Finding, HistoryRecord, HistoryStore, Notifier, Prober};
pub use variant::{DomainVariant, ProbeRecords};
