//! Plugin registry
//!
//! Maps type names to factories so probers, history stores and notifiers can
//! be chosen from configuration without hard-coded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use squatwatch_core::registry::PluginRegistry;
//!
//! let registry = PluginRegistry::with_builtins();
//! squatwatch_probe_dns::register(&registry);
//!
//! let prober = registry.create_prober(&config.probe)?;
//! let history = registry.create_history_store(&config.history)?;
//! ```
//!
//! ## Registration
//!
//! Plugin crates expose a `register` function:
//!
//! ```rust,ignore
//! pub fn register(registry: &PluginRegistry) {
//!     registry.register_notifier("webhook", Box::new(WebhookNotifierFactory));
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::{HistoryStoreConfig, NotifierConfig, ProbeConfig};
use crate::error::{Error, Result};
use crate::history::{FileHistoryStoreFactory, MemoryHistoryStoreFactory};
use crate::notify::LogNotifierFactory;
use crate::traits::{HistoryStore, HistoryStoreFactory, Notifier, NotifierFactory, Prober, ProberFactory};

/// Registry of collaborator factories
///
/// Uses interior mutability, so plugins can register through a shared
/// reference.
#[derive(Default)]
pub struct PluginRegistry {
    probers: RwLock<HashMap<String, Box<dyn ProberFactory>>>,
    history_stores: RwLock<HashMap<String, Box<dyn HistoryStoreFactory>>>,
    notifiers: RwLock<HashMap<String, Box<dyn NotifierFactory>>>,
}

impl PluginRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the memory and file history stores and the
    /// log notifier registered
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_history_store("memory", Box::new(MemoryHistoryStoreFactory));
        registry.register_history_store("file", Box::new(FileHistoryStoreFactory));
        registry.register_notifier("log", Box::new(LogNotifierFactory));
        registry
    }

    /// Register a prober factory under `name` (e.g. "dns")
    pub fn register_prober(&self, name: impl Into<String>, factory: Box<dyn ProberFactory>) {
        self.probers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), factory);
    }

    /// Register a history store factory under `name` (e.g. "file")
    pub fn register_history_store(
        &self,
        name: impl Into<String>,
        factory: Box<dyn HistoryStoreFactory>,
    ) {
        self.history_stores
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), factory);
    }

    /// Register a notifier factory under `name` (e.g. "webhook")
    pub fn register_notifier(&self, name: impl Into<String>, factory: Box<dyn NotifierFactory>) {
        self.notifiers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), factory);
    }

    /// Create a prober from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Arc<dyn Prober>)`: Created prober, shareable across workers
    /// - `Err(Error::Config)`: Prober type not registered, or creation failed
    pub fn create_prober(&self, config: &ProbeConfig) -> Result<Arc<dyn Prober>> {
        let probers = self.probers.read().unwrap_or_else(PoisonError::into_inner);
        let factory = probers
            .get(&config.prober)
            .ok_or_else(|| Error::config(format!("Unknown prober type: {}", config.prober)))?;
        factory.create(config)
    }

    /// Create a history store from configuration
    pub fn create_history_store(&self, config: &HistoryStoreConfig) -> Result<Box<dyn HistoryStore>> {
        let store_type = config.type_name();
        let stores = self
            .history_stores
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let factory = stores
            .get(store_type)
            .ok_or_else(|| Error::config(format!("Unknown history store type: {}", store_type)))?;
        factory.create(config)
    }

    /// Create a notifier from configuration
    pub fn create_notifier(&self, config: &NotifierConfig) -> Result<Box<dyn Notifier>> {
        let notifier_type = config.type_name();
        let notifiers = self.notifiers.read().unwrap_or_else(PoisonError::into_inner);
        let factory = notifiers
            .get(notifier_type)
            .ok_or_else(|| Error::config(format!("Unknown notifier type: {}", notifier_type)))?;
        factory.create(config)
    }

    /// Registered prober types
    pub fn list_probers(&self) -> Vec<String> {
        keys(&self.probers)
    }

    /// Registered history store types
    pub fn list_history_stores(&self) -> Vec<String> {
        keys(&self.history_stores)
    }

    /// Registered notifier types
    pub fn list_notifiers(&self) -> Vec<String> {
        keys(&self.notifiers)
    }

    pub fn has_prober(&self, name: &str) -> bool {
        self.probers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn has_history_store(&self, name: &str) -> bool {
        self.history_stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn has_notifier(&self, name: &str) -> bool {
        self.notifiers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }
}

fn keys<T: ?Sized>(map: &RwLock<HashMap<String, Box<T>>>) -> Vec<String> {
    let mut names: Vec<String> = map
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .keys()
        .cloned()
        .collect();
    names.sort();
    names
}
