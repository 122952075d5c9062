//! Plugin registries
//!
//! - [`ClientRegistry`] maps provider type names to API client factories, so
//!   provider crates plug themselves in without the host hard-coding them.
//! - [`StrategyRegistry`] maps resource kinds to their strategies.
//!
//! ## Registration
//!
//! Provider crates expose a `register()` function:
//!
//! ```rust,ignore
//! // In zonesync-provider-regru
//! pub fn register(registry: &ClientRegistry) {
//!     registry.register_client("regru", Box::new(RegruFactory));
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::resource::ResourceKind;
use crate::strategy::default_strategy;
use crate::traits::{DnsApiClient, DnsApiClientFactory, RecordStrategy};

/// Registry of API client factories
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<String, Box<dyn DnsApiClientFactory>>>,
}

impl ClientRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an API client factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "regru")
    /// - `factory`: Factory object for creating client instances
    pub fn register_client(&self, name: impl Into<String>, factory: Box<dyn DnsApiClientFactory>) {
        let mut clients = self.clients.write().unwrap_or_else(PoisonError::into_inner);
        clients.insert(name.into(), factory);
    }

    /// Create an API client from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn DnsApiClient>)`: Created client instance
    /// - `Err(Error)`: If the provider type is not registered or creation fails
    pub fn create_client(&self, config: &ProviderConfig) -> Result<Box<dyn DnsApiClient>> {
        let provider_type = config.type_name();
        let clients = self.clients.read().unwrap_or_else(PoisonError::into_inner);

        let factory = clients
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// List all registered provider types
    pub fn list_clients(&self) -> Vec<String> {
        let clients = self.clients.read().unwrap_or_else(PoisonError::into_inner);
        clients.keys().cloned().collect()
    }

    /// Check if a provider type is registered
    pub fn has_client(&self, name: &str) -> bool {
        let clients = self.clients.read().unwrap_or_else(PoisonError::into_inner);
        clients.contains_key(name)
    }
}

/// Registry of record strategies keyed by resource kind
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: RwLock<HashMap<ResourceKind, Arc<dyn RecordStrategy>>>,
}

impl StrategyRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in strategy for every kind
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        for kind in ResourceKind::ALL {
            registry.register(default_strategy(kind));
        }
        registry
    }

    /// Register a strategy under its own kind, replacing any previous one
    pub fn register(&self, strategy: Arc<dyn RecordStrategy>) {
        let mut strategies = self.strategies.write().unwrap_or_else(PoisonError::into_inner);
        strategies.insert(strategy.kind(), strategy);
    }

    /// Look up the strategy for a kind
    ///
    /// # Returns
    ///
    /// - `Ok(strategy)`: registered strategy
    /// - `Err(Error::Unsupported)`: no strategy registered for `kind`
    pub fn get(&self, kind: ResourceKind) -> Result<Arc<dyn RecordStrategy>> {
        let strategies = self.strategies.read().unwrap_or_else(PoisonError::into_inner);
        strategies
            .get(&kind)
            .cloned()
            .ok_or_else(|| Error::unsupported("any operation", kind.to_string()))
    }

    /// Check if a kind has a strategy
    pub fn has(&self, kind: ResourceKind) -> bool {
        let strategies = self.strategies.read().unwrap_or_else(PoisonError::into_inner);
        strategies.contains_key(&kind)
    }

    /// Registered kinds in a stable order
    pub fn kinds(&self) -> Vec<ResourceKind> {
        let strategies = self.strategies.read().unwrap_or_else(PoisonError::into_inner);
        let mut kinds: Vec<ResourceKind> = strategies.keys().copied().collect();
        kinds.sort();
        kinds
    }
}
