use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use crate::config::StoreLocation;
use crate::error::SessionError;
use crate::traits::ClientStore;

/// Constructor of a [`ClientStore`], invoked at most once per location.
pub type StoreFactory = Arc<dyn Fn() -> anyhow::Result<Arc<dyn ClientStore>> + Send + Sync>;

/// Store built for one location. Locked while its factory runs.
type ResolveSlot = Arc<Mutex<Option<Arc<dyn ClientStore>>>>;

// ---------------------------------------------------------------------------
// ClientStoreRegistry
// ---------------------------------------------------------------------------

/// Registry of client store implementations keyed by model location.
///
/// Hosts register a factory under the key of their [`StoreLocation`]
/// (`<base>/<ms_path>/models/client`). [`resolve`](Self::resolve) builds the
/// store once and hands out the same instance afterwards.
pub struct ClientStoreRegistry {
    /// Location key -> factory.
    factories: DashMap<String, StoreFactory>,
    /// Location key -> store built by a successful `resolve()`.
    resolved: DashMap<String, ResolveSlot>,
    /// Location keys in first-registration order.
    order: RwLock<Vec<String>>,
}

impl ClientStoreRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: DashMap::new(),
            resolved: DashMap::new(),
            order: RwLock::new(Vec::new()),
        }
    }

    /// Register a factory for `location`. Replaces any earlier registration
    /// and forgets a store already built for it.
    pub fn register<F>(&self, location: &StoreLocation, factory: F)
    where
        F: Fn() -> anyhow::Result<Arc<dyn ClientStore>> + Send + Sync + 'static,
    {
        let key = location.key();
        self.resolved.remove(&key);
        if self.factories.insert(key.clone(), Arc::new(factory)).is_none() {
            self.order.write().push(key);
        }
    }

    /// Register an already-built store for `location`.
    pub fn register_store(&self, location: &StoreLocation, store: Arc<dyn ClientStore>) {
        self.register(location, move || Ok(Arc::clone(&store)));
    }

    /// Whether a factory is registered for `location`.
    #[must_use]
    pub fn contains(&self, location: &StoreLocation) -> bool {
        self.factories.contains_key(&location.key())
    }

    /// Registered location keys, in the order they were first registered.
    #[must_use]
    pub fn locations(&self) -> Vec<String> {
        self.order.read().clone()
    }

    /// Resolve the client store registered for `location`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidClientStore`] if nothing is registered
    /// at the location or its factory fails.
    pub fn resolve(&self, location: &StoreLocation) -> Result<Arc<dyn ClientStore>, SessionError> {
        let key = location.key();

        let Some(factory) = self.factories.get(&key).map(|f| Arc::clone(f.value())) else {
            warn!(path = %key, "no client store registered");
            return Err(SessionError::InvalidClientStore { path: key });
        };

        // Clone the slot out so the factory runs under the slot lock only,
        // never under a shard lock.
        let slot = Arc::clone(self.resolved.entry(key.clone()).or_default().value());
        let mut built = slot.lock();
        if let Some(store) = built.as_ref() {
            return Ok(Arc::clone(store));
        }

        match factory() {
            Ok(store) => {
                info!(path = %key, "client store resolved");
                *built = Some(Arc::clone(&store));
                Ok(store)
            }
            Err(err) => {
                warn!(path = %key, error = %err, "client store factory failed");
                Err(SessionError::InvalidClientStore { path: key })
            }
        }
    }
}

impl Default for ClientStoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
