use std::sync::Arc;

use api_session_core::{AuthenticationData, TenantRecord};
use tracing::warn;

use super::context::{ClientLookup, SessionContext};
use crate::cache::ClientCache;
use crate::config::{ClientCacheConfig, StoreLocation};
use crate::error::SessionError;
use crate::store::ClientStoreRegistry;

/// Owner of the process-wide [`ClientCache`] and factory of sessions.
///
/// Built once at startup. If the client store cannot be resolved the failure
/// is kept, sessions are still created, and only their client lookups fail.
pub struct SessionManager {
    lookup: Result<Arc<ClientCache>, SessionError>,
}

impl SessionManager {
    /// Manager backed by an existing cache.
    #[must_use]
    pub fn new(cache: Arc<ClientCache>) -> Self {
        Self { lookup: Ok(cache) }
    }

    /// Resolves the client store registered at `location` and builds the cache.
    #[must_use]
    pub fn from_registry(
        registry: &ClientStoreRegistry,
        location: &StoreLocation,
        config: ClientCacheConfig,
    ) -> Self {
        let lookup = registry
            .resolve(location)
            .map(|store| Arc::new(ClientCache::new(store, config)));
        if let Err(err) = &lookup {
            warn!(error = %err, "sessions will run without a client store");
        }
        Self { lookup }
    }

    /// Creates the session of one request.
    #[must_use]
    pub fn session(&self, auth: AuthenticationData) -> Arc<SessionContext> {
        let lookup = match &self.lookup {
            Ok(cache) => ClientLookup::Cache(Arc::clone(cache)),
            Err(err) => ClientLookup::Unavailable(err.clone()),
        };
        SessionContext::new(auth, lookup)
    }

    /// Creates a session whose client is already known.
    #[must_use]
    pub fn session_with_client(
        &self,
        auth: AuthenticationData,
        client: TenantRecord,
    ) -> Arc<SessionContext> {
        SessionContext::with_client(auth, client)
    }

    /// The shared cache, if the client store was resolved.
    #[must_use]
    pub fn cache(&self) -> Option<&Arc<ClientCache>> {
        self.lookup.as_ref().ok()
    }

    /// Whether the client store was resolved.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.lookup.is_ok()
    }

    /// Drops every cached client.
    pub fn reset(&self) {
        if let Ok(cache) = &self.lookup {
            cache.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryClientStore;

    fn location() -> StoreLocation {
        StoreLocation::new("/srv/app")
    }

    fn acme() -> TenantRecord {
        TenantRecord::new("c1", "acme")
    }

    fn acme_auth() -> AuthenticationData {
        AuthenticationData {
            client_code: Some("acme".to_string()),
            ..AuthenticationData::default()
        }
    }

    #[tokio::test]
    async fn resolved_store_serves_sessions() {
        let registry = ClientStoreRegistry::new();
        let store = Arc::new(InMemoryClientStore::from_records([acme()]).unwrap());
        registry.register_store(&location(), Arc::clone(&store) as _);

        let manager =
            SessionManager::from_registry(&registry, &location(), ClientCacheConfig::default());
        assert!(manager.is_configured());

        let first = manager.session(acme_auth());
        let second = manager.session(acme_auth());
        first.client().await.unwrap().unwrap();
        second.client().await.unwrap().unwrap();

        // Sessions share the manager's cache.
        assert_eq!(store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn unresolved_store_fails_client_lookups() {
        let registry = ClientStoreRegistry::new();
        let manager =
            SessionManager::from_registry(&registry, &location(), ClientCacheConfig::default());
        assert!(!manager.is_configured());
        assert!(manager.cache().is_none());

        let session = manager.session(acme_auth());
        let err = session.client().await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidClientStore { ref path } if path == "/srv/app/models/client"
        ));

        let anonymous = manager.session(AuthenticationData::default());
        assert!(anonymous.client().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn session_with_client_works_without_store() {
        let manager = SessionManager::from_registry(
            &ClientStoreRegistry::new(),
            &location(),
            ClientCacheConfig::default(),
        );
        let session = manager.session_with_client(acme_auth(), TenantRecord::new("c1", "acme"));
        assert_eq!(session.client().await.unwrap().unwrap().id(), Some("c1"));
    }

    #[tokio::test]
    async fn reset_clears_cache() {
        let store = Arc::new(InMemoryClientStore::from_records([acme()]).unwrap());
        let cache = Arc::new(ClientCache::new(
            Arc::clone(&store) as _,
            ClientCacheConfig::default(),
        ));
        let manager = SessionManager::new(cache);

        manager.session(acme_auth()).client().await.unwrap();
        manager.reset();
        assert!(manager.cache().unwrap().is_empty());

        manager.session(acme_auth()).client().await.unwrap();
        assert_eq!(store.fetch_count(), 2);
    }
}
