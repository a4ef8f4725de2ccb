//! Per-request session context.
//!
//! [`SessionContext`] is a façade over the verified [`AuthenticationData`]
//! of one request. Identity and authorization fields are plain projections
//! of the payload; the client record is resolved lazily through the shared
//! [`ClientCache`].

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use api_session_core::{AuthenticationData, StringList, TenantKey, TenantRecord};

use super::client::{SessionClient, SessionRef};
use crate::cache::ClientCache;
use crate::error::SessionError;
use crate::traits::SessionAware;

/// Where a session gets its client record from.
pub enum ClientLookup {
    /// Resolve by client code through the shared cache.
    Cache(Arc<ClientCache>),
    /// Record supplied up front; the cache and store are never consulted.
    Preloaded(Arc<TenantRecord>),
    /// The client store could not be resolved at startup. Any lookup fails with this error.
    Unavailable(SessionError),
}

impl fmt::Debug for ClientLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache(cache) => f.debug_tuple("Cache").field(&cache.len()).finish(),
            Self::Preloaded(record) => f.debug_tuple("Preloaded").field(record).finish(),
            Self::Unavailable(err) => f.debug_tuple("Unavailable").field(err).finish(),
        }
    }
}

/// Session of a single request.
///
/// Always handled as `Arc<SessionContext>` so that instances created within
/// the session can hold a [`SessionRef`] back to it.
#[derive(Debug)]
pub struct SessionContext {
    auth: AuthenticationData,
    lookup: ClientLookup,
    use_cache: AtomicBool,
    this: Weak<SessionContext>,
}

impl SessionContext {
    #[must_use]
    pub fn new(auth: AuthenticationData, lookup: ClientLookup) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            auth,
            lookup,
            use_cache: AtomicBool::new(true),
            this: this.clone(),
        })
    }

    /// Session resolving its client through `cache`.
    #[must_use]
    pub fn with_cache(auth: AuthenticationData, cache: Arc<ClientCache>) -> Arc<Self> {
        Self::new(auth, ClientLookup::Cache(cache))
    }

    /// Session with an already-resolved client record.
    #[must_use]
    pub fn with_client(auth: AuthenticationData, client: TenantRecord) -> Arc<Self> {
        Self::new(auth, ClientLookup::Preloaded(Arc::new(client)))
    }

    #[must_use]
    pub fn auth(&self) -> &AuthenticationData {
        &self.auth
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.auth.user_id.as_deref()
    }

    #[must_use]
    pub fn user_is_dev(&self) -> bool {
        self.auth.user_is_dev.unwrap_or(false)
    }

    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.auth.client_id.as_deref()
    }

    #[must_use]
    pub fn client_code(&self) -> Option<&str> {
        self.auth.client_code.as_deref()
    }

    /// Client code as a tenant key. Empty codes count as absent.
    #[must_use]
    pub fn tenant_key(&self) -> Option<TenantKey> {
        self.client_code()
            .filter(|code| !code.is_empty())
            .map(TenantKey::from)
    }

    #[must_use]
    pub fn profile_id(&self) -> Option<&str> {
        self.auth.profile_id.as_deref()
    }

    #[must_use]
    pub fn service_name(&self) -> Option<&str> {
        self.auth.service_name.as_deref()
    }

    /// Whether the session belongs to a service rather than a user.
    #[must_use]
    pub fn is_service(&self) -> bool {
        self.service_name().is_some_and(|name| !name.is_empty())
    }

    #[must_use]
    pub fn permissions(&self) -> Option<&StringList> {
        self.auth.permissions.as_ref()
    }

    #[must_use]
    pub fn locations(&self) -> Option<&StringList> {
        self.auth.locations.as_ref()
    }

    #[must_use]
    pub fn has_access_to_all_locations(&self) -> Option<bool> {
        self.auth.has_access_to_all_locations
    }

    #[must_use]
    pub fn warehouse_ids(&self) -> Option<&StringList> {
        self.auth.warehouses_ids.as_ref()
    }

    /// Whether client lookups of this session may be served from the cache.
    #[must_use]
    pub fn use_cache(&self) -> bool {
        self.use_cache.load(Ordering::Relaxed)
    }

    /// Disables (or re-enables) the client cache for the rest of this session.
    pub fn set_use_cache(&self, use_cache: bool) {
        self.use_cache.store(use_cache, Ordering::Relaxed);
    }

    /// Resolves the client of this session.
    ///
    /// Returns `Ok(None)` when the payload carries no client code.
    ///
    /// # Errors
    ///
    /// Propagates [`SessionError`] from the cache unchanged, or the startup
    /// error when the client store is unavailable.
    pub async fn client(&self) -> Result<Option<SessionClient>, SessionError> {
        if let ClientLookup::Preloaded(record) = &self.lookup {
            return Ok(Some(self.bind(Arc::clone(record))));
        }

        let Some(key) = self.tenant_key() else {
            return Ok(None);
        };

        let record = match &self.lookup {
            ClientLookup::Cache(cache) => cache.get(key.as_str(), self.use_cache()).await?,
            ClientLookup::Unavailable(err) => return Err(err.clone()),
            ClientLookup::Preloaded(record) => Arc::clone(record),
        };
        Ok(Some(self.bind(record)))
    }

    /// Whether the session may act on `location_id`.
    ///
    /// True with unrestricted location access, or when `location_id` is
    /// non-empty and listed in the session's locations. A malformed
    /// locations value grants nothing.
    #[must_use]
    pub fn validate_location_access(&self, location_id: &str) -> bool {
        self.has_access_to_all_locations().unwrap_or(false)
            || (!location_id.is_empty()
                && self
                    .locations()
                    .is_some_and(|locations| locations.contains(location_id)))
    }

    /// Whether `warehouse_id` is listed in the session's warehouses.
    #[must_use]
    pub fn validate_warehouse_access(&self, warehouse_id: &str) -> bool {
        !warehouse_id.is_empty()
            && self
                .warehouse_ids()
                .is_some_and(|warehouses| warehouses.contains(warehouse_id))
    }

    /// Whether the session holds the permission `key`.
    #[must_use]
    pub fn has_permission(&self, key: &str) -> bool {
        self.permissions()
            .is_some_and(|permissions| permissions.contains(key))
    }

    /// Non-owning reference to this session.
    #[must_use]
    pub fn session_ref(&self) -> SessionRef {
        SessionRef::new(self.this.clone())
    }

    /// Creates a default `T` bound to this session.
    #[must_use]
    pub fn create_session_instance<T: SessionAware + Default>(&self) -> T {
        self.session_ref().stamp(T::default)
    }

    /// Creates `T` with `build` and binds it to this session.
    pub fn create_session_instance_with<T, F>(&self, build: F) -> T
    where
        T: SessionAware,
        F: FnOnce() -> T,
    {
        self.session_ref().stamp(build)
    }

    fn bind(&self, record: Arc<TenantRecord>) -> SessionClient {
        SessionClient::new(record, self.session_ref())
    }
}
