use async_trait::async_trait;
use api_session_core::TenantRecord;

use crate::session::SessionRef;

/// Options passed to [`ClientStore::fetch_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Maximum number of records to return. 0 = unlimited.
    pub limit: usize,
}

impl FetchOptions {
    /// Fetch at most one record.
    pub const SINGLE: Self = Self { limit: 1 };
}

/// Pluggable backing store holding tenant ("client") records.
/// Implementations: in-memory (tests, fixtures), null, database-backed (host).
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Load the records whose `field` equals `value`, honoring `options.limit`.
    ///
    /// An empty result means "not found". Errors are infrastructure failures
    /// (connection loss, timeouts, malformed rows).
    async fn fetch_by(
        &self,
        field: &str,
        value: &str,
        options: FetchOptions,
    ) -> anyhow::Result<Vec<TenantRecord>>;
}

/// A type that can be stamped with a back-reference to the session it was
/// created within.
///
/// Implemented by host types built through
/// [`SessionClient::create_instance`](crate::session::SessionClient::create_instance)
/// or [`SessionContext::create_session_instance`](crate::session::SessionContext::create_session_instance).
pub trait SessionAware {
    /// Attach the originating session. The reference is non-owning.
    fn set_session(&mut self, session: SessionRef);
}
