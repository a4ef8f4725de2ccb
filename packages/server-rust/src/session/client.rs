//! Client record bound to the session that resolved it.

use std::ops::Deref;
use std::sync::{Arc, Weak};

use api_session_core::TenantRecord;

use super::context::SessionContext;
use crate::traits::SessionAware;

/// Non-owning back-reference to a [`SessionContext`].
///
/// Held by instances created within a session so they can later delegate to
/// it. Does not keep the session alive.
#[derive(Debug, Clone)]
pub struct SessionRef(Weak<SessionContext>);

impl SessionRef {
    pub(crate) fn new(session: Weak<SessionContext>) -> Self {
        Self(session)
    }

    /// The session, if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Arc<SessionContext>> {
        self.0.upgrade()
    }

    /// Whether this reference points at `session`.
    #[must_use]
    pub fn is(&self, session: &Arc<SessionContext>) -> bool {
        std::ptr::eq(self.0.as_ptr(), Arc::as_ptr(session))
    }

    /// Builds `T` with `build` and stamps it with this session.
    pub(crate) fn stamp<T, F>(&self, build: F) -> T
    where
        T: SessionAware,
        F: FnOnce() -> T,
    {
        let mut instance = build();
        instance.set_session(self.clone());
        instance
    }
}

/// A client record decorated with the session it was resolved in.
///
/// Dereferences to the [`TenantRecord`]. The one added capability is
/// building session-bound instances via [`create_instance`](Self::create_instance).
#[derive(Debug, Clone)]
pub struct SessionClient {
    record: Arc<TenantRecord>,
    session: SessionRef,
}

impl SessionClient {
    pub(crate) fn new(record: Arc<TenantRecord>, session: SessionRef) -> Self {
        Self { record, session }
    }

    /// The shared record, as cached.
    #[must_use]
    pub fn record(&self) -> &Arc<TenantRecord> {
        &self.record
    }

    #[must_use]
    pub fn session(&self) -> &SessionRef {
        &self.session
    }

    /// Creates a default `T` bound to the originating session.
    #[must_use]
    pub fn create_instance<T: SessionAware + Default>(&self) -> T {
        self.session.stamp(T::default)
    }

    /// Creates `T` with `build` (which carries any constructor arguments)
    /// and binds it to the originating session.
    pub fn create_instance_with<T, F>(&self, build: F) -> T
    where
        T: SessionAware,
        F: FnOnce() -> T,
    {
        self.session.stamp(build)
    }
}

impl Deref for SessionClient {
    type Target = TenantRecord;

    fn deref(&self) -> &TenantRecord {
        &self.record
    }
}
