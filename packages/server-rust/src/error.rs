//! Typed errors surfaced by the client cache and session context.

use std::sync::Arc;

/// Numeric error codes, stable across releases and exposed to hosts that
/// translate session failures into API responses.
pub mod codes {
    pub const INVALID_CLIENT_STORE: u32 = 1;
    pub const CLIENT_NOT_FOUND: u32 = 2;
    pub const INTERNAL_ERROR: u32 = 99;
}

/// Errors returned when resolving the client of a session.
///
/// `Clone` so a single fetch outcome can be delivered to every caller that
/// joined the same in-flight lookup.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error("invalid client store: nothing can be resolved at {path}")]
    InvalidClientStore { path: String },
    #[error("client not found for code {code}")]
    ClientNotFound { code: String },
    #[error("internal error fetching client {code}: {cause}")]
    Internal {
        code: String,
        cause: Arc<anyhow::Error>,
    },
}

impl SessionError {
    /// Wraps a backing-store failure for the given client code.
    pub fn internal(code: impl Into<String>, cause: anyhow::Error) -> Self {
        Self::Internal {
            code: code.into(),
            cause: Arc::new(cause),
        }
    }

    /// Numeric code of this error (see [`codes`]).
    #[must_use]
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidClientStore { .. } => codes::INVALID_CLIENT_STORE,
            Self::ClientNotFound { .. } => codes::CLIENT_NOT_FOUND,
            Self::Internal { .. } => codes::INTERNAL_ERROR,
        }
    }

    /// The underlying backing-store failure, for [`SessionError::Internal`].
    #[must_use]
    pub fn cause(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Internal { cause, .. } => Some(&**cause),
            _ => None,
        }
    }
}
