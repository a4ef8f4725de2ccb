//! No-op [`ClientStore`] implementation.
//!
//! [`NullClientStore`] knows no clients: every lookup succeeds with an empty
//! result. Useful for services that run without tenants and for tests of the
//! not-found path.

use async_trait::async_trait;
use api_session_core::TenantRecord;

use crate::traits::{ClientStore, FetchOptions};

/// Client store that never finds anything.
pub struct NullClientStore;

#[async_trait]
impl ClientStore for NullClientStore {
    async fn fetch_by(
        &self,
        _field: &str,
        _value: &str,
        _options: FetchOptions,
    ) -> anyhow::Result<Vec<TenantRecord>> {
        Ok(Vec::new())
    }
}
