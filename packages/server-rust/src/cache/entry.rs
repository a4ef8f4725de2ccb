use std::sync::Arc;
use std::time::Duration;

use api_session_core::TenantRecord;
use tokio::time::Instant;

/// A cached client record with its absolute expiration instant.
///
/// The entry is valid while `now < expires_at`. An expired entry stays in
/// the map until it is overwritten by the next successful fetch or removed.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub record: Arc<TenantRecord>,
    pub expires_at: Instant,
}

impl CacheEntry {
    /// Entry for a record fetched at `fetched_at` that lives for `ttl`.
    #[must_use]
    pub fn with_ttl(record: Arc<TenantRecord>, fetched_at: Instant, ttl: Duration) -> Self {
        Self {
            record,
            expires_at: fetched_at + ttl,
        }
    }

    #[must_use]
    pub fn is_valid(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}
