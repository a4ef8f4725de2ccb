//! Time-boxed, single-flight cache of client records.
//!
//! [`ClientCache`] answers "what is the current record for client code K".
//! Valid entries are served from memory. On a miss (or an explicit bypass)
//! exactly one lookup per code goes to the [`ClientStore`]; concurrent
//! callers for the same code wait for that lookup and receive its outcome.
//! Failures and not-found results are never cached.

use std::sync::Arc;

use api_session_core::TenantRecord;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use metrics::counter;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::entry::CacheEntry;
use crate::config::ClientCacheConfig;
use crate::error::SessionError;
use crate::traits::{ClientStore, FetchOptions};

/// Field of the client model that holds the client code.
const CODE_FIELD: &str = "code";

/// Result of one client lookup, shared by every caller that joined it.
pub type FetchOutcome = Result<Arc<TenantRecord>, SessionError>;

/// Slot published by the leader of an in-flight lookup. `None` until done.
type FlightSlot = watch::Receiver<Option<FetchOutcome>>;

/// How a `get()` call takes part in the lookup of a code.
enum Role {
    Cached(Arc<TenantRecord>),
    Leader(watch::Sender<Option<FetchOutcome>>),
    Follower(FlightSlot),
}

// ---------------------------------------------------------------------------
// ClientCache
// ---------------------------------------------------------------------------

/// Process-wide cache mapping client code -> client record.
///
/// Constructed once and shared as `Arc<ClientCache>` with everything that
/// resolves clients. Tests build isolated instances.
///
/// Ordering rules that keep lookups single-flight:
/// - a leader writes its entry before releasing its in-flight slot;
/// - a caller that claims a free slot re-checks the entries first.
pub struct ClientCache {
    store: Arc<dyn ClientStore>,
    config: ClientCacheConfig,
    entries: DashMap<String, CacheEntry>,
    in_flight: DashMap<String, FlightSlot>,
}

impl ClientCache {
    #[must_use]
    pub fn new(store: Arc<dyn ClientStore>, config: ClientCacheConfig) -> Self {
        Self {
            store,
            config,
            entries: DashMap::new(),
            in_flight: DashMap::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientCacheConfig {
        &self.config
    }

    /// Returns the record for `code`.
    ///
    /// With `use_cache` a valid entry is returned without touching the store.
    /// Otherwise the caller leads a new lookup or joins the one in flight.
    ///
    /// # Errors
    ///
    /// - [`SessionError::ClientNotFound`] if the store has no client with this code.
    /// - [`SessionError::Internal`] if the store failed or the lookup timed out.
    pub async fn get(&self, code: &str, use_cache: bool) -> FetchOutcome {
        loop {
            match self.claim(code, use_cache) {
                Role::Cached(record) => {
                    debug!(code, "client fetched from cache");
                    counter!("client_cache_hits_total").increment(1);
                    return Ok(record);
                }
                Role::Leader(tx) => return self.lead(code, tx).await,
                Role::Follower(mut slot) => {
                    debug!(code, "joining in-flight client lookup");
                    let published = slot
                        .wait_for(Option::is_some)
                        .await
                        .ok()
                        .and_then(|outcome| outcome.clone());
                    if let Some(outcome) = published {
                        return outcome;
                    }
                    // The leader was cancelled before publishing; start over.
                }
            }
        }
    }

    /// Removes the entry for `code`, forcing the next `get()` to refetch.
    ///
    /// Returns `true` if an entry was present. A lookup already in flight
    /// still stores its result when it completes.
    pub fn invalidate(&self, code: &str) -> bool {
        self.entries.remove(code).is_some()
    }

    /// Drops every entry. Administrative reset.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Whether a non-expired entry exists for `code`.
    #[must_use]
    pub fn contains_valid(&self, code: &str) -> bool {
        self.cached(code).is_some()
    }

    /// Expiration instant of the entry for `code`, valid or not.
    #[must_use]
    pub fn expires_at(&self, code: &str) -> Option<Instant> {
        self.entries.get(code).map(|entry| entry.expires_at)
    }

    /// Number of stored entries, including expired ones not yet overwritten.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lookups currently in flight.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    fn cached(&self, code: &str) -> Option<Arc<TenantRecord>> {
        let entry = self.entries.get(code)?;
        entry
            .is_valid(Instant::now())
            .then(|| Arc::clone(&entry.record))
    }

    fn claim(&self, code: &str, use_cache: bool) -> Role {
        if use_cache {
            if let Some(record) = self.cached(code) {
                return Role::Cached(record);
            }
        }

        match self.in_flight.entry(code.to_string()) {
            Entry::Occupied(flight) => Role::Follower(flight.get().clone()),
            Entry::Vacant(slot) => {
                // A leader that finished since the first check has already stored its entry.
                if use_cache {
                    if let Some(record) = self.cached(code) {
                        return Role::Cached(record);
                    }
                }
                let (tx, rx) = watch::channel(None);
                slot.insert(rx);
                Role::Leader(tx)
            }
        }
    }

    async fn lead(&self, code: &str, tx: watch::Sender<Option<FetchOutcome>>) -> FetchOutcome {
        let _flight = FlightGuard {
            in_flight: &self.in_flight,
            code,
        };

        let outcome = self.fetch(code).await;
        if let Ok(record) = &outcome {
            debug!(code, "client saved in cache");
            self.entries.insert(
                code.to_string(),
                CacheEntry::with_ttl(Arc::clone(record), Instant::now(), self.config.ttl),
            );
        }
        tx.send_replace(Some(outcome.clone()));
        outcome
    }

    async fn fetch(&self, code: &str) -> FetchOutcome {
        counter!("client_cache_misses_total").increment(1);

        let lookup = self.store.fetch_by(CODE_FIELD, code, FetchOptions::SINGLE);
        let result = match self.config.fetch_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, lookup).await {
                Ok(result) => result,
                Err(_elapsed) => Err(anyhow::anyhow!(
                    "client lookup timed out after {}ms",
                    timeout.as_millis()
                )),
            },
            None => lookup.await,
        };

        match result {
            Ok(records) => records
                .into_iter()
                .next()
                .map(Arc::new)
                .ok_or_else(|| SessionError::ClientNotFound {
                    code: code.to_string(),
                }),
            Err(err) => {
                warn!(code, error = %err, "client lookup failed");
                counter!("client_cache_fetch_errors_total").increment(1);
                Err(SessionError::internal(code, err))
            }
        }
    }
}

/// Releases the in-flight slot of a code when the leading lookup finishes
/// or is cancelled.
struct FlightGuard<'a> {
    in_flight: &'a DashMap<String, FlightSlot>,
    code: &'a str,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(self.code);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
