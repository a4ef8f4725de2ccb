//! In-memory [`ClientStore`] implementation backed by [`DashMap`].
//!
//! Holds client records keyed by their `id` (or `code` when no id is set).
//! Suitable for tests, fixtures, and small deployments where the full client
//! list fits in memory.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context as _;
use async_trait::async_trait;
use dashmap::DashMap;
use api_session_core::TenantRecord;

use crate::config::ClientModelSettings;
use crate::traits::{ClientStore, FetchOptions};

/// In-memory client store.
///
/// Lookups scan all records and filter by string field equality, so it is
/// meant for small client lists.
pub struct InMemoryClientStore {
    records: DashMap<String, TenantRecord>,
    settings: ClientModelSettings,
    fetches: AtomicU64,
}

impl InMemoryClientStore {
    /// Creates a new, empty store with default model settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(ClientModelSettings::default())
    }

    #[must_use]
    pub fn with_settings(settings: ClientModelSettings) -> Self {
        Self {
            records: DashMap::new(),
            settings,
            fetches: AtomicU64::new(0),
        }
    }

    /// Creates a store pre-populated with `records`.
    ///
    /// # Errors
    ///
    /// Returns an error if a record has neither `id` nor `code`.
    pub fn from_records(records: impl IntoIterator<Item = TenantRecord>) -> anyhow::Result<Self> {
        let store = Self::new();
        for record in records {
            store.insert(record)?;
        }
        Ok(store)
    }

    /// Loads a JSON array of client records from `path` into the store.
    /// Returns the number of records read.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a JSON array of
    /// objects, or holds a record with neither `id` nor `code`.
    pub async fn load_json_file(&self, path: impl AsRef<Path>) -> anyhow::Result<usize> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading client fixtures from {}", path.display()))?;
        let records: Vec<TenantRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing client fixtures from {}", path.display()))?;
        let count = records.len();
        for record in records {
            self.insert(record)
                .with_context(|| format!("loading client fixtures from {}", path.display()))?;
        }
        Ok(count)
    }

    /// Inserts or replaces a record keyed by its `id` (else its `code`),
    /// returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the record has neither a non-empty `id` nor `code`.
    pub fn insert(&self, record: TenantRecord) -> anyhow::Result<Option<TenantRecord>> {
        let Some(key) = record
            .id()
            .filter(|id| !id.is_empty())
            .or_else(|| record.code().filter(|code| !code.is_empty()))
            .map(str::to_string)
        else {
            anyhow::bail!("client record has neither id nor code");
        };
        Ok(self.records.insert(key, record))
    }

    /// Removes the record stored under `id`.
    pub fn remove(&self, id: &str) -> Option<TenantRecord> {
        self.records.remove(id).map(|(_, r)| r)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of `fetch_by` calls served so far.
    #[must_use]
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Name of the table this store stands in for.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.settings.table
    }

    #[must_use]
    pub fn database_key(&self) -> &str {
        &self.settings.database_key
    }
}

impl Default for InMemoryClientStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClientStore for InMemoryClientStore {
    async fn fetch_by(
        &self,
        field: &str,
        value: &str,
        options: FetchOptions,
    ) -> anyhow::Result<Vec<TenantRecord>> {
        self.fetches.fetch_add(1, Ordering::Relaxed);

        if field.is_empty() || value.is_empty() {
            return Ok(Vec::new());
        }

        let limit = if options.limit == 0 {
            usize::MAX
        } else {
            options.limit
        };

        Ok(self
            .records
            .iter()
            .filter(|entry| entry.value().matches(field, value))
            .take(limit)
            .map(|entry| entry.value().clone())
            .collect())
    }
}
