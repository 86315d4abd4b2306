//! Storage abstraction for scheduled entries.
//!
//! The service only talks to `EntryStore`, so the PostgreSQL repository and
//! the in-memory store are interchangeable.

use chrono::{DateTime, Utc};
use shared::pagination::{Page, PageRequest};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::errors::StoreError;
use crate::models::{EntrySort, NewScheduledConfigEntry, ScheduledConfigEntry};
use crate::services::resolution;

/// Append-only store of scheduled entries.
///
/// Keys passed to every method are already normalized.
#[async_trait::async_trait]
pub trait EntryStore: Send + Sync {
    /// Persist a new entry and return it with its assigned id.
    async fn append(&self, entry: NewScheduledConfigEntry) -> Result<ScheduledConfigEntry, StoreError>;

    /// All entries of a key, in insertion order.
    async fn find_by_key(&self, key: &str) -> Result<Vec<ScheduledConfigEntry>, StoreError>;

    /// The entry in effect for `key` at `now`.
    async fn find_current(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ScheduledConfigEntry>, StoreError>;

    /// Effective entries superseded by a later effective entry of the same key.
    async fn find_outdated(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledConfigEntry>, StoreError>;

    /// Entries of `key` created strictly before `before`, newest first.
    async fn find_history(
        &self,
        key: &str,
        before: DateTime<Utc>,
    ) -> Result<Vec<ScheduledConfigEntry>, StoreError>;

    /// The most recently created entry of every key, sorted and paginated.
    async fn find_latest_per_key(
        &self,
        page: PageRequest,
        sort: &EntrySort,
    ) -> Result<Page<ScheduledConfigEntry>, StoreError>;

    /// Connectivity probe for health checks.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Process-local store used by tests and database-less deployments.
#[derive(Debug)]
pub struct InMemoryEntryStore {
    entries: RwLock<Vec<ScheduledConfigEntry>>,
    next_id: AtomicI64,
}

impl InMemoryEntryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for InMemoryEntryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EntryStore for InMemoryEntryStore {
    async fn append(&self, entry: NewScheduledConfigEntry) -> Result<ScheduledConfigEntry, StoreError> {
        let mut entries = self.entries.write().await;
        // Assigned under the write lock so ids follow insertion order.
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let stored = entry.into_entry(id);
        entries.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_key(&self, key: &str) -> Result<Vec<ScheduledConfigEntry>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().filter(|e| e.key == key).cloned().collect())
    }

    async fn find_current(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ScheduledConfigEntry>, StoreError> {
        let entries = self.entries.read().await;
        Ok(resolution::resolve_current(entries.iter(), key, now).cloned())
    }

    async fn find_outdated(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledConfigEntry>, StoreError> {
        let entries = self.entries.read().await;
        Ok(resolution::find_outdated(&entries, now)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn find_history(
        &self,
        key: &str,
        before: DateTime<Utc>,
    ) -> Result<Vec<ScheduledConfigEntry>, StoreError> {
        let entries = self.entries.read().await;
        Ok(resolution::history(entries.iter(), key, before)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn find_latest_per_key(
        &self,
        page: PageRequest,
        sort: &EntrySort,
    ) -> Result<Page<ScheduledConfigEntry>, StoreError> {
        let entries = self.entries.read().await;
        Ok(resolution::latest_per_key_page(&entries, page, sort))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
