//! Scheduled configuration service.
//!
//! Normalizes keys, stamps creation times and delegates queries to the
//! configured [`EntryStore`].

use chrono::{DateTime, Duration, SubsecRound, Utc};
use shared::pagination::{Page, PageRequest};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use validator::Validate;

use crate::errors::ScheduledConfigError;
use crate::models::{
    normalize_key, CleanupReport, CreateScheduledConfigRequest, CurrentValue, EntrySort, KeyHistory,
    NewScheduledConfigEntry, OutdatedEntries, ScheduledConfigEntry,
};
use crate::services::store::EntryStore;

/// Hands out `created` stamps that strictly increase within the process.
///
/// Stamps are truncated to microseconds so they survive a round trip
/// through PostgreSQL unchanged.
#[derive(Debug, Default)]
struct CreationClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl CreationClock {
    fn stamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let now = now.trunc_subsecs(6);
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let stamp = match *last {
            Some(previous) if now <= previous => previous + Duration::microseconds(1),
            _ => now,
        };
        *last = Some(stamp);
        stamp
    }
}

/// Entry point for reading and scheduling configuration values.
pub struct ScheduledConfigService {
    store: Arc<dyn EntryStore>,
    clock: CreationClock,
}

impl ScheduledConfigService {
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self {
            store,
            clock: CreationClock::default(),
        }
    }

    /// The underlying store, for health probes.
    pub fn store(&self) -> &Arc<dyn EntryStore> {
        &self.store
    }

    /// Schedule a new value for a key.
    ///
    /// Any `validFrom` is accepted, past dates included. A caller-supplied
    /// `created` is ignored.
    pub async fn set(
        &self,
        request: CreateScheduledConfigRequest,
    ) -> Result<ScheduledConfigEntry, ScheduledConfigError> {
        if request.id.is_some() {
            return Err(ScheduledConfigError::IdentifierSupplied);
        }
        request.validate()?;

        let entry = NewScheduledConfigEntry {
            key: normalize_key(&request.key),
            value: request.value,
            valid_from: request.valid_from,
            created: self.clock.stamp(Utc::now()),
            author: request.author,
            comment: request.comment,
        };

        let stored = self.store.append(entry).await?;

        info!(
            entry_id = stored.id,
            key = %stored.key,
            valid_from = %stored.valid_from,
            "Scheduled configuration entry created"
        );

        Ok(stored)
    }

    /// Value in effect for `key` right now.
    pub async fn get(&self, key: &str) -> Result<CurrentValue, ScheduledConfigError> {
        self.get_at(key, Utc::now()).await
    }

    /// Value in effect for `key` at `reference_time`.
    pub async fn get_at(
        &self,
        key: &str,
        reference_time: DateTime<Utc>,
    ) -> Result<CurrentValue, ScheduledConfigError> {
        let key = normalize_key(key);
        let entry = self.store.find_current(&key, reference_time).await?;
        Ok(CurrentValue {
            key,
            reference_time,
            entry,
        })
    }

    /// Revisions of `key` created before `before` (default: now), newest first.
    pub async fn history(
        &self,
        key: &str,
        before: Option<DateTime<Utc>>,
    ) -> Result<KeyHistory, ScheduledConfigError> {
        let key = normalize_key(key);
        let before = before.unwrap_or_else(Utc::now);
        let entries = self.store.find_history(&key, before).await?;
        Ok(KeyHistory {
            key,
            before,
            entries,
        })
    }

    /// The most recently created entry of every key.
    pub async fn list_latest(
        &self,
        page: PageRequest,
        sort: &EntrySort,
    ) -> Result<Page<ScheduledConfigEntry>, ScheduledConfigError> {
        Ok(self.store.find_latest_per_key(page, sort).await?)
    }

    /// Entries superseded as of `reference_time` (default: now).
    pub async fn outdated(
        &self,
        reference_time: Option<DateTime<Utc>>,
    ) -> Result<OutdatedEntries, ScheduledConfigError> {
        let reference_time = reference_time.unwrap_or_else(Utc::now);
        let entries = self.store.find_outdated(reference_time).await?;
        Ok(OutdatedEntries {
            reference_time,
            entries,
        })
    }

    /// Report entries that no longer affect any value. Nothing is deleted.
    pub async fn cleanup(&self) -> Result<CleanupReport, ScheduledConfigError> {
        let outdated = self.outdated(None).await?;
        let report = CleanupReport::from(&outdated);

        info!(
            count = report.count(),
            reference_time = %report.reference_time,
            "Found {} entries that are obsolete",
            report.count()
        );
        if !report.obsolete_ids.is_empty() {
            debug!(ids = ?report.obsolete_ids, "Obsolete entry ids");
        }

        Ok(report)
    }
}
