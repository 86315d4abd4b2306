//! Domain models for the scheduled configuration backend.

pub mod scheduled_config;
pub mod sort;

pub use scheduled_config::{
    normalize_key, CleanupReport, CreateScheduledConfigRequest, CurrentValue, KeyHistory,
    NewScheduledConfigEntry, OutdatedEntries, ScheduledConfigEntry,
};
pub use sort::{EntrySort, EntrySortField};
