//! Domain services for the scheduled configuration backend.
//!
//! `resolution` holds the pure temporal queries, `store` the storage seam and
//! `scheduled_config` the facade used by the API and the cleanup job.

pub mod resolution;
pub mod scheduled_config;
pub mod store;

pub use scheduled_config::ScheduledConfigService;
pub use store::{EntryStore, InMemoryEntryStore};
