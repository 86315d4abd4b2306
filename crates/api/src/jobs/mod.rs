//! Background job scheduler and job implementations.

mod obsolete_entries;
mod pool_metrics;
mod scheduler;

pub use obsolete_entries::ObsoleteEntriesJob;
pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
