//! Background job reporting obsolete scheduled entries.

use domain::services::ScheduledConfigService;
use std::sync::Arc;

use super::scheduler::{Job, JobFrequency};
use crate::middleware::metrics::record_obsolete_entries;

/// Scans for entries superseded by a later effective entry of the same key.
///
/// Only reports; nothing is deleted.
pub struct ObsoleteEntriesJob {
    service: Arc<ScheduledConfigService>,
    interval_secs: u64,
}

impl ObsoleteEntriesJob {
    pub fn new(service: Arc<ScheduledConfigService>, interval_secs: u64) -> Self {
        Self {
            service,
            interval_secs,
        }
    }
}

#[async_trait::async_trait]
impl Job for ObsoleteEntriesJob {
    fn name(&self) -> &'static str {
        "obsolete_entries"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(self.interval_secs)
    }

    async fn execute(&self) -> Result<(), String> {
        let report = self.service.cleanup().await.map_err(|e| e.to_string())?;
        record_obsolete_entries(report.count());
        Ok(())
    }
}
