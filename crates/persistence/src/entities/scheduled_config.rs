//! Scheduled configuration entry entity.

use chrono::{DateTime, Utc};
use domain::models::ScheduledConfigEntry;
use sqlx::FromRow;

/// Database row mapping for the `scheduled_config_entries` table.
#[derive(Debug, Clone, FromRow)]
pub struct ScheduledConfigEntity {
    pub id: i64,
    pub config_key: String,
    pub config_value: Option<String>,
    pub valid_from: DateTime<Utc>,
    pub created: DateTime<Utc>,
    pub author: Option<String>,
    pub comment: Option<String>,
}

impl From<ScheduledConfigEntity> for ScheduledConfigEntry {
    fn from(entity: ScheduledConfigEntity) -> Self {
        Self {
            id: entity.id,
            key: entity.config_key,
            value: entity.config_value,
            valid_from: entity.valid_from,
            created: entity.created,
            author: entity.author,
            comment: entity.comment,
        }
    }
}
