//! Scheduled configuration repository.
//!
//! PostgreSQL implementation of [`EntryStore`]. Current-value, obsolescence
//! and latest-per-key resolution run inside the database.

use chrono::{DateTime, Utc};
use domain::models::{EntrySort, NewScheduledConfigEntry, ScheduledConfigEntry};
use domain::services::EntryStore;
use domain::StoreError;
use shared::pagination::{Page, PageRequest};
use sqlx::{PgConnection, PgPool};

use crate::entities::ScheduledConfigEntity;
use crate::metrics::QueryTimer;

const ENTRY_COLUMNS: &str =
    "id, config_key, config_value, valid_from, created, author, comment";

/// Repository for scheduled configuration entries.
#[derive(Clone)]
pub struct ScheduledConfigRepository {
    pool: PgPool,
}

impl ScheduledConfigRepository {
    /// Creates a new ScheduledConfigRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

}

/// Number of distinct keys.
async fn count_keys(conn: &mut PgConnection) -> Result<i64, sqlx::Error> {
    let timer = QueryTimer::new("count_scheduled_config_keys");
    let result: Result<(i64,), sqlx::Error> =
        sqlx::query_as("SELECT COUNT(DISTINCT config_key) FROM scheduled_config_entries")
            .fetch_one(conn)
            .await;
    timer.record();
    result.map(|row| row.0)
}

fn into_entries(entities: Vec<ScheduledConfigEntity>) -> Vec<ScheduledConfigEntry> {
    entities.into_iter().map(Into::into).collect()
}

#[async_trait::async_trait]
impl EntryStore for ScheduledConfigRepository {
    async fn append(&self, entry: NewScheduledConfigEntry) -> Result<ScheduledConfigEntry, StoreError> {
        let timer = QueryTimer::new("append_scheduled_config");
        let result = sqlx::query_as::<_, ScheduledConfigEntity>(&format!(
            r#"
            INSERT INTO scheduled_config_entries
                (config_key, config_value, valid_from, created, author, comment)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(entry.key)
        .bind(entry.value)
        .bind(entry.valid_from)
        .bind(entry.created)
        .bind(entry.author)
        .bind(entry.comment)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        result
            .map(Into::into)
            .map_err(|e| StoreError::new("append", e))
    }

    async fn find_by_key(&self, key: &str) -> Result<Vec<ScheduledConfigEntry>, StoreError> {
        let timer = QueryTimer::new("find_scheduled_config_by_key");
        let result = sqlx::query_as::<_, ScheduledConfigEntity>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM scheduled_config_entries
            WHERE config_key = $1
            ORDER BY id
            "#
        ))
        .bind(key)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        result
            .map(into_entries)
            .map_err(|e| StoreError::new("find_by_key", e))
    }

    async fn find_current(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ScheduledConfigEntry>, StoreError> {
        let timer = QueryTimer::new("find_current_scheduled_config");
        let result = sqlx::query_as::<_, ScheduledConfigEntity>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM scheduled_config_entries
            WHERE config_key = $1 AND valid_from <= $2
            ORDER BY valid_from DESC, created DESC, id DESC
            LIMIT 1
            "#
        ))
        .bind(key)
        .bind(now)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result
            .map(|row| row.map(Into::into))
            .map_err(|e| StoreError::new("find_current", e))
    }

    async fn find_outdated(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledConfigEntry>, StoreError> {
        let timer = QueryTimer::new("find_outdated_scheduled_configs");
        let result = sqlx::query_as::<_, ScheduledConfigEntity>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM (
                SELECT {ENTRY_COLUMNS},
                       MAX(valid_from) OVER (PARTITION BY config_key) AS effective_from
                FROM scheduled_config_entries
                WHERE valid_from <= $1
            ) effective
            WHERE valid_from < effective_from
            ORDER BY config_key, valid_from, id
            "#
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        result
            .map(into_entries)
            .map_err(|e| StoreError::new("find_outdated", e))
    }

    async fn find_history(
        &self,
        key: &str,
        before: DateTime<Utc>,
    ) -> Result<Vec<ScheduledConfigEntry>, StoreError> {
        let timer = QueryTimer::new("find_scheduled_config_history");
        let result = sqlx::query_as::<_, ScheduledConfigEntity>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM scheduled_config_entries
            WHERE config_key = $1 AND created < $2
            ORDER BY created DESC, id DESC
            "#
        ))
        .bind(key)
        .bind(before)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        result
            .map(into_entries)
            .map_err(|e| StoreError::new("find_history", e))
    }

    async fn find_latest_per_key(
        &self,
        page: PageRequest,
        sort: &EntrySort,
    ) -> Result<Page<ScheduledConfigEntry>, StoreError> {
        let map_err = |e: sqlx::Error| StoreError::new("find_latest_per_key", e);
        let limit = i64::try_from(page.limit()).unwrap_or(i64::MAX);
        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);

        // One snapshot for the page and the total.
        let mut tx = self.pool.begin().await.map_err(map_err)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;

        // ORDER BY is built from whitelisted column names only.
        let timer = QueryTimer::new("find_latest_scheduled_config_per_key");
        let result = sqlx::query_as::<_, ScheduledConfigEntity>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM (
                SELECT DISTINCT ON (config_key) {ENTRY_COLUMNS}
                FROM scheduled_config_entries
                ORDER BY config_key, created DESC, id DESC
            ) latest
            ORDER BY {order_by}
            LIMIT $1 OFFSET $2
            "#,
            order_by = sort.to_sql()
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *tx)
        .await;
        timer.record();

        let entries = result.map(into_entries).map_err(map_err)?;
        let total = count_keys(&mut tx).await.map_err(map_err)?;
        tx.commit().await.map_err(map_err)?;

        Ok(Page::new(entries, page, u64::try_from(total).unwrap_or(0)))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| StoreError::new("ping", e))
    }
}

/// Tests against a live database; skipped unless `TEST_DATABASE_URL` is set.
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, SubsecRound};
    use fake::faker::lorem::en::Sentence;
    use fake::Fake;
    use shared::pagination::MAX_PAGE_SIZE;

    async fn test_repository() -> Option<ScheduledConfigRepository> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = PgPool::connect(&url).await.ok()?;
        crate::db::run_migrations(&pool).await.ok()?;
        Some(ScheduledConfigRepository::new(pool))
    }

    /// Keys unique to one test run, since the database outlives the test.
    fn unique_key(name: &str) -> String {
        format!("{}_{}", name, uuid::Uuid::new_v4().simple())
    }

    fn now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }

    fn new_entry(key: &str, value: &str, valid_from: DateTime<Utc>, created: DateTime<Utc>) -> NewScheduledConfigEntry {
        NewScheduledConfigEntry {
            key: key.to_string(),
            value: Some(value.to_string()),
            valid_from,
            created,
            author: None,
            comment: Some(Sentence(2..5).fake()),
        }
    }

    #[tokio::test]
    async fn test_append_and_find_by_key() {
        let Some(repo) = test_repository().await else {
            return;
        };
        let key = unique_key("append");
        let now = now();
        let stored = repo.append(new_entry(&key, "1", now, now)).await.unwrap();
        assert!(stored.id > 0);
        assert_eq!(stored.created, now);

        let found = repo.find_by_key(&key).await.unwrap();
        assert_eq!(found, vec![stored]);
        assert!(repo.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_current_and_outdated() {
        let Some(repo) = test_repository().await else {
            return;
        };
        let key = unique_key("current");
        let now = now();
        let old = repo
            .append(new_entry(&key, "a", now - Duration::days(1), now - Duration::hours(3)))
            .await
            .unwrap();
        repo.append(new_entry(&key, "b", now - Duration::hours(10), now - Duration::hours(2)))
            .await
            .unwrap();
        repo.append(new_entry(&key, "c", now + Duration::days(1), now - Duration::hours(1)))
            .await
            .unwrap();

        let current = repo.find_current(&key, now).await.unwrap().unwrap();
        assert_eq!(current.value.as_deref(), Some("b"));

        let outdated: Vec<i64> = repo
            .find_outdated(now)
            .await
            .unwrap()
            .into_iter()
            .filter(|e| e.key == key)
            .map(|e| e.id)
            .collect();
        assert_eq!(outdated, vec![old.id]);
    }

    #[tokio::test]
    async fn test_history_is_newest_first() {
        let Some(repo) = test_repository().await else {
            return;
        };
        let key = unique_key("history");
        let now = now();
        repo.append(new_entry(&key, "1", now, now - Duration::hours(24)))
            .await
            .unwrap();
        repo.append(new_entry(&key, "2", now, now - Duration::hours(1)))
            .await
            .unwrap();

        let history = repo.find_history(&key, now).await.unwrap();
        let values: Vec<_> = history.iter().map(|e| e.value.as_deref().unwrap()).collect();
        assert_eq!(values, vec!["2", "1"]);

        let earlier = repo.find_history(&key, now - Duration::hours(24)).await.unwrap();
        assert!(earlier.is_empty());
    }

    #[tokio::test]
    async fn test_latest_per_key_counts_distinct_keys() {
        let Some(repo) = test_repository().await else {
            return;
        };
        let key = unique_key("latest");
        let now = now();
        repo.append(new_entry(&key, "old", now, now - Duration::hours(2)))
            .await
            .unwrap();
        let newest = repo
            .append(new_entry(&key, "new", now - Duration::hours(5), now + Duration::days(1)))
            .await
            .unwrap();

        let page = PageRequest::new(0, MAX_PAGE_SIZE, MAX_PAGE_SIZE).unwrap();
        let sort: EntrySort = "created:desc".parse().unwrap();
        let latest = repo.find_latest_per_key(page, &sort).await.unwrap();
        assert!(latest.total_elements >= 1);
        let ours: Vec<_> = latest.items.iter().filter(|e| e.key == key).collect();
        assert_eq!(ours.len(), 1);
        assert_eq!(ours[0].id, newest.id);
    }

    #[tokio::test]
    async fn test_latest_total_matches_page_under_concurrent_appends() {
        let Some(repo) = test_repository().await else {
            return;
        };
        let now = now();
        let writer = {
            let repo = repo.clone();
            tokio::spawn(async move {
                for i in 0..50 {
                    let key = unique_key(&format!("concurrent_{i}"));
                    repo.append(new_entry(&key, "v", now, now)).await.unwrap();
                }
            })
        };

        let sort: EntrySort = "key".parse().unwrap();
        let mut index = 0;
        loop {
            let request = PageRequest::new(index, MAX_PAGE_SIZE, MAX_PAGE_SIZE).unwrap();
            let page = repo.find_latest_per_key(request, &sort).await.unwrap();
            if page.items.len() < MAX_PAGE_SIZE as usize {
                // A short page ends the listing, so the total covers exactly what precedes it.
                assert_eq!(
                    page.total_elements,
                    request.offset() + page.items.len() as u64
                );
                break;
            }
            index += 1;
        }
        writer.await.unwrap();
    }
}
