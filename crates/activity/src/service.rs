use std::sync::Arc;

use crate::error::Result;
use crate::model::{ActivityEntry, ActivityFilter, ActivityPage, ActivityStats, NewActivity, Pagination};
use crate::store::ActivityStore;

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;
const STATS_RECENT_LIMIT: u32 = 10;

/// Append-only audit trail.
///
/// `record` returns a `Result` on purpose: callers log a failed write and
/// carry on, so a broken audit store can never abort the business operation
/// it was auditing. Reads, by contrast, propagate errors normally.
#[derive(Clone)]
pub struct ActivityLog {
    store: Arc<dyn ActivityStore>,
}

impl ActivityLog {
    pub fn new(store: Arc<dyn ActivityStore>) -> Self {
        Self { store }
    }

    /// Append one entry. Callers treat a failure as best-effort: log it,
    /// never propagate it into the parent operation.
    pub async fn record(&self, entry: NewActivity) -> Result<ActivityEntry> {
        self.store.insert(entry).await
    }

    /// Filtered, newest-first page of entries.
    pub async fn query(&self, filter: &ActivityFilter) -> Result<ActivityPage> {
        let page = filter.page.unwrap_or(1).max(1);
        let limit = filter
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        // Widened before multiplying: page is caller-supplied and may be
        // anywhere in u32 range.
        let offset = i64::from(page - 1) * i64::from(limit);

        let total = self.store.count(filter).await?;
        let entries = self.store.list(filter, limit, offset).await?;

        let total_pages = ((total.max(0) as u64).div_ceil(u64::from(limit))) as u32;

        Ok(ActivityPage {
            entries,
            pagination: Pagination {
                page,
                limit,
                total,
                total_pages,
            },
        })
    }

    /// Grouped counters plus the most recent entries, for dashboards.
    pub async fn aggregate_stats(&self, filter: &ActivityFilter) -> Result<ActivityStats> {
        let total_count = self.store.count(filter).await?;
        let counts_by_action = self.store.counts_by_action(filter).await?;
        let counts_by_resource_type = self.store.counts_by_resource_type(filter).await?;
        let recent_entries = self.store.list(filter, STATS_RECENT_LIMIT, 0).await?;

        Ok(ActivityStats {
            total_count,
            counts_by_action,
            counts_by_resource_type,
            recent_entries,
        })
    }

    /// Everything, newest first.
    pub async fn export(&self) -> Result<Vec<ActivityEntry>> {
        self.store.export_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{action, resource};
    use crate::store::SqlActivityStore;
    use atelier_core::Database;
    use serde_json::json;

    /// The user_id column carries a foreign key, so fixtures need real
    /// rows in `users` before entries can reference them.
    async fn seed_user(db: &Database, id: i64, email: &str) {
        sqlx::query(
            "INSERT INTO users (id, email, display_name, password_hash, role, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(email)
        .bind("Seeded")
        .bind("irrelevant-hash")
        .bind("user")
        .bind(chrono::Utc::now())
        .bind(chrono::Utc::now())
        .execute(db.pool())
        .await
        .unwrap();
    }

    async fn test_log() -> (ActivityLog, Database) {
        let db = Database::connect_in_memory().await.unwrap();
        seed_user(&db, 1, "one@example.com").await;
        seed_user(&db, 2, "two@example.com").await;
        let log = ActivityLog::new(Arc::new(SqlActivityStore::new(db.pool().clone())));
        (log, db)
    }

    #[tokio::test]
    async fn test_record_and_query_newest_first() {
        let (log, _db) = test_log().await;

        for i in 0..3 {
            log.record(
                NewActivity::new(1, action::CREATE, resource::PROJECT)
                    .resource_id(i.to_string())
                    .details(json!({"n": i})),
            )
            .await
            .unwrap();
        }

        let page = log.query(&ActivityFilter::default()).await.unwrap();
        assert_eq!(page.pagination.total, 3);
        assert_eq!(page.entries.len(), 3);
        // Newest first: last insert comes back first.
        assert_eq!(page.entries[0].resource_id.as_deref(), Some("2"));
        assert_eq!(page.entries[2].resource_id.as_deref(), Some("0"));
    }

    #[tokio::test]
    async fn test_filters_restrict_results() {
        let (log, _db) = test_log().await;

        log.record(NewActivity::new(1, action::LOGIN, resource::USER))
            .await
            .unwrap();
        log.record(NewActivity::new(2, action::CREATE, resource::BLOG))
            .await
            .unwrap();
        log.record(NewActivity::new(2, action::DELETE, resource::BLOG))
            .await
            .unwrap();

        let filter = ActivityFilter {
            user_id: Some(2),
            ..Default::default()
        };
        let page = log.query(&filter).await.unwrap();
        assert_eq!(page.pagination.total, 2);
        assert!(page.entries.iter().all(|e| e.user_id == Some(2)));

        let filter = ActivityFilter {
            action: Some(action::LOGIN.to_string()),
            ..Default::default()
        };
        let page = log.query(&filter).await.unwrap();
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.entries[0].action, action::LOGIN);
    }

    #[tokio::test]
    async fn test_pagination_and_clamping() {
        let (log, _db) = test_log().await;

        for i in 0..5 {
            log.record(
                NewActivity::new(1, action::UPDATE, resource::PROJECT).resource_id(i.to_string()),
            )
            .await
            .unwrap();
        }

        let filter = ActivityFilter {
            page: Some(2),
            limit: Some(2),
            ..Default::default()
        };
        let page = log.query(&filter).await.unwrap();
        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.pagination.page, 2);
        assert_eq!(page.pagination.total, 5);
        assert_eq!(page.pagination.total_pages, 3);

        // Out-of-range values are clamped rather than rejected.
        let filter = ActivityFilter {
            page: Some(0),
            limit: Some(10_000),
            ..Default::default()
        };
        let page = log.query(&filter).await.unwrap();
        assert_eq!(page.pagination.page, 1);
        assert_eq!(page.pagination.limit, 100);
    }

    #[tokio::test]
    async fn test_huge_page_number_does_not_overflow() {
        let (log, _db) = test_log().await;

        log.record(NewActivity::new(1, action::UPDATE, resource::PROJECT))
            .await
            .unwrap();

        // The worst caller-suppliable offset: u32::MAX pages of 100.
        let filter = ActivityFilter {
            page: Some(u32::MAX),
            limit: Some(100),
            ..Default::default()
        };
        let page = log.query(&filter).await.unwrap();
        assert_eq!(page.pagination.page, u32::MAX);
        assert_eq!(page.pagination.total, 1);
        assert!(page.entries.is_empty());
    }

    #[tokio::test]
    async fn test_entries_outlive_their_actor() {
        let (log, db) = test_log().await;

        log.record(NewActivity::new(2, action::DELETE, resource::UPLOAD))
            .await
            .unwrap();

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(2_i64)
            .execute(db.pool())
            .await
            .unwrap();

        // The audit record survives with its actor reference cleared.
        let page = log.query(&ActivityFilter::default()).await.unwrap();
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.entries[0].user_id, None);
        assert_eq!(page.entries[0].action, action::DELETE);
    }

    #[tokio::test]
    async fn test_aggregate_stats() {
        let (log, _db) = test_log().await;

        log.record(NewActivity::new(1, action::LOGIN, resource::USER))
            .await
            .unwrap();
        log.record(NewActivity::new(1, action::LOGIN, resource::USER))
            .await
            .unwrap();
        log.record(NewActivity::new(1, action::CREATE, resource::BLOG))
            .await
            .unwrap();

        let stats = log.aggregate_stats(&ActivityFilter::default()).await.unwrap();
        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.counts_by_action[0].action, action::LOGIN);
        assert_eq!(stats.counts_by_action[0].count, 2);
        assert_eq!(stats.recent_entries.len(), 3);

        let by_resource: Vec<_> = stats
            .counts_by_resource_type
            .iter()
            .map(|c| (c.resource_type.as_str(), c.count))
            .collect();
        assert!(by_resource.contains(&(resource::USER, 2)));
        assert!(by_resource.contains(&(resource::BLOG, 1)));
    }

    #[tokio::test]
    async fn test_export_returns_everything() {
        let (log, _db) = test_log().await;

        for _ in 0..3 {
            log.record(NewActivity::new(1, action::PUBLISH, resource::BLOG))
                .await
                .unwrap();
        }

        let all = log.export().await.unwrap();
        assert_eq!(all.len(), 3);
    }
}
