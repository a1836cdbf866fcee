use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::sqlite::{Sqlite, SqlitePool, SqliteRow};
use sqlx::{QueryBuilder, Row};

use crate::error::Result;
use crate::model::{ActionCount, ActivityEntry, ActivityFilter, NewActivity, ResourceCount};

const ENTRY_COLUMNS: &str =
    "id, user_id, action, resource_type, resource_id, details, ip_address, user_agent, created_at";

/// Persistence seam for the activity log. The SQL implementation below is
/// the production one; tests substitute failing or in-memory doubles.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn insert(&self, entry: NewActivity) -> Result<ActivityEntry>;

    async fn list(
        &self,
        filter: &ActivityFilter,
        limit: u32,
        offset: i64,
    ) -> Result<Vec<ActivityEntry>>;

    async fn count(&self, filter: &ActivityFilter) -> Result<i64>;

    async fn counts_by_action(&self, filter: &ActivityFilter) -> Result<Vec<ActionCount>>;

    async fn counts_by_resource_type(&self, filter: &ActivityFilter)
    -> Result<Vec<ResourceCount>>;

    /// Full dump, newest first. Used by the export endpoint.
    async fn export_all(&self) -> Result<Vec<ActivityEntry>>;
}

#[derive(Debug, Clone)]
pub struct SqlActivityStore {
    pool: SqlitePool,
}

impl SqlActivityStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn entry_from_row(row: &SqliteRow) -> Result<ActivityEntry> {
    let details: String = row.try_get("details")?;
    let details: JsonValue = serde_json::from_str(&details)?;

    Ok(ActivityEntry {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        action: row.try_get("action")?,
        resource_type: row.try_get("resource_type")?,
        resource_id: row.try_get("resource_id")?,
        details,
        ip_address: row.try_get("ip_address")?,
        user_agent: row.try_get("user_agent")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Append the filter's WHERE clauses to a query under construction.
fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &ActivityFilter) {
    builder.push(" WHERE 1 = 1");
    if let Some(user_id) = filter.user_id {
        builder.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(action) = &filter.action {
        builder.push(" AND action = ").push_bind(action.clone());
    }
    if let Some(resource_type) = &filter.resource_type {
        builder
            .push(" AND resource_type = ")
            .push_bind(resource_type.clone());
    }
    if let Some(resource_id) = &filter.resource_id {
        builder
            .push(" AND resource_id = ")
            .push_bind(resource_id.clone());
    }
    if let Some(from) = filter.from {
        builder.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        builder.push(" AND created_at <= ").push_bind(to);
    }
}

#[async_trait]
impl ActivityStore for SqlActivityStore {
    async fn insert(&self, entry: NewActivity) -> Result<ActivityEntry> {
        let details = serde_json::to_string(&entry.details)?;
        let now = chrono::Utc::now();

        let row = sqlx::query(
            "INSERT INTO activity_log \
             (user_id, action, resource_type, resource_id, details, ip_address, user_agent, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING id, user_id, action, resource_type, resource_id, details, ip_address, user_agent, created_at",
        )
        .bind(entry.user_id)
        .bind(&entry.action)
        .bind(&entry.resource_type)
        .bind(&entry.resource_id)
        .bind(&details)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        entry_from_row(&row)
    }

    async fn list(
        &self,
        filter: &ActivityFilter,
        limit: u32,
        offset: i64,
    ) -> Result<Vec<ActivityEntry>> {
        let mut builder = QueryBuilder::new(format!("SELECT {ENTRY_COLUMNS} FROM activity_log"));
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at DESC, id DESC");
        builder.push(" LIMIT ").push_bind(i64::from(limit));
        builder.push(" OFFSET ").push_bind(offset);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(entry_from_row).collect()
    }

    async fn count(&self, filter: &ActivityFilter) -> Result<i64> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) AS count FROM activity_log");
        push_filter(&mut builder, filter);

        let row = builder.build().fetch_one(&self.pool).await?;
        Ok(row.try_get("count")?)
    }

    async fn counts_by_action(&self, filter: &ActivityFilter) -> Result<Vec<ActionCount>> {
        let mut builder =
            QueryBuilder::new("SELECT action, COUNT(*) AS count FROM activity_log");
        push_filter(&mut builder, filter);
        builder.push(" GROUP BY action ORDER BY count DESC, action ASC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                Ok(ActionCount {
                    action: row.try_get("action")?,
                    count: row.try_get("count")?,
                })
            })
            .collect()
    }

    async fn counts_by_resource_type(
        &self,
        filter: &ActivityFilter,
    ) -> Result<Vec<ResourceCount>> {
        let mut builder =
            QueryBuilder::new("SELECT resource_type, COUNT(*) AS count FROM activity_log");
        push_filter(&mut builder, filter);
        builder.push(" GROUP BY resource_type ORDER BY count DESC, resource_type ASC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                Ok(ResourceCount {
                    resource_type: row.try_get("resource_type")?,
                    count: row.try_get("count")?,
                })
            })
            .collect()
    }

    async fn export_all(&self) -> Result<Vec<ActivityEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM activity_log ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entry_from_row).collect()
    }
}
