use axum::Json;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::AuthUser;
use atelier_activity::ActivityFilter;
use atelier_auth::Role;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub user_id: Option<i64>,
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl LogsQuery {
    fn into_filter(self) -> ActivityFilter {
        ActivityFilter {
            user_id: self.user_id,
            action: self.action,
            resource_type: self.resource_type,
            resource_id: self.resource_id,
            from: self.from,
            to: self.to,
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Roles allowed to read other users' activity. Handlers own this check;
/// the middleware only gates on route-level role sets.
fn is_privileged(role: Role) -> bool {
    matches!(role, Role::Admin | Role::SuperAdmin)
}

/// GET /activity/logs
pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Query(query): Query<LogsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut filter = query.into_filter();

    // Non-privileged callers only ever see their own trail, whatever
    // user_id they asked for.
    if !is_privileged(claims.role) {
        filter.user_id = Some(claims.user_id()?);
    }

    let page = state.activity.query(&filter).await?;
    Ok(Json(page))
}

/// GET /activity/stats
pub async fn stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state.activity.aggregate_stats(&query.into_filter()).await?;
    Ok(Json(stats))
}

/// GET /activity/export
pub async fn export(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = state.activity.export().await?;

    Ok((
        [(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"activity-export.json\"",
        )],
        Json(entries),
    ))
}
