use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Action verbs recorded in the audit trail.
pub mod action {
    pub const CREATE: &str = "CREATE";
    pub const UPDATE: &str = "UPDATE";
    pub const DELETE: &str = "DELETE";
    pub const LOGIN: &str = "LOGIN";
    pub const LOGOUT: &str = "LOGOUT";
    pub const PUBLISH: &str = "PUBLISH";
}

/// Resource nouns recorded in the audit trail.
pub mod resource {
    pub const USER: &str = "user";
    pub const PROJECT: &str = "project";
    pub const BLOG: &str = "blog";
    pub const UPLOAD: &str = "upload";
}

/// One immutable audit record: who did what to which resource.
///
/// `user_id` is `None` only for entries whose actor has since been deleted;
/// the entry itself outlives the account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: i64,
    pub user_id: Option<i64>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub details: JsonValue,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Client metadata captured from the incoming request.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// An entry about to be appended.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user_id: i64,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub details: JsonValue,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl NewActivity {
    pub fn new(user_id: i64, action: &str, resource_type: &str) -> Self {
        Self {
            user_id,
            action: action.to_string(),
            resource_type: resource_type.to_string(),
            resource_id: None,
            details: JsonValue::Null,
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn resource_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    pub fn details(mut self, details: JsonValue) -> Self {
        self.details = details;
        self
    }

    pub fn meta(mut self, meta: &RequestMeta) -> Self {
        self.ip_address = meta.ip_address.clone();
        self.user_agent = meta.user_agent.clone();
        self
    }
}

/// Query filters. All fields are optional; unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub user_id: Option<i64>,
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityPage {
    pub entries: Vec<ActivityEntry>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionCount {
    pub action: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceCount {
    pub resource_type: String,
    pub count: i64,
}

/// Grouped counters for dashboard views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityStats {
    pub total_count: i64,
    pub counts_by_action: Vec<ActionCount>,
    pub counts_by_resource_type: Vec<ResourceCount>,
    pub recent_entries: Vec<ActivityEntry>,
}
