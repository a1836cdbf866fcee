mod error;

pub mod model;
pub mod service;
pub mod store;

pub use error::{ActivityError, Result};
pub use model::{
    ActionCount, ActivityEntry, ActivityFilter, ActivityPage, ActivityStats, NewActivity,
    Pagination, RequestMeta, ResourceCount, action, resource,
};
pub use service::ActivityLog;
pub use store::{ActivityStore, SqlActivityStore};
