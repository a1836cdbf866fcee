pub mod activity_handlers;
pub mod auth_handlers;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use state::AppState;
