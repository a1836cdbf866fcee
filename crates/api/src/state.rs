use atelier_activity::ActivityLog;
use atelier_auth::{AuthService, TokenService};

/// Application state shared across all handlers. Built once in the
/// composition root and cloned per request via `Arc`.
pub struct AppState {
    pub auth: AuthService,
    pub activity: ActivityLog,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(auth: AuthService, activity: ActivityLog, tokens: TokenService) -> Self {
        Self {
            auth,
            activity,
            tokens,
        }
    }
}
