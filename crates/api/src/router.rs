use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;

use crate::{AppState, activity_handlers, auth_handlers, middleware as acl};
use atelier_auth::Role;

/// Role sets are enumerated explicitly per route group; nothing is
/// inherited between roles.
const ACTIVITY_STATS_ROLES: &[Role] = &[Role::Admin, Role::SuperAdmin];
const ACTIVITY_EXPORT_ROLES: &[Role] = &[Role::SuperAdmin];

pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/", get(|| async { "Atelier API running" }))
        .route("/auth/register", post(auth_handlers::register))
        .route("/auth/login", post(auth_handlers::login))
        .route("/auth/refresh", post(auth_handlers::refresh));

    // Routes for any authenticated caller
    let authenticated_routes = Router::new()
        .route("/auth/profile", get(auth_handlers::profile))
        .route("/auth/logout", post(auth_handlers::logout))
        .route("/activity/logs", get(activity_handlers::list_logs))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            acl::require_auth,
        ));

    // Dashboard aggregates
    let stats_routes = Router::new()
        .route("/activity/stats", get(activity_handlers::stats))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            acl::require_roles(ACTIVITY_STATS_ROLES),
        ));

    // Full dump
    let export_routes = Router::new()
        .route("/activity/export", get(activity_handlers::export))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            acl::require_roles(ACTIVITY_EXPORT_ROLES),
        ));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .merge(stats_routes)
        .merge(export_routes)
        .with_state(state)
}
