use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::AppState;
use crate::error::ApiError;
use atelier_auth::{AccessClaims, Role};

/// Extract and verify the bearer token from the Authorization header.
/// Verification is purely cryptographic; no database round trip.
fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AccessClaims, ApiError> {
    let token = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

    state
        .tokens
        .verify_access_token(token)
        .map_err(ApiError::from)
}

/// Middleware to require authentication. Attaches the verified claims to
/// the request extensions; this is the only channel by which handlers
/// learn who is calling.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = authenticate(&state, request.headers())?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Middleware for routes that work with or without a caller identity. A
/// missing, malformed, or expired token all fall through to anonymous.
pub async fn optional_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Ok(claims) = authenticate(&state, request.headers()) {
        request.extensions_mut().insert(claims);
    }
    next.run(request).await
}

/// Middleware to require membership in an explicitly enumerated role set.
///
/// Membership is an exact check: a route gated on `[Admin]` rejects a
/// `SuperAdmin` unless the set lists it too. Hierarchy is never inferred.
pub fn require_roles(
    allowed: &'static [Role],
) -> impl Fn(
    State<Arc<AppState>>,
    Request,
    Next,
) -> Pin<Box<dyn Future<Output = Result<Response, ApiError>> + Send>>
+ Clone {
    move |State(state): State<Arc<AppState>>, mut request: Request, next: Next| {
        Box::pin(async move {
            let claims = authenticate(&state, request.headers())?;

            if !allowed.contains(&claims.role) {
                return Err(ApiError::Forbidden(format!(
                    "requires one of roles: {}",
                    allowed
                        .iter()
                        .map(|r| r.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )));
            }

            request.extensions_mut().insert(claims);
            Ok(next.run(request).await)
        })
    }
}
