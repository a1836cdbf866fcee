mod seed;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use atelier_activity::{ActivityLog, SqlActivityStore};
use atelier_api::{AppState, router::router};
use atelier_auth::{AuthService, SqlUserStore, TokenConfig, TokenService};
use atelier_core::{AppConfig, Database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load_with_env().context("failed to load configuration")?;
    // Serving with missing or shared secrets is worse than not serving.
    config.validate().context("invalid configuration")?;

    let db = Database::connect(&config.database.url)
        .await
        .context("failed to connect to database")?;

    let tokens = TokenService::new(&TokenConfig {
        access_secret: config.auth.access_token_secret.clone(),
        refresh_secret: config.auth.refresh_token_secret.clone(),
        access_ttl_seconds: config.auth.access_token_ttl_seconds,
        refresh_ttl_seconds: config.auth.refresh_token_ttl_seconds,
    });
    let users = Arc::new(SqlUserStore::new(db.pool().clone()));
    let activity = ActivityLog::new(Arc::new(SqlActivityStore::new(db.pool().clone())));
    let auth = AuthService::new(users, tokens.clone(), activity.clone());

    seed::ensure_super_admin(&auth, &db).await?;

    let state = Arc::new(AppState::new(auth, activity, tokens));
    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
