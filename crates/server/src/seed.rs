use anyhow::Context;
use sqlx::Row;
use tracing::{info, warn};

use atelier_activity::RequestMeta;
use atelier_auth::{AuthService, NewAccount, Role};
use atelier_core::Database;

const DEFAULT_ADMIN_EMAIL: &str = "admin@atelier.local";
const DEFAULT_ADMIN_PASSWORD: &str = "change-me-now";

/// Make sure at least one super_admin exists, so a fresh deployment can be
/// administered at all. Credentials come from ATELIER_SEED_EMAIL and
/// ATELIER_SEED_PASSWORD, with loud defaults for local development.
pub async fn ensure_super_admin(auth: &AuthService, db: &Database) -> anyhow::Result<()> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM users WHERE role = ?")
        .bind(Role::SuperAdmin.as_str())
        .fetch_one(db.pool())
        .await
        .context("failed to count super_admin accounts")?;
    let count: i64 = row.try_get("count")?;

    if count > 0 {
        info!(count, "super_admin account(s) already exist");
        return Ok(());
    }

    let email =
        std::env::var("ATELIER_SEED_EMAIL").unwrap_or_else(|_| DEFAULT_ADMIN_EMAIL.to_string());
    let password = std::env::var("ATELIER_SEED_PASSWORD")
        .unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string());

    auth.register_with_role(
        NewAccount {
            email: email.clone(),
            password: password.clone(),
            display_name: "Administrator".to_string(),
        },
        Role::SuperAdmin,
        &RequestMeta::default(),
    )
    .await
    .context("failed to create initial super_admin")?;

    info!(%email, "created initial super_admin account");
    if password == DEFAULT_ADMIN_PASSWORD {
        warn!("initial super_admin uses the default password; change it before exposing this server");
    }

    Ok(())
}
