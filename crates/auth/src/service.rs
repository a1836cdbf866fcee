use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use atelier_activity::{ActivityLog, NewActivity, RequestMeta, action, resource};

use crate::error::{AuthError, Result};
use crate::model::{Role, UserProfile};
use crate::password::{hash_password, verify_password};
use crate::store::{NewUser, UserStore};
use crate::token::TokenService;

/// Registration input, already shape-validated at the HTTP boundary.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Orchestrates credential store, password hasher, and token service into
/// the register/login/refresh/profile/logout flows.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: TokenService,
    activity: ActivityLog,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenService, activity: ActivityLog) -> Self {
        Self {
            users,
            tokens,
            activity,
        }
    }

    /// Create an account with the default role and log the caller in.
    ///
    /// Duplicate emails surface as [`AuthError::EmailTaken`] straight from
    /// the database's unique constraint; there is no pre-check, so two
    /// concurrent registrations cannot both win.
    pub async fn register(
        &self,
        account: NewAccount,
        meta: &RequestMeta,
    ) -> Result<(UserProfile, TokenPair)> {
        self.register_with_role(account, Role::User, meta).await
    }

    /// Same as [`register`](Self::register) but with an explicit role.
    /// Used by seeding and privileged account creation.
    pub async fn register_with_role(
        &self,
        account: NewAccount,
        role: Role,
        meta: &RequestMeta,
    ) -> Result<(UserProfile, TokenPair)> {
        let password_hash = hash_password(&account.password)?;

        let user = self
            .users
            .create(NewUser {
                email: account.email,
                display_name: account.display_name,
                password_hash,
                role,
            })
            .await?;

        let tokens = self.issue_pair(&user)?;

        info!(user_id = user.id, "user registered");
        self.audit(
            NewActivity::new(user.id, action::CREATE, resource::USER)
                .resource_id(user.id.to_string())
                .details(json!({ "email": user.email }))
                .meta(meta),
        )
        .await;

        Ok((UserProfile::from(user), tokens))
    }

    /// Exchange credentials for a token pair.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        meta: &RequestMeta,
    ) -> Result<(UserProfile, TokenPair)> {
        // Unknown email and wrong password take the same exit.
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.issue_pair(&user)?;

        info!(user_id = user.id, "user logged in");
        self.audit(
            NewActivity::new(user.id, action::LOGIN, resource::USER)
                .resource_id(user.id.to_string())
                .meta(meta),
        )
        .await;

        Ok((UserProfile::from(user), tokens))
    }

    /// Mint a fresh access token from a refresh token. The refresh token
    /// itself is not rotated.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String> {
        let claims = self.tokens.verify_refresh_token(refresh_token)?;
        let user_id = claims.user_id()?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        // A logout after this token was issued bumped the stored version.
        if claims.ver != user.token_version {
            return Err(AuthError::InvalidToken);
        }

        self.tokens.issue_access_token(&user)
    }

    pub async fn profile(&self, user_id: i64) -> Result<UserProfile> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(UserProfile::from(user))
    }

    /// Invalidate all outstanding refresh tokens for the caller. Access
    /// tokens already in the wild simply expire.
    pub async fn logout(&self, user_id: i64, meta: &RequestMeta) -> Result<()> {
        self.users.bump_token_version(user_id).await?;

        info!(user_id, "user logged out");
        self.audit(
            NewActivity::new(user_id, action::LOGOUT, resource::USER)
                .resource_id(user_id.to_string())
                .meta(meta),
        )
        .await;

        Ok(())
    }

    fn issue_pair(&self, user: &crate::model::User) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.tokens.issue_access_token(user)?,
            refresh_token: self.tokens.issue_refresh_token(user)?,
        })
    }

    /// Best-effort audit write: a failed append is logged for operators and
    /// never aborts the flow that triggered it.
    async fn audit(&self, entry: NewActivity) {
        if let Err(err) = self.activity.record(entry).await {
            warn!(error = %err, "activity log write failed");
        }
    }
}
