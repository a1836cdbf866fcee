use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};
use crate::model::{Role, User};

const REFRESH_TOKEN_TYPE: &str = "refresh";

/// Claims carried by a short-lived access token. Stateless: everything a
/// request handler needs to know about the caller is in here, as of the
/// moment the token was issued.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
}

impl AccessClaims {
    pub fn user_id(&self) -> Result<i64> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Claims carried by a long-lived refresh token. Carries no identity data
/// beyond the subject; its only job is minting new access tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    pub sub: String,
    /// Always "refresh". Rejecting any other value stops an access token
    /// being replayed through the refresh endpoint.
    pub token_type: String,
    /// Snapshot of the user's token_version at issue time.
    pub ver: i64,
    pub iat: i64,
    pub exp: i64,
}

impl RefreshClaims {
    pub fn user_id(&self) -> Result<i64> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Signing configuration, read once at boot.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
}

/// Issues and verifies both token classes.
///
/// Access and refresh tokens are signed with different secrets: leaking one
/// does not let an attacker forge the other, and cross-use fails at the
/// signature check before any claim is inspected.
#[derive(Clone)]
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_ttl_seconds: config.access_ttl_seconds,
            refresh_ttl_seconds: config.refresh_ttl_seconds,
        }
    }

    pub fn issue_access_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.display_name.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.access_ttl_seconds)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.access_encoding)
            .map_err(|e| AuthError::TokenSigning(e.to_string()))
    }

    pub fn issue_refresh_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: user.id.to_string(),
            token_type: REFRESH_TOKEN_TYPE.to_string(),
            ver: user.token_version,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.refresh_ttl_seconds)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.refresh_encoding)
            .map_err(|e| AuthError::TokenSigning(e.to_string()))
    }

    /// Verify signature and expiry against the access secret.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims> {
        let data = decode::<AccessClaims>(token, &self.access_decoding, &validation())
            .map_err(map_decode_error)?;
        Ok(data.claims)
    }

    /// Verify signature, expiry, and the `token_type` claim against the
    /// refresh secret.
    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims> {
        let data = decode::<RefreshClaims>(token, &self.refresh_decoding, &validation())
            .map_err(map_decode_error)?;

        if data.claims.token_type != REFRESH_TOKEN_TYPE {
            return Err(AuthError::InvalidToken);
        }

        Ok(data.claims)
    }
}

fn validation() -> Validation {
    let mut validation = Validation::default();
    // No leeway: an expired token is expired, which keeps expiry behavior
    // deterministic for clients and tests alike.
    validation.leeway = 0;
    validation
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        _ => AuthError::InvalidToken,
    }
}
