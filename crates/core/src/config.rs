use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Secret used to sign short-lived access tokens.
    pub access_token_secret: String,
    /// Separate secret for long-lived refresh tokens, so a leak of one
    /// cannot be used to forge the other.
    pub refresh_token_secret: String,
    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl_seconds: i64,
    #[serde(default = "default_refresh_token_ttl")]
    pub refresh_token_ttl_seconds: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_access_token_ttl() -> i64 {
    900 // 15 minutes
}

fn default_refresh_token_ttl() -> i64 {
    604_800 // 7 days
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from atelier.toml with environment variable overrides.
    /// Environment variables are prefixed with ATELIER_ and use `__` between
    /// section and key, e.g. ATELIER_DATABASE__URL, ATELIER_AUTH__ACCESS_TOKEN_SECRET.
    pub fn load_with_env() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("atelier").required(false))
            .add_source(config::Environment::with_prefix("ATELIER").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Reject configurations that must not reach serving.
    ///
    /// Absent or empty token secrets are a fatal startup error: defaulting
    /// them silently would mean every deployment signs tokens with a known
    /// value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.access_token_secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "auth.access_token_secret must be set".to_string(),
            ));
        }
        if self.auth.refresh_token_secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "auth.refresh_token_secret must be set".to_string(),
            ));
        }
        if self.auth.access_token_secret == self.auth.refresh_token_secret {
            return Err(ConfigError::Message(
                "auth.access_token_secret and auth.refresh_token_secret must differ".to_string(),
            ));
        }
        if self.auth.access_token_ttl_seconds <= 0 || self.auth.refresh_token_ttl_seconds <= 0 {
            return Err(ConfigError::Message(
                "token lifetimes must be positive".to_string(),
            ));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Message("database.url must be set".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
            },
            auth: AuthConfig {
                access_token_secret: "access-secret".to_string(),
                refresh_token_secret: "refresh-secret".to_string(),
                access_token_ttl_seconds: default_access_token_ttl(),
                refresh_token_ttl_seconds: default_refresh_token_ttl(),
            },
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
            },
        }
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_access_token_ttl(), 900);
        assert_eq!(default_refresh_token_ttl(), 604_800);
        assert_eq!(default_host(), "0.0.0.0");
        assert_eq!(default_port(), 3000);
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_missing_secret_is_fatal() {
        let mut cfg = valid_config();
        cfg.auth.access_token_secret = "".to_string();
        assert!(cfg.validate().is_err());

        let mut cfg = valid_config();
        cfg.auth.refresh_token_secret = "   ".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_identical_secrets_rejected() {
        let mut cfg = valid_config();
        cfg.auth.refresh_token_secret = cfg.auth.access_token_secret.clone();
        assert!(cfg.validate().is_err());
    }
}
