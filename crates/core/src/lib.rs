pub mod config;
pub mod db;

pub use config::{AppConfig, AuthConfig, DatabaseConfig, ServerConfig};
pub use db::Database;
