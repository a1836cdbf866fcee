// Core modules
mod error;
mod password;
mod token;

// Store-integrated modules
pub mod model;
pub mod service;
pub mod store;

// Re-export error types
pub use error::{AuthError, Result};

// Re-export crypto primitives (for standalone use without a store)
pub use password::{hash_password, verify_password};
pub use token::{AccessClaims, RefreshClaims, TokenConfig, TokenService};

// Re-export store-integrated types
pub use model::{Role, User, UserProfile};
pub use service::{AuthService, NewAccount, TokenPair};
pub use store::{NewUser, SqlUserStore, UserStore};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AccessClaims, AuthError, AuthService, NewAccount, Result, Role, TokenConfig, TokenPair,
        TokenService, User, UserProfile,
    };
}
