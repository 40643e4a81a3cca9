//! Identity provider port

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::{AuthResponse, Credentials};

/// Remote identity provider
///
/// Implementations issue exactly one request per call and never retry.
/// Provider failures are returned as `Error::Auth` with the mapped kind.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create a new account with email and password
    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthResponse>;

    /// Sign in to an existing account with email and password
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthResponse>;
}
