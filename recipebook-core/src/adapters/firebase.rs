//! Firebase clients
//!
//! - `FirebaseAuthClient`: Identity Toolkit sign-up and password sign-in
//! - `FirebaseRecipeStore`: Realtime Database document holding every recipe
//!
//! API Documentation: https://firebase.google.com/docs/reference/rest/auth

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use url::Url;

use crate::config::Config;
use crate::domain::result::{Error, Result};
use crate::domain::{AuthErrorKind, AuthResponse, Credentials, Recipe};
use crate::ports::{IdentityProvider, RecipeStore};
use crate::services::AuthInterceptor;

const REQUEST_TIMEOUT_SECS: u64 = 30;

fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))
}

/// Map request errors to user-friendly messages
fn map_request_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::storage(format!("Connection timed out after {} seconds", REQUEST_TIMEOUT_SECS))
    } else if error.is_connect() {
        Error::storage("Unable to connect to the recipe store")
    } else if error.is_decode() {
        Error::storage(format!("Recipe store returned an unreadable document: {}", error))
    } else {
        Error::storage(format!("Recipe store request failed: {}", error))
    }
}

// =============================================================================
// Identity
// =============================================================================

/// Identity Toolkit client
#[derive(Debug, Clone)]
pub struct FirebaseAuthClient {
    client: Client,
    sign_up_url: Url,
    sign_in_url: Url,
}

impl FirebaseAuthClient {
    /// Create a client from configuration
    ///
    /// Fails with a configuration error when no API key is set.
    pub fn new(config: &Config) -> Result<Self> {
        if !config.has_api_key() {
            return Err(Error::Config(format!(
                "No identity API key configured. Run 'rb config set apiKey <key>' or set {}",
                crate::config::API_KEY_ENV
            )));
        }
        Self::new_with_base_url(&config.identity_url, &config.api_key)
    }

    /// Create a client against a custom base URL (staging or mock servers)
    pub fn new_with_base_url(base_url: &str, api_key: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/');
        let endpoint = |operation: &str| -> Result<Url> {
            Url::parse_with_params(&format!("{}/accounts:{}", base_url, operation), &[("key", api_key)])
                .map_err(|e| Error::Config(format!("Invalid identity URL '{}': {}", base_url, e)))
        };

        Ok(Self {
            client: build_client()?,
            sign_up_url: endpoint("signUp")?,
            sign_in_url: endpoint("signInWithPassword")?,
        })
    }

    pub fn sign_up_url(&self) -> &Url {
        &self.sign_up_url
    }

    pub fn sign_in_url(&self) -> &Url {
        &self.sign_in_url
    }

    /// POST the credentials and decode either the response or the error envelope
    ///
    /// Anything that is not a well-formed success ends up as an
    /// `Error::Auth`; transport failures and unreadable bodies are `Unknown`.
    async fn authenticate(&self, url: &Url, credentials: &Credentials) -> Result<AuthResponse> {
        let response = self
            .client
            .post(url.clone())
            .json(credentials)
            .send()
            .await
            .map_err(|_| Error::Auth(AuthErrorKind::Unknown))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Auth(AuthErrorKind::from_body(&body)));
        }

        response
            .json::<AuthResponse>()
            .await
            .map_err(|_| Error::Auth(AuthErrorKind::Unknown))
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuthClient {
    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthResponse> {
        self.authenticate(&self.sign_up_url, credentials).await
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthResponse> {
        self.authenticate(&self.sign_in_url, credentials).await
    }
}

// =============================================================================
// Recipe document
// =============================================================================

/// Realtime Database client for the recipe document
///
/// Every request goes through the `AuthInterceptor`, so the current session
/// token is attached as the `auth` query parameter when a user is signed in.
#[derive(Debug, Clone)]
pub struct FirebaseRecipeStore {
    client: Client,
    url: Url,
    interceptor: AuthInterceptor,
}

impl FirebaseRecipeStore {
    pub fn new(recipes_url: &str, interceptor: AuthInterceptor) -> Result<Self> {
        let url = Url::parse(recipes_url)
            .map_err(|e| Error::Config(format!("Invalid recipes URL '{}': {}", recipes_url, e)))?;

        Ok(Self {
            client: build_client()?,
            url,
            interceptor,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Check response status and return appropriate errors
    async fn check_response_status(response: Response) -> Result<Response> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::storage(
                "The recipe store rejected the request. Your session may have expired; log in again.",
            )),
            StatusCode::NOT_FOUND => Err(Error::storage(format!("Recipe document not found at {}", response.url()))),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::storage(format!("Recipe store error: HTTP {} {}", status.as_u16(), body.trim())))
            }
        }
    }
}

#[async_trait]
impl RecipeStore for FirebaseRecipeStore {
    async fn load(&self) -> Result<Vec<Recipe>> {
        let response = self
            .interceptor
            .intercept(self.client.get(self.url.clone()))
            .send()
            .await
            .map_err(map_request_error)?;

        let response = Self::check_response_status(response).await?;

        // An empty database answers with `null`
        let recipes: Option<Vec<Recipe>> = response.json().await.map_err(map_request_error)?;
        Ok(recipes.unwrap_or_default())
    }

    async fn save(&self, recipes: &[Recipe]) -> Result<()> {
        let response = self
            .interceptor
            .intercept(self.client.put(self.url.clone()))
            .json(recipes)
            .send()
            .await
            .map_err(map_request_error)?;

        Self::check_response_status(response).await?;
        Ok(())
    }
}
