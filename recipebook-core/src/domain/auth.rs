//! Authentication payloads and provider error kinds

use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Shortest password the auth form accepts
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Request body for sign-up and sign-in
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub return_secure_token: bool,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            return_secure_token: true,
        }
    }

    /// Check the form rules before any request is sent
    pub fn validate(&self) -> Result<()> {
        if !self.email.contains('@') {
            return Err(Error::validation("Please enter a valid email address"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(Error::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        Ok(())
    }
}

/// Successful response of the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub id_token: String,
    pub email: String,
    pub refresh_token: String,
    /// Seconds until the ID token expires, sent as a string
    pub expires_in: String,
    pub local_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered: Option<bool>,
}

/// Error envelope returned by the identity provider
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Known identity provider failures
///
/// Every provider code maps to exactly one kind; anything unrecognised
/// becomes `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthErrorKind {
    // Sign up
    EmailExists,
    OperationNotAllowed,
    TooManyAttempts,
    // Sign in
    EmailNotFound,
    InvalidPassword,
    UserDisabled,
    Unknown,
}

impl AuthErrorKind {
    /// All kinds, in table order
    pub const ALL: [AuthErrorKind; 7] = [
        AuthErrorKind::EmailExists,
        AuthErrorKind::OperationNotAllowed,
        AuthErrorKind::TooManyAttempts,
        AuthErrorKind::EmailNotFound,
        AuthErrorKind::InvalidPassword,
        AuthErrorKind::UserDisabled,
        AuthErrorKind::Unknown,
    ];

    /// Map a provider error code to a kind
    ///
    /// The provider sometimes appends detail after the code
    /// (`"TOO_MANY_ATTEMPTS_TRY_LATER : Access to this account..."`); only the
    /// code itself is matched.
    pub fn from_code(code: &str) -> Self {
        let code = code.split(" : ").next().unwrap_or(code).trim();
        match code {
            "EMAIL_EXISTS" => AuthErrorKind::EmailExists,
            "OPERATION_NOT_ALLOWED" => AuthErrorKind::OperationNotAllowed,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthErrorKind::TooManyAttempts,
            "EMAIL_NOT_FOUND" => AuthErrorKind::EmailNotFound,
            "INVALID_PASSWORD" => AuthErrorKind::InvalidPassword,
            "USER_DISABLED" => AuthErrorKind::UserDisabled,
            _ => AuthErrorKind::Unknown,
        }
    }

    /// Map a raw response body to a kind, treating anything without a
    /// readable `error.message` as unknown
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .and_then(|envelope| envelope.error)
            .and_then(|error| error.message)
            .map(|message| Self::from_code(&message))
            .unwrap_or(AuthErrorKind::Unknown)
    }

    /// Provider code for this kind (`None` for `Unknown`)
    pub fn code(&self) -> Option<&'static str> {
        match self {
            AuthErrorKind::EmailExists => Some("EMAIL_EXISTS"),
            AuthErrorKind::OperationNotAllowed => Some("OPERATION_NOT_ALLOWED"),
            AuthErrorKind::TooManyAttempts => Some("TOO_MANY_ATTEMPTS_TRY_LATER"),
            AuthErrorKind::EmailNotFound => Some("EMAIL_NOT_FOUND"),
            AuthErrorKind::InvalidPassword => Some("INVALID_PASSWORD"),
            AuthErrorKind::UserDisabled => Some("USER_DISABLED"),
            AuthErrorKind::Unknown => None,
        }
    }

    /// Human-readable message shown to the user
    pub fn message(&self) -> &'static str {
        match self {
            AuthErrorKind::EmailExists => "The email address is already in use by another account.",
            AuthErrorKind::OperationNotAllowed => "Password sign-in is disabled for this project.",
            AuthErrorKind::TooManyAttempts => {
                "We have blocked all requests from this device due to unusual activity. Try again later."
            }
            AuthErrorKind::EmailNotFound => {
                "There is no user record corresponding to this identifier. The user may have been deleted."
            }
            AuthErrorKind::InvalidPassword => "The password is invalid or the user does not have a password.",
            AuthErrorKind::UserDisabled => "The user account has been disabled by an administrator.",
            AuthErrorKind::Unknown => "An unknown error occurred!",
        }
    }
}

impl std::fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}
