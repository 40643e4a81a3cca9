//! User domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Key of the persisted session record
pub const SESSION_KEY: &str = "userData";

/// Represents an authenticated user and the validity window of their token
///
/// Serializes to the session record format:
/// `{"email", "id", "_token", "_tokenExpirationDate"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub id: String,
    #[serde(rename = "_token")]
    token: String,
    #[serde(rename = "_tokenExpirationDate")]
    token_expiration_date: DateTime<Utc>,
}

impl User {
    pub fn new(
        email: impl Into<String>,
        id: impl Into<String>,
        token: impl Into<String>,
        token_expiration_date: DateTime<Utc>,
    ) -> Self {
        Self {
            email: email.into(),
            id: id.into(),
            token: token.into(),
            token_expiration_date,
        }
    }

    /// The token, if it has not expired at `now`
    pub fn token_at(&self, now: DateTime<Utc>) -> Option<&str> {
        if now < self.token_expiration_date {
            Some(&self.token)
        } else {
            None
        }
    }

    /// The token, if it has not expired yet
    pub fn token(&self) -> Option<&str> {
        self.token_at(Utc::now())
    }

    pub fn token_expiration_date(&self) -> DateTime<Utc> {
        self.token_expiration_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_token_valid_until_expiration() {
        let expires = Utc::now() + Duration::hours(1);
        let user = User::new("test@example.com", "user-123", "secret", expires);

        assert_eq!(user.token_at(expires - Duration::seconds(1)), Some("secret"));
        assert_eq!(user.token_at(expires), None);
        assert_eq!(user.token(), Some("secret"));
    }

    #[test]
    fn test_session_record_format() {
        let expires = DateTime::parse_from_rfc3339("2030-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let user = User::new("test@example.com", "user-123", "secret", expires);

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["email"], "test@example.com");
        assert_eq!(json["id"], "user-123");
        assert_eq!(json["_token"], "secret");
        assert!(json["_tokenExpirationDate"].as_str().unwrap().starts_with("2030-01-01T00:00:00"));
    }

    #[test]
    fn test_reads_browser_style_timestamps() {
        let record = r#"{"email":"a@b.com","id":"1","_token":"t","_tokenExpirationDate":"2030-01-01T10:00:00.000Z"}"#;
        let user: User = serde_json::from_str(record).unwrap();
        assert_eq!(user.token_expiration_date().to_rfc3339(), "2030-01-01T10:00:00+00:00");
    }
}
