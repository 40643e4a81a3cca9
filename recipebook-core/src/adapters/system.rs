//! Clock and navigator adapters

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::result::{Error, Result};
use crate::domain::{AuthResponse, Credentials, Recipe, View};
use crate::ports::{Clock, IdentityProvider, Navigator, RecipeStore};

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to an instant, adjustable by tests
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|guard| *guard).unwrap_or_else(|e| *e.into_inner())
    }
}

/// Backend for commands that only touch the stored session
///
/// Every remote call fails with a configuration error.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineBackend;

impl OfflineBackend {
    fn refuse<T>(&self) -> Result<T> {
        Err(Error::Config("This command runs without the backend".to_string()))
    }
}

#[async_trait]
impl IdentityProvider for OfflineBackend {
    async fn sign_up(&self, _credentials: &Credentials) -> Result<AuthResponse> {
        self.refuse()
    }

    async fn sign_in(&self, _credentials: &Credentials) -> Result<AuthResponse> {
        self.refuse()
    }
}

#[async_trait]
impl RecipeStore for OfflineBackend {
    async fn load(&self) -> Result<Vec<Recipe>> {
        self.refuse()
    }

    async fn save(&self, _recipes: &[Recipe]) -> Result<()> {
        self.refuse()
    }
}

/// Navigator that remembers every view it was sent to
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<View>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent view, if any navigation happened
    pub fn current(&self) -> Option<View> {
        self.history().last().copied()
    }

    pub fn history(&self) -> Vec<View> {
        self.history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, view: View) {
        if let Ok(mut history) = self.history.lock() {
            history.push(view);
        }
    }
}
