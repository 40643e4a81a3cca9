//! Auth service - current user, sign-in/sign-up, session persistence and expiry

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::result::{Error, Result};
use crate::domain::{AuthErrorKind, AuthResponse, Credentials, User, View, SESSION_KEY};
use crate::ports::{Clock, IdentityProvider, Navigator, SessionStorage};

use super::logging::{record, LogEvent, LoggingService};

/// Auth service
///
/// The current user is published on a replay-latest channel: new
/// subscribers immediately see the last value. At most one logout timer is
/// pending at any time.
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    storage: Arc<dyn SessionStorage>,
    navigator: Arc<dyn Navigator>,
    clock: Arc<dyn Clock>,
    logger: Option<Arc<LoggingService>>,
    user: watch::Sender<Option<User>>,
    expiration_timer: Mutex<Option<JoinHandle<()>>>,
    me: Weak<AuthService>,
}

impl AuthService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        storage: Arc<dyn SessionStorage>,
        navigator: Arc<dyn Navigator>,
        clock: Arc<dyn Clock>,
        logger: Option<Arc<LoggingService>>,
    ) -> Arc<Self> {
        let (user, _) = watch::channel(None);
        Arc::new_cyclic(|me| Self {
            identity,
            storage,
            navigator,
            clock,
            logger,
            user,
            expiration_timer: Mutex::new(None),
            me: me.clone(),
        })
    }

    /// Subscribe to the current user; the receiver starts at the latest value
    pub fn subscribe_user(&self) -> watch::Receiver<Option<User>> {
        self.user.subscribe()
    }

    pub fn current_user(&self) -> Option<User> {
        self.user.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.borrow().is_some()
    }

    /// Create an account and sign in as it
    pub async fn signup(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let credentials = Credentials::new(email, password);
        let result = self.identity.sign_up(&credentials).await;
        self.complete("signup", result)
    }

    /// Sign in with email and password
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let credentials = Credentials::new(email, password);
        let result = self.identity.sign_in(&credentials).await;
        self.complete("login", result)
    }

    fn complete(&self, action: &str, result: Result<AuthResponse>) -> Result<AuthResponse> {
        let outcome = result.and_then(|response| {
            self.handle_authentication(&response)?;
            Ok(response)
        });

        match &outcome {
            Ok(_) => self.log(LogEvent::new(format!("{}_succeeded", action))),
            Err(e) => {
                let kind = e.auth_kind().unwrap_or(AuthErrorKind::Unknown);
                let mut event = LogEvent::new(format!("{}_failed", action)).with_error(e.to_string());
                if let Some(code) = kind.code() {
                    event = event.with_code(code);
                }
                self.log(event);
            }
        }
        outcome
    }

    /// Publish the user from a provider response, arm the timer and persist the session
    fn handle_authentication(&self, response: &AuthResponse) -> Result<User> {
        let expires_in: u64 = response
            .expires_in
            .trim()
            .parse()
            .map_err(|_| Error::Auth(AuthErrorKind::Unknown))?;
        let expiration = i64::try_from(expires_in)
            .ok()
            .and_then(ChronoDuration::try_seconds)
            .and_then(|lifetime| self.clock.now().checked_add_signed(lifetime))
            .ok_or(Error::Auth(AuthErrorKind::Unknown))?;

        let user = User::new(
            response.email.clone(),
            response.local_id.clone(),
            response.id_token.clone(),
            expiration,
        );

        self.user.send_replace(Some(user.clone()));
        self.auto_logout(Duration::from_secs(expires_in));

        // The in-memory session stays valid even if it can't be persisted
        match serde_json::to_string(&user) {
            Ok(record) => {
                if let Err(e) = self.storage.set_item(SESSION_KEY, &record) {
                    self.log(LogEvent::new("session_persist_failed").with_error(e.to_string()));
                }
            }
            Err(e) => self.log(LogEvent::new("session_persist_failed").with_error(e.to_string())),
        }

        Ok(user)
    }

    /// Restore the persisted session, if it is still valid
    ///
    /// A missing or unreadable record means no session. An expired record is
    /// left in storage and the user stays signed out.
    pub fn auto_login(&self) -> Option<User> {
        let record = self.storage.get_item(SESSION_KEY).ok().flatten()?;
        let user: User = serde_json::from_str(&record).ok()?;

        let now = self.clock.now();
        user.token_at(now)?;

        let remaining = (user.token_expiration_date() - now)
            .to_std()
            .unwrap_or_default();

        self.user.send_replace(Some(user.clone()));
        self.auto_logout(remaining);
        self.log(LogEvent::new("session_restored"));

        Some(user)
    }

    /// Sign out: clear the user and the stored session, cancel the timer,
    /// and send the front end to the auth view
    pub fn logout(&self) {
        self.user.send_replace(None);
        self.navigator.navigate(View::Auth);
        if let Err(e) = self.storage.remove_item(SESSION_KEY) {
            self.log(LogEvent::new("session_clear_failed").with_error(e.to_string()));
        }
        self.cancel_timer();
        self.log(LogEvent::new("logout").with_view(View::Auth.path()));
    }

    /// Log out once `duration` has elapsed
    ///
    /// Any pending timer is cancelled first. Must be called from within a
    /// Tokio runtime.
    pub fn auto_logout(&self, duration: Duration) {
        let mut timer = self.timer();
        if let Some(previous) = timer.take() {
            previous.abort();
        }

        // Deadline is fixed now, not when the task is first polled
        let sleep = tokio::time::sleep(duration);
        let me = self.me.clone();
        *timer = Some(tokio::spawn(async move {
            sleep.await;
            if let Some(service) = me.upgrade() {
                service.expire();
            }
        }));
    }

    /// Whether a logout timer is pending
    pub fn has_pending_timer(&self) -> bool {
        self.timer()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn expire(&self) {
        {
            let mut timer = self.timer();
            // A login may have re-armed the timer after this one fired
            let current = tokio::task::try_id();
            match timer.as_ref() {
                Some(handle) if Some(handle.id()) == current => {}
                _ => return,
            }
            // The running timer is this task; drop its handle instead of aborting it
            timer.take();
        }
        self.log(LogEvent::new("session_expired"));
        self.logout();
    }

    fn cancel_timer(&self) {
        if let Some(handle) = self.timer().take() {
            handle.abort();
        }
    }

    fn timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.expiration_timer.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn log(&self, event: LogEvent) {
        record(self.logger.as_deref(), event);
    }
}

impl Drop for AuthService {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
