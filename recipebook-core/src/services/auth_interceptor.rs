//! Auth interceptor - attaches the session token to outgoing requests

use std::sync::Arc;

use reqwest::RequestBuilder;
use tokio::sync::watch;

use crate::domain::User;
use crate::ports::Clock;

/// Query parameter carrying the session token
pub const AUTH_QUERY_PARAM: &str = "auth";

/// Request decorator fed by the current-user channel
///
/// Each request reads the latest published user once and does not wait for
/// further changes. With no user, or an expired token, the request is passed
/// through untouched.
#[derive(Clone)]
pub struct AuthInterceptor {
    user: watch::Receiver<Option<User>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AuthInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthInterceptor")
            .field("signed_in", &self.user.borrow().is_some())
            .finish()
    }
}

impl AuthInterceptor {
    pub fn new(user: watch::Receiver<Option<User>>, clock: Arc<dyn Clock>) -> Self {
        Self { user, clock }
    }

    /// The token to attach right now, if any
    pub fn current_token(&self) -> Option<String> {
        let now = self.clock.now();
        self.user
            .borrow()
            .as_ref()
            .and_then(|user| user.token_at(now).map(str::to_string))
    }

    pub fn intercept(&self, request: RequestBuilder) -> RequestBuilder {
        match self.current_token() {
            Some(token) => request.query(&[(AUTH_QUERY_PARAM, token)]),
            None => request,
        }
    }
}
