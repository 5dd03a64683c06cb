use std::sync::Arc;

use reqwest::header::{HeaderValue, AUTHORIZATION};

use crate::auth::store::TokenStore;
use crate::error::{AppError, AppResult};

/// Side effect performed when an operation needs a login first.
pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self);
}

/// Navigator for terminal use: tells the operator how to log in.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect_to_login(&self) {
        tracing::warn!("Not logged in. Run `estate-admin login <username>` first");
    }
}

/// Credential capability handed to every client.
pub struct AuthSession {
    store: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
}

impl AuthSession {
    pub fn new(store: Arc<dyn TokenStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self { store, navigator }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Current access token, if one is stored.
    #[must_use]
    pub fn get_token(&self) -> Option<String> {
        match self.store.load() {
            Ok(tokens) => tokens.map(|t| t.access).filter(|access| !access.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored credentials");
                None
            }
        }
    }

    /// Current refresh token, if one is stored.
    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.store.load().ok().flatten().map(|t| t.refresh)
    }

    /// `Authorization: Bearer <token>`, or `None` for anonymous requests.
    #[must_use]
    pub fn auth_header(&self) -> Option<(reqwest::header::HeaderName, HeaderValue)> {
        let token = self.get_token()?;
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                Some((AUTHORIZATION, value))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stored token is not a valid header value");
                None
            }
        }
    }

    /// Token for a protected operation. Redirects to login when absent.
    ///
    /// # Errors
    ///
    /// Returns `AppError::LoginRequired` after redirecting if no token is stored.
    pub fn require_auth_or_redirect(&self) -> AppResult<String> {
        self.get_token().ok_or_else(|| {
            self.redirect_to_login();
            AppError::LoginRequired
        })
    }

    pub fn redirect_to_login(&self) {
        tracing::debug!("redirecting to login");
        self.navigator.redirect_to_login();
    }
}
