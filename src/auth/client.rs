use std::sync::Arc;

use reqwest::Client;
use serde_json::json;

use crate::api::client::{check_status, send_json};
use crate::api::models::{TokenPair, User};
use crate::auth::AuthSession;
use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Token endpoints and the profile of the logged-in operator.
pub struct AuthClient {
    http_client: Client,
    config: Arc<Config>,
    session: Arc<AuthSession>,
}

impl AuthClient {
    #[must_use]
    pub fn new(http_client: Client, config: Arc<Config>, session: Arc<AuthSession>) -> Self {
        Self {
            http_client,
            config,
            session,
        }
    }

    /// Obtain a token pair and store it in the session's token store.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Http` with a `Login failed: ...` message when the
    /// credentials are rejected, or a transport/store error.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<TokenPair> {
        let request = self
            .http_client
            .post(self.config.api_url("token/"))
            .json(&json!({ "username": username, "password": password }));

        let tokens: TokenPair = send_json(request).await.map_err(|e| match e {
            AppError::Http { status, message } => AppError::Http {
                status,
                message: format!("Login failed: {message}"),
            },
            other => other,
        })?;

        self.session.store().save(&tokens)?;
        tracing::info!(username, "Logged in");
        Ok(tokens)
    }

    /// Invalidate the refresh token remotely, then forget both tokens.
    ///
    /// The stored tokens are kept if the remote call fails.
    ///
    /// # Errors
    ///
    /// Returns `AppError::LoginRequired` if there is nothing to log out, or the
    /// remote/store error.
    pub async fn logout(&self) -> AppResult<()> {
        let refresh = self
            .session
            .refresh_token()
            .ok_or(AppError::LoginRequired)?;

        let response = self
            .http_client
            .post(self.config.api_url("logout/"))
            .json(&json!({ "refresh": refresh }))
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;

        if let Err(e) = check_status(response).await {
            tracing::error!(error = %e, "Logout failed");
            return Err(e);
        }

        self.session.store().clear()?;
        tracing::info!("Logout successful");
        Ok(())
    }

    /// Profile of the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns `AppError::LoginRequired` (after redirecting) without a token,
    /// or the remote error.
    pub async fn profile(&self) -> AppResult<User> {
        let token = self.session.require_auth_or_redirect()?;
        let request = self
            .http_client
            .get(self.config.api_url("profile/"))
            .bearer_auth(token);

        send_json(request).await.map_err(|e| {
            if e.status() == Some(401) {
                self.session.redirect_to_login();
            }
            e
        })
    }
}
