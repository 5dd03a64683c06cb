use std::sync::Arc;

use crate::api::models::User;
use crate::api::{build_http_client, Resource, ResourceClient};
use crate::auth::{AuthClient, AuthSession, FileTokenStore, LogNavigator, Navigator, TokenStore};
use crate::config::Config;
use crate::error::AppResult;
use crate::services::UserDirectory;

/// Everything a command needs: one HTTP client, one session, shared by all resources.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub session: Arc<AuthSession>,
    http_client: reqwest::Client,
    pub users: Arc<ResourceClient<User>>,
    pub directory: Arc<UserDirectory<ResourceClient<User>>>,
}

impl AppContext {
    /// Context backed by the on-disk token store and the logging navigator.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Network` if the HTTP client cannot be built.
    pub fn new(config: Config) -> AppResult<Self> {
        let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&config.token_store_path));
        Self::with_parts(config, store, Arc::new(LogNavigator))
    }

    /// # Errors
    ///
    /// Returns `AppError::Network` if the HTTP client cannot be built.
    pub fn with_parts(
        config: Config,
        store: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> AppResult<Self> {
        let http_client = build_http_client(&config)?;
        let config = Arc::new(config);
        let session = Arc::new(AuthSession::new(store, navigator));

        let users = Arc::new(ResourceClient::new(
            http_client.clone(),
            Arc::clone(&config),
            Arc::clone(&session),
        ));
        let directory = Arc::new(UserDirectory::new(Arc::clone(&users), &config));

        Ok(Self {
            config,
            session,
            http_client,
            users,
            directory,
        })
    }

    #[must_use]
    pub fn client<T: Resource>(&self) -> ResourceClient<T> {
        ResourceClient::new(
            self.http_client.clone(),
            Arc::clone(&self.config),
            Arc::clone(&self.session),
        )
    }

    #[must_use]
    pub fn auth(&self) -> AuthClient {
        AuthClient::new(
            self.http_client.clone(),
            Arc::clone(&self.config),
            Arc::clone(&self.session),
        )
    }
}
