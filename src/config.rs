use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deployment {
    Local,
    Dev,
    Stage,
    Prod,
}

impl Deployment {
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Self::Dev,
            "stage" | "staging" => Self::Stage,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Remote API
    pub api_base_url: String,
    pub api_timeout_seconds: u64,
    pub api_skip_ngrok_warning: bool,

    // Credentials
    pub token_store_path: PathBuf,

    // User directory cache
    pub directory_cache_ttl_seconds: u64,
    pub directory_cache_capacity: u64,

    // Application metadata
    pub deployment: Deployment,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if required environment variables are not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_base_url =
            env::var("API_BASE_URL").map_err(|_| ConfigError::Missing("API_BASE_URL"))?;

        Ok(Self {
            // Remote API
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            api_timeout_seconds: env::var("API_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            api_skip_ngrok_warning: env::var("API_SKIP_NGROK_WARNING")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),

            // Credentials
            token_store_path: env::var("TOKEN_STORE_PATH")
                .unwrap_or_else(|_| ".estate-admin-tokens.json".to_string())
                .into(),

            // User directory cache
            directory_cache_ttl_seconds: env::var("DIRECTORY_CACHE_TTL_SECONDS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300),
            directory_cache_capacity: env::var("DIRECTORY_CACHE_CAPACITY")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap_or(1000),

            // Application metadata
            deployment: Deployment::from_str(
                &env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            ),
            log_format: LogFormat::from_str(
                &env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            ),
        })
    }

    /// Defaults for everything except the API location.
    #[must_use]
    pub fn with_base_url(api_base_url: impl Into<String>) -> Self {
        let api_base_url: String = api_base_url.into();
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            api_timeout_seconds: 10,
            api_skip_ngrok_warning: true,
            token_store_path: ".estate-admin-tokens.json".into(),
            directory_cache_ttl_seconds: 300,
            directory_cache_capacity: 1000,
            deployment: Deployment::Local,
            log_format: LogFormat::Pretty,
        }
    }

    #[must_use]
    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_seconds)
    }

    /// Absolute URL for a path under `/api/`, e.g. `api_url("buildings/")`.
    #[must_use]
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.api_base_url, path)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
