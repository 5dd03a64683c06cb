use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Request failed: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Validation failed ({status}): {}", format_fields(.fields))]
    Validation {
        status: u16,
        fields: BTreeMap<String, Vec<String>>,
    },

    #[error("Failed to parse response: {0}")]
    Decode(String),

    #[error("Login required")]
    LoginRequired,

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Token store error: {0}")]
    TokenStore(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl AppError {
    /// HTTP status carried by the error, if the remote side answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } | Self::Validation { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the operator has to log in again before retrying.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::LoginRequired) || self.status() == Some(401)
    }
}

fn format_fields(fields: &BTreeMap<String, Vec<String>>) -> String {
    fields
        .iter()
        .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type AppResult<T> = Result<T, AppError>;

/// Uniform error shape shown by list, edit and picker flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorState {
    pub message: String,
    pub status: Option<u16>,
    pub cause: String,
}

impl ErrorState {
    #[must_use]
    pub fn new(message: impl Into<String>, error: &AppError) -> Self {
        Self {
            message: message.into(),
            status: error.status(),
            cause: error.to_string(),
        }
    }
}

impl std::error::Error for ErrorState {}

impl fmt::Display for ErrorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} ({status}): {}", self.message, self.cause),
            None => write!(f, "{}: {}", self.message, self.cause),
        }
    }
}
