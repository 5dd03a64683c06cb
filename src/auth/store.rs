use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::models::TokenPair;
use crate::error::{AppError, AppResult};

/// Where the credential pair lives between invocations.
pub trait TokenStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `AppError::TokenStore` if the backing storage cannot be read.
    fn load(&self) -> AppResult<Option<TokenPair>>;

    /// # Errors
    ///
    /// Returns `AppError::TokenStore` if the backing storage cannot be written.
    fn save(&self, tokens: &TokenPair) -> AppResult<()>;

    /// # Errors
    ///
    /// Returns `AppError::TokenStore` if the backing storage cannot be cleared.
    fn clear(&self) -> AppResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<Option<TokenPair>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            tokens: RwLock::new(Some(tokens)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> AppResult<Option<TokenPair>> {
        self.tokens
            .read()
            .map(|guard| guard.clone())
            .map_err(|e| AppError::TokenStore(e.to_string()))
    }

    fn save(&self, tokens: &TokenPair) -> AppResult<()> {
        let mut guard = self
            .tokens
            .write()
            .map_err(|e| AppError::TokenStore(e.to_string()))?;
        *guard = Some(tokens.clone());
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        let mut guard = self
            .tokens
            .write()
            .map_err(|e| AppError::TokenStore(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}

/// On-disk layout of [`FileTokenStore`].
#[derive(Debug, Serialize, Deserialize)]
struct StoredTokens {
    #[serde(flatten)]
    tokens: TokenPair,
    saved_at: DateTime<Utc>,
}

/// JSON file holding the token pair, shared by every CLI invocation.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// When the stored pair was written, if any.
    ///
    /// # Errors
    ///
    /// Returns `AppError::TokenStore` if the file exists but cannot be read.
    pub fn saved_at(&self) -> AppResult<Option<DateTime<Utc>>> {
        Ok(self.read()?.map(|stored| stored.saved_at))
    }

    fn read(&self) -> AppResult<Option<StoredTokens>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::TokenStore(format!(
                    "{}: {e}",
                    self.path.display()
                )));
            }
        };

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| AppError::TokenStore(format!("{}: {e}", self.path.display())))
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> AppResult<Option<TokenPair>> {
        Ok(self.read()?.map(|stored| stored.tokens))
    }

    fn save(&self, tokens: &TokenPair) -> AppResult<()> {
        let stored = StoredTokens {
            tokens: tokens.clone(),
            saved_at: Utc::now(),
        };
        let json = serde_json::to_vec_pretty(&stored)
            .map_err(|e| AppError::TokenStore(e.to_string()))?;
        fs::write(&self.path, json)
            .map_err(|e| AppError::TokenStore(format!("{}: {e}", self.path.display())))?;

        tracing::debug!(path = %self.path.display(), "tokens_saved");
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(AppError::TokenStore(format!(
                    "{}: {e}",
                    self.path.display()
                )));
            }
        }

        tracing::debug!(path = %self.path.display(), "tokens_cleared");
        Ok(())
    }
}
