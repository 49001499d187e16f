//! Credential store: the single persisted bearer token
//!
//! The session core is the only writer. The API client and the stateless
//! [`is_authenticated`] check only read, and must tolerate the token vanishing
//! between two reads (e.g. logout while a request is being built).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Io(_) => "STORE_IO",
            StoreError::Serde(_) => "STORE_SERDE",
        }
    }
}

/// Durable single-slot token storage
pub trait CredentialStore: Send + Sync {
    /// Current token, if any. Read failures are reported as absence.
    fn get(&self) -> Option<String>;

    fn set(&self, token: &str) -> Result<(), StoreError>;

    fn clear(&self) -> Result<(), StoreError>;
}

/// Stateless authentication check used by entry routing
///
/// `None` means there is no storage context at all, which is never authenticated.
pub fn is_authenticated(store: Option<&dyn CredentialStore>) -> bool {
    store
        .and_then(|s| s.get())
        .is_some_and(|token| !token.is_empty())
}

// ============================================================================
// In-memory store
// ============================================================================

/// Process-local store, used by tests and one-shot commands
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, token: &str) -> Result<(), StoreError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

// ============================================================================
// File store
// ============================================================================

#[derive(Serialize, Deserialize)]
struct TokenFile {
    token: String,
}

/// Token persisted as `{"token": "..."}` in a single file
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<String> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read token file {}: {}", self.path.display(), e);
                return None;
            }
        };
        match serde_json::from_str::<TokenFile>(&content) {
            Ok(file) => Some(file.token),
            Err(e) => {
                warn!("Ignoring malformed token file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn set(&self, token: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let body = serde_json::to_string(&TokenFile {
            token: token.to_string(),
        })?;
        std::fs::write(&self.path, body)?;
        debug!("Token persisted to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
