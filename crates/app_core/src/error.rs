//! Application error types

use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Registry errors (state unchanged, notify user) =====
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Path already exists: {0}")]
    Conflict(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    // ===== No-op (nothing selected / nothing to paste) =====
    #[error("Nothing selected")]
    EmptySelection,

    // ===== Infrastructure =====
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Init(String),
}

impl AppError {
    /// Is this error recoverable?
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AppError::Init(_))
    }

    /// Should the caller silently ignore this error?
    pub fn is_noop(&self) -> bool {
        matches!(self, AppError::EmptySelection)
    }

    /// Get a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AppError::NotFound(what) => format!("Not found: {}", what),
            AppError::Conflict(path) => format!("An item named {} already exists", path),
            AppError::InvalidName(msg) => format!("Invalid name: {}", msg),
            AppError::InvalidPath(msg) => format!("Cannot do that here: {}", msg),
            AppError::EmptySelection => "Select at least one item first".to_string(),
            AppError::Storage(_) => "Changes could not be saved".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<app_fs::FsError> for AppError {
    fn from(e: app_fs::FsError) -> Self {
        match e {
            app_fs::FsError::InvalidName(msg) => AppError::InvalidName(msg),
            app_fs::FsError::InvalidPath(msg) => AppError::InvalidPath(msg),
        }
    }
}

impl From<app_db::DbError> for AppError {
    fn from(e: app_db::DbError) -> Self {
        AppError::Storage(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
