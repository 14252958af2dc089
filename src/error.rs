use serde::{Deserialize, Serialize};

/// Main application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("network error")]
    Network,

    #[error("api error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("unknown error: {0}")]
    Unknown(String),
}

/// Coarse classification carried on reactive state channels, where the
/// error itself cannot be cloned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Network,
    Api,
    Database,
    Unknown,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network => ErrorKind::Network,
            Self::Api { .. } => ErrorKind::Api,
            Self::Database(_) => ErrorKind::Database,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Only transport-level failures are safe to retry blindly.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::Unknown(err.to_string())
        } else {
            AppError::Network
        }
    }
}

/// Custom result type for the application
pub type AppResult<T> = Result<T, AppError>;
