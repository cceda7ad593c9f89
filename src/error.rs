//! Error type for the record operations behind the HTTP surface.
//!
//! CLI, configuration, and migration paths use `anyhow`; the request-path
//! operations return [`ScoutError`] so the server can tell client mistakes
//! apart from store failures without inspecting message text.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoutError {
    /// The caller supplied incomplete or malformed input.
    #[error("{0}")]
    Validation(String),

    #[error("CSV decode failed: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Db(#[from] sqlx::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ScoutError {
    pub fn validation(message: impl Into<String>) -> Self {
        ScoutError::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ScoutError::Validation(_))
    }
}

pub type ScoutResult<T> = std::result::Result<T, ScoutError>;
