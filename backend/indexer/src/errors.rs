//! Indexer error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("RPC transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The RPC answered, but not with something usable.
    #[error("Event parse error: {0}")]
    EventParse(String),
}

impl IndexerError {
    /// Whether the next poll may succeed without operator action.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Database(e) => matches!(e, sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, IndexerError>;
