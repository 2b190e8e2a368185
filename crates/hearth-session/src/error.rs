//! Error types for session store operations.

/// Error type for session store operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Error from the SQLite backend.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Error from any other storage backend.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Table name is not a plain SQL identifier.
    #[error("Invalid table name: {0:?}")]
    InvalidTable(String),

    /// Session map could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration could not be parsed.
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// The session manager has no registered store.
    #[error("No session store registered")]
    NotRegistered,

    /// Commit or destroy was requested without a started session.
    #[error("No active session")]
    NoActiveSession,

    /// Session map holds a NaN or infinite float, which JSON cannot store.
    #[error("Cannot store non-finite float at key: {key}")]
    NonFiniteFloat { key: String },

    /// Merge target holds a value that is not a mapping.
    #[error("Cannot merge into non-mapping value at key: {key}")]
    MergeTarget { key: String },
}

/// Result type for session store operations.
pub type Result<T> = std::result::Result<T, SessionError>;
