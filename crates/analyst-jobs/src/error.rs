//! Error types for job storage

use thiserror::Error;

/// Result type for job store operations
pub type Result<T> = std::result::Result<T, JobStoreError>;

/// Errors raised by a job store backend
#[derive(Error, Debug)]
pub enum JobStoreError {
    /// Redis command or connection failure
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Report payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored record is missing fields or holds unknown values
    #[error("Invalid job record '{id}': {detail}")]
    InvalidRecord { id: String, detail: String },

    /// Backend could not be reached in time
    #[error("Job store unavailable: {0}")]
    Unavailable(String),
}
