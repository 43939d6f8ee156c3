//! Error types for analyst-core

use thiserror::Error;

/// Result type alias for analyst-core
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised when parsing domain identifiers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Role identifier outside the closed role set
    #[error("Unknown analyst role: {0}")]
    UnknownRole(String),

    /// Market identifier other than A, HK or US
    #[error("Unknown market: {0}")]
    UnknownMarket(String),

    /// Stage identifier outside the stage enumeration
    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    /// Job status outside pending/running/completed/failed
    #[error("Unknown job status: {0}")]
    UnknownStatus(String),
}
