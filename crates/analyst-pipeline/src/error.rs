//! Error types for the analysis pipeline

use analyst_core::AnalystRole;
use std::time::Duration;
use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failures reported by a market-data provider
///
/// The message is shown to the client verbatim when collection fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DataError {
    /// Symbol cannot be mapped for the market
    #[error("无效的股票代码: {0}")]
    InvalidSymbol(String),

    /// Provider returned no data for the symbol
    #[error("未找到 {0} 的行情数据")]
    NotFound(String),

    /// Collection exceeded its time budget
    #[error("数据采集超时 ({}秒)", .0.as_secs())]
    Timeout(Duration),

    /// Upstream error, message passed through
    #[error("{0}")]
    Provider(String),
}

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Data collection failed; fatal for the job
    #[error("{0}")]
    Data(#[from] DataError),

    /// Job store error
    #[error("Job store error: {0}")]
    Store(#[from] analyst_jobs::JobStoreError),

    /// Prompt rendering error
    #[error("Prompt error: {0}")]
    Prompt(#[from] analyst_prompt::PromptError),

    /// Permanent model failure
    #[error("Model error: {0}")]
    Model(#[from] analyst_llm::LLMError),

    /// The gateway answered with a sentinel instead of model output
    #[error("{0}")]
    ModelUnavailable(String),

    /// No prompt exists for the role
    #[error("No prompt available for role '{0}'")]
    EmptyPrompt(AnalystRole),

    /// The job's task panicked
    #[error("{0}")]
    Aborted(String),

    /// Report sink rejected the report
    #[error("Report sink error: {0}")]
    Sink(String),

    /// Invalid pipeline configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
