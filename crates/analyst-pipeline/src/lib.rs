//! Multi-analyst stock analysis pipeline
//!
//! Collects market data for a symbol, computes technical indicators, runs six
//! independent analyst roles concurrently against the model gateway, has a
//! chief strategist synthesize their views and folds everything into a
//! weighted [`AnalysisReport`](analyst_core::AnalysisReport).
//!
//! # Example
//!
//! ```rust,no_run
//! use analyst_core::Market;
//! use analyst_jobs::MemoryJobStore;
//! use analyst_llm::{LlmSettings, ModelGateway};
//! use analyst_pipeline::{AnalystTaskRunner, Orchestrator, PipelineConfig, YahooProvider};
//! use analyst_prompt::PromptCatalog;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::from_env()?;
//! let gateway = Arc::new(ModelGateway::from_settings(&LlmSettings::from_env())?);
//! let catalog = Arc::new(PromptCatalog::new(config.language)?);
//! let orchestrator = Orchestrator::new(
//!     Arc::new(MemoryJobStore::default()),
//!     Arc::new(YahooProvider::new()?),
//!     Arc::new(AnalystTaskRunner::new(gateway, catalog)),
//!     config,
//! );
//!
//! let job_id = orchestrator.submit("600519", Market::A).await?;
//! println!("submitted {job_id}");
//! # Ok(())
//! # }
//! ```

mod aggregate;
mod config;
pub mod context;
pub mod data;
mod error;
pub mod indicators;
mod orchestrator;
mod runner;
mod sink;
#[cfg(test)]
mod testing;

pub use aggregate::{
    MAX_REPORT_ITEMS, ReportInputs, assemble_report, dedup, derive_confidence, raw_weighted_score,
    weighted_score,
};
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use context::StockContext;
pub use data::{CacheKey, MarketDataCache, MarketDataProvider, YahooProvider, yahoo_symbol};
pub use error::{DataError, PipelineError, Result};
pub use orchestrator::Orchestrator;
pub use runner::{AnalystTaskRunner, RoleOutcome};
pub use sink::{LogReportSink, ReportSink};
