//! Core domain types for the stock analyst pipeline
//!
//! Everything shared between the model gateway, the prompt catalog, the job
//! store and the orchestrator lives here:
//!
//! - [`AnalystRole`] with its fixed weight and temperature table
//! - [`Recommendation`] tiers and score thresholds
//! - [`AnalystResult`] and the final [`AnalysisReport`]
//! - the [`Job`] record with its [`JobStatus`] and ordered [`Stage`]s
//! - [`Market`] and the market-data models handed over by data providers

pub mod analysis;
pub mod error;
pub mod job;
pub mod market;
pub mod recommendation;
pub mod role;

pub use analysis::{
    AnalysisReport, AnalystResult, FALLBACK_CONFIDENCE, FALLBACK_SCORE, UsageCounters,
};
pub use error::{CoreError, Result};
pub use job::{Job, JobStatus, JobUpdate, Stage};
pub use market::{
    FinancialMetrics, KlineBar, Market, MarketData, NewsItem, Sentiment, StockBasicInfo,
    TechnicalIndicators, Trend,
};
pub use recommendation::Recommendation;
pub use role::AnalystRole;
