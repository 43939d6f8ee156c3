//! Where finished reports go besides the job store

use crate::Result;
use analyst_core::AnalysisReport;
use async_trait::async_trait;
use tracing::info;

/// Receives every completed report at the `save_result` stage
///
/// A failing sink never fails the job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn save(&self, report: &AnalysisReport) -> Result<()>;
}

/// Sink that only logs a one-line summary
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReportSink;

#[async_trait]
impl ReportSink for LogReportSink {
    async fn save(&self, report: &AnalysisReport) -> Result<()> {
        info!(
            "Report for {} ({}): {:.1} {} in {:.1}s, {} tokens",
            report.symbol,
            report.stock_name,
            report.overall_score,
            report.recommendation.as_str(),
            report.processing_time,
            report.token_usage.total()
        );
        Ok(())
    }
}
