//! Market-data collaborator seam

use crate::DataError;
use analyst_core::{MarketData, Market};
use async_trait::async_trait;

/// Source of quote, price history, financials and news for one symbol
///
/// Called once per job. Retries, if any, are the provider's own business.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn collect(&self, symbol: &str, market: Market) -> Result<MarketData, DataError>;

    /// Provider name recorded in [`MarketData::source`]
    fn name(&self) -> &str;
}
