//! Yahoo Finance market-data provider
//!
//! Provides one year of daily bars and a quote derived from the latest bar.
//! Yahoo carries no A-share financial statements or Chinese news, so those
//! parts are left empty.

use crate::DataError;
use crate::data::MarketDataProvider;
use analyst_core::{KlineBar, Market, MarketData, StockBasicInfo};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use time::OffsetDateTime;
use tracing::{debug, instrument};
use yahoo_finance_api as yahoo;

const HISTORY_DAYS: i64 = 365;

/// Map a local symbol onto Yahoo's ticker format
///
/// - A-shares: `6xxxxx` trade in Shanghai (`.SS`), `0xxxxx`/`3xxxxx` in Shenzhen (`.SZ`)
/// - Hong Kong: zero-padded to four digits plus `.HK`
/// - US: upper-cased
pub fn yahoo_symbol(symbol: &str, market: Market) -> Result<String, DataError> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(DataError::InvalidSymbol(symbol.to_string()));
    }
    let invalid = || DataError::InvalidSymbol(format!("{symbol} ({})", market.display_name()));

    match market {
        Market::A => {
            if symbol.len() != 6 || !symbol.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            match symbol.as_bytes()[0] {
                b'6' => Ok(format!("{symbol}.SS")),
                b'0' | b'3' => Ok(format!("{symbol}.SZ")),
                _ => Err(invalid()),
            }
        }
        Market::HK => {
            if !symbol.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            let trimmed = symbol.trim_start_matches('0');
            if trimmed.is_empty() || trimmed.len() > 5 {
                return Err(invalid());
            }
            Ok(format!("{trimmed:0>4}.HK"))
        }
        Market::US => {
            if !symbol
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
            {
                return Err(invalid());
            }
            Ok(symbol.to_ascii_uppercase())
        }
    }
}

fn upstream(e: impl std::fmt::Display) -> DataError {
    DataError::Provider(format!("Yahoo Finance error: {e}"))
}

/// [`MarketDataProvider`] backed by the Yahoo Finance chart API
pub struct YahooProvider {
    connector: yahoo::YahooConnector,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        Ok(Self {
            connector: yahoo::YahooConnector::new().map_err(upstream)?,
        })
    }

    async fn daily_bars(&self, ticker: &str) -> Result<Vec<KlineBar>, DataError> {
        let end = Utc::now();
        let start = end - ChronoDuration::days(HISTORY_DAYS);
        let start = OffsetDateTime::from_unix_timestamp(start.timestamp()).map_err(upstream)?;
        let end = OffsetDateTime::from_unix_timestamp(end.timestamp()).map_err(upstream)?;

        let response = self
            .connector
            .get_quote_history(ticker, start, end)
            .await
            .map_err(upstream)?;
        let quotes = response.quotes().map_err(upstream)?;

        Ok(quotes
            .iter()
            .map(|q| KlineBar {
                timestamp: i64::try_from(q.timestamp).unwrap_or_default(),
                open: q.open,
                high: q.high,
                low: q.low,
                close: q.close,
                volume: q.volume as f64,
            })
            .collect())
    }
}

/// Quote snapshot from the last two bars
pub(crate) fn quote_from_bars(symbol: &str, bars: &[KlineBar]) -> StockBasicInfo {
    let last = bars.last();
    let previous = bars.len().checked_sub(2).and_then(|i| bars.get(i));
    let change_percent = match (last, previous) {
        (Some(last), Some(prev)) if prev.close > 0.0 => {
            Some((last.close - prev.close) / prev.close * 100.0)
        }
        _ => None,
    };

    StockBasicInfo {
        symbol: symbol.to_string(),
        name: symbol.to_string(),
        price: last.map(|b| b.close),
        change_percent,
        volume: last.map(|b| b.volume),
        turnover: last.map(|b| b.volume * b.close),
        ..Default::default()
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    #[instrument(skip(self))]
    async fn collect(&self, symbol: &str, market: Market) -> Result<MarketData, DataError> {
        let ticker = yahoo_symbol(symbol, market)?;
        debug!("Fetching {} from Yahoo Finance", ticker);

        let kline = self.daily_bars(&ticker).await?;
        if kline.is_empty() {
            return Err(DataError::NotFound(symbol.to_string()));
        }

        Ok(MarketData {
            basic: quote_from_bars(symbol, &kline),
            kline,
            financial: None,
            news: Vec::new(),
            source: self.name().to_string(),
        })
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}
