//! Markets and the market-data models returned by data providers

use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Listing market of a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", rename_all = "UPPERCASE")]
pub enum Market {
    /// Shanghai / Shenzhen A-shares
    A,
    /// Hong Kong
    HK,
    /// United States
    US,
}

impl Market {
    /// Short code: `A`, `HK` or `US`
    pub fn code(self) -> &'static str {
        match self {
            Market::A => "A",
            Market::HK => "HK",
            Market::US => "US",
        }
    }

    /// Chinese display name
    pub fn display_name(self) -> &'static str {
        match self {
            Market::A => "A股",
            Market::HK => "港股",
            Market::US => "美股",
        }
    }

    /// Quote currency
    pub fn currency(self) -> &'static str {
        match self {
            Market::A => "CNY",
            Market::HK => "HKD",
            Market::US => "USD",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Market {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" | "CN" | "SH" | "SZ" => Ok(Market::A),
            "HK" => Ok(Market::HK),
            "US" => Ok(Market::US),
            _ => Err(CoreError::UnknownMarket(s.to_string())),
        }
    }
}

impl TryFrom<String> for Market {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Quote snapshot and company profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockBasicInfo {
    pub symbol: String,
    pub name: String,
    pub price: Option<f64>,
    pub change_percent: Option<f64>,
    pub volume: Option<f64>,
    pub turnover: Option<f64>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub industry: Option<String>,
    #[serde(default)]
    pub concepts: Vec<String>,
}

/// One daily OHLCV bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KlineBar {
    /// Unix seconds
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Financial statement ratios; every figure is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialMetrics {
    pub roe: Option<f64>,
    pub roa: Option<f64>,
    pub gross_margin: Option<f64>,
    pub net_margin: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub profit_growth: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub ps_ratio: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
}

impl FinancialMetrics {
    /// True when no figure is populated
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Headline sentiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// A news headline about the symbol
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub source: String,
    pub published_at: Option<String>,
    pub sentiment: Option<Sentiment>,
    pub sentiment_score: Option<f64>,
}

/// Everything one data-provider call returns for a symbol
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    pub basic: StockBasicInfo,
    #[serde(default)]
    pub kline: Vec<KlineBar>,
    pub financial: Option<FinancialMetrics>,
    #[serde(default)]
    pub news: Vec<NewsItem>,
    /// Name of the provider that produced the data
    #[serde(default)]
    pub source: String,
}

/// Direction implied by moving-average alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Bullish,
    Bearish,
    Sideways,
}

impl Trend {
    pub fn label_zh(self) -> &'static str {
        match self {
            Trend::Bullish => "多头排列",
            Trend::Bearish => "空头排列",
            Trend::Sideways => "震荡整理",
        }
    }
}

/// Indicators computed from the daily bars; absent when history is too short
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalIndicators {
    pub ma5: Option<f64>,
    pub ma10: Option<f64>,
    pub ma20: Option<f64>,
    pub ma60: Option<f64>,
    pub rsi14: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub boll_upper: Option<f64>,
    pub boll_middle: Option<f64>,
    pub boll_lower: Option<f64>,
    pub atr14: Option<f64>,
    pub obv: Option<f64>,
    pub trend: Option<Trend>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_market_case_insensitive() {
        assert_eq!("a".parse::<Market>(), Ok(Market::A));
        assert_eq!("hk".parse::<Market>(), Ok(Market::HK));
        assert_eq!(" Us ".parse::<Market>(), Ok(Market::US));
        assert!(matches!(
            "JP".parse::<Market>(),
            Err(CoreError::UnknownMarket(_))
        ));
    }

    #[test]
    fn test_market_serde() {
        assert_eq!(serde_json::to_string(&Market::HK).unwrap(), "\"HK\"");
        let market: Market = serde_json::from_str("\"us\"").unwrap();
        assert_eq!(market, Market::US);
        assert!(serde_json::from_str::<Market>("\"xx\"").is_err());
    }

    #[test]
    fn test_market_display_names() {
        assert_eq!(Market::A.display_name(), "A股");
        assert_eq!(Market::HK.currency(), "HKD");
        assert_eq!(Market::US.to_string(), "US");
    }

    #[test]
    fn test_empty_financials() {
        assert!(FinancialMetrics::default().is_empty());
        let metrics = FinancialMetrics {
            roe: Some(12.5),
            ..Default::default()
        };
        assert!(!metrics.is_empty());
    }

    #[test]
    fn test_market_data_camel_case() {
        let data = MarketData {
            basic: StockBasicInfo {
                symbol: "000001".to_string(),
                name: "平安银行".to_string(),
                change_percent: Some(1.2),
                ..Default::default()
            },
            ..Default::default()
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["basic"]["changePercent"], 1.2);
        assert_eq!(json["basic"]["name"], "平安银行");
    }
}
