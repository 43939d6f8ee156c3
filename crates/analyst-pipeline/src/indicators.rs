//! Technical indicators over daily bars
//!
//! Every indicator needs a minimum amount of history. With less, the value is
//! left `None` rather than reporting a warm-up artefact.

use analyst_core::{KlineBar, TechnicalIndicators, Trend};
use ta::indicators::{
    AverageTrueRange, BollingerBands, MovingAverageConvergenceDivergence, OnBalanceVolume,
    RelativeStrengthIndex, SimpleMovingAverage,
};
use ta::{Close, High, Low, Next, Open, Volume};

const RSI_PERIOD: usize = 14;
const ATR_PERIOD: usize = 14;
const BOLL_PERIOD: usize = 20;
const BOLL_WIDTH: f64 = 2.0;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;

/// Borrowed bar in the shape `ta` expects
struct Bar<'a>(&'a KlineBar);

impl Open for Bar<'_> {
    fn open(&self) -> f64 {
        self.0.open
    }
}

impl High for Bar<'_> {
    fn high(&self) -> f64 {
        self.0.high
    }
}

impl Low for Bar<'_> {
    fn low(&self) -> f64 {
        self.0.low
    }
}

impl Close for Bar<'_> {
    fn close(&self) -> f64 {
        self.0.close
    }
}

impl Volume for Bar<'_> {
    fn volume(&self) -> f64 {
        self.0.volume
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn sma(closes: &[f64], period: usize) -> Option<f64> {
    if closes.len() < period {
        return None;
    }
    let mut indicator = SimpleMovingAverage::new(period).ok()?;
    closes.iter().map(|&c| indicator.next(c)).last().map(round2)
}

fn rsi(closes: &[f64]) -> Option<f64> {
    if closes.len() <= RSI_PERIOD {
        return None;
    }
    let mut indicator = RelativeStrengthIndex::new(RSI_PERIOD).ok()?;
    closes.iter().map(|&c| indicator.next(c)).last().map(round2)
}

fn macd(closes: &[f64]) -> Option<(f64, f64, f64)> {
    if closes.len() < MACD_SLOW + MACD_SIGNAL {
        return None;
    }
    let mut indicator =
        MovingAverageConvergenceDivergence::new(MACD_FAST, MACD_SLOW, MACD_SIGNAL).ok()?;
    closes
        .iter()
        .map(|&c| indicator.next(c))
        .last()
        .map(|out| (round2(out.macd), round2(out.signal), round2(out.histogram)))
}

fn bollinger(closes: &[f64]) -> Option<(f64, f64, f64)> {
    if closes.len() < BOLL_PERIOD {
        return None;
    }
    let mut indicator = BollingerBands::new(BOLL_PERIOD, BOLL_WIDTH).ok()?;
    closes
        .iter()
        .map(|&c| indicator.next(c))
        .last()
        .map(|out| (round2(out.upper), round2(out.average), round2(out.lower)))
}

fn atr(bars: &[KlineBar]) -> Option<f64> {
    if bars.len() <= ATR_PERIOD {
        return None;
    }
    let mut indicator = AverageTrueRange::new(ATR_PERIOD).ok()?;
    bars.iter().map(|b| indicator.next(&Bar(b))).last().map(round2)
}

fn obv(bars: &[KlineBar]) -> Option<f64> {
    let mut indicator = OnBalanceVolume::new();
    bars.iter().map(|b| indicator.next(&Bar(b))).last()
}

/// Moving-average alignment: 5 > 10 > 20 is bullish, 5 < 10 < 20 bearish
pub fn trend(ma5: Option<f64>, ma10: Option<f64>, ma20: Option<f64>) -> Option<Trend> {
    let (ma5, ma10, ma20) = (ma5?, ma10?, ma20?);
    Some(if ma5 > ma10 && ma10 > ma20 {
        Trend::Bullish
    } else if ma5 < ma10 && ma10 < ma20 {
        Trend::Bearish
    } else {
        Trend::Sideways
    })
}

/// Compute every indicator; `None` when there are no bars at all
pub fn compute(bars: &[KlineBar]) -> Option<TechnicalIndicators> {
    if bars.is_empty() {
        return None;
    }
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let ma5 = sma(&closes, 5);
    let ma10 = sma(&closes, 10);
    let ma20 = sma(&closes, 20);
    let macd = macd(&closes);
    let boll = bollinger(&closes);

    Some(TechnicalIndicators {
        ma5,
        ma10,
        ma20,
        ma60: sma(&closes, 60),
        rsi14: rsi(&closes),
        macd: macd.map(|m| m.0),
        macd_signal: macd.map(|m| m.1),
        macd_histogram: macd.map(|m| m.2),
        boll_upper: boll.map(|b| b.0),
        boll_middle: boll.map(|b| b.1),
        boll_lower: boll.map(|b| b.2),
        atr14: atr(bars),
        obv: obv(bars),
        trend: trend(ma5, ma10, ma20),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(closes: impl IntoIterator<Item = f64>) -> Vec<KlineBar> {
        closes
            .into_iter()
            .enumerate()
            .map(|(i, close)| KlineBar {
                timestamp: i as i64 * 86_400,
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 10_000.0,
            })
            .collect()
    }

    #[test]
    fn test_empty_history() {
        assert!(compute(&[]).is_none());
    }

    #[test]
    fn test_short_history_leaves_values_absent() {
        let result = compute(&bars([10.0, 10.5, 11.0])).unwrap();
        assert!(result.ma5.is_none());
        assert!(result.rsi14.is_none());
        assert!(result.macd.is_none());
        assert!(result.boll_middle.is_none());
        assert!(result.atr14.is_none());
        assert!(result.trend.is_none());
        assert!(result.obv.is_some());
    }

    #[test]
    fn test_rising_prices_are_bullish() {
        let result = compute(&bars((0..80).map(|i| 10.0 + f64::from(i) * 0.5))).unwrap();

        assert_eq!(result.trend, Some(Trend::Bullish));
        let (ma5, ma20, ma60) = (result.ma5.unwrap(), result.ma20.unwrap(), result.ma60.unwrap());
        assert!(ma5 > ma20 && ma20 > ma60);
        assert!(result.rsi14.unwrap() > 70.0);
        assert!(result.macd.unwrap() > 0.0);
        let (upper, middle, lower) = (
            result.boll_upper.unwrap(),
            result.boll_middle.unwrap(),
            result.boll_lower.unwrap(),
        );
        assert!(upper > middle && middle > lower);
        assert!(result.atr14.unwrap() > 0.0);
    }

    #[test]
    fn test_falling_prices_are_bearish() {
        let result = compute(&bars((0..30).map(|i| 50.0 - f64::from(i)))).unwrap();
        assert_eq!(result.trend, Some(Trend::Bearish));
        assert!(result.rsi14.unwrap() < 30.0);
    }

    #[test]
    fn test_sma_value() {
        let closes = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_eq!(sma(&closes, 5), Some(4.0));
        assert_eq!(sma(&closes[..4], 5), None);
    }

    #[test]
    fn test_trend_mixed_alignment() {
        assert_eq!(trend(Some(10.0), Some(12.0), Some(11.0)), Some(Trend::Sideways));
        assert_eq!(trend(Some(10.0), None, Some(11.0)), None);
    }
}
