//! Clean-up applied to freshly collected market data

use analyst_core::{FinancialMetrics, KlineBar};

/// Order bars by time, keep the latest bar per timestamp and drop bars with
/// non-finite values; returns how many bars were removed
pub fn normalize_kline(bars: &mut Vec<KlineBar>) -> usize {
    let before = bars.len();
    bars.retain(|b| {
        [b.open, b.high, b.low, b.close, b.volume]
            .iter()
            .all(|v| v.is_finite())
    });
    bars.sort_by_key(|b| b.timestamp);
    // dedup keeps the first of a run, so flip to keep the last one written
    bars.reverse();
    bars.dedup_by_key(|b| b.timestamp);
    bars.reverse();
    before - bars.len()
}

/// Blank out non-finite ratios; metrics with nothing left become `None`
pub fn sanitize_financial(metrics: &mut Option<FinancialMetrics>) {
    let empty = match metrics.as_mut() {
        Some(m) => {
            for value in [
                &mut m.roe,
                &mut m.roa,
                &mut m.gross_margin,
                &mut m.net_margin,
                &mut m.revenue_growth,
                &mut m.profit_growth,
                &mut m.pe_ratio,
                &mut m.pb_ratio,
                &mut m.ps_ratio,
                &mut m.debt_to_equity,
                &mut m.current_ratio,
                &mut m.dividend_yield,
            ] {
                if value.is_some_and(|v| !v.is_finite()) {
                    *value = None;
                }
            }
            m.is_empty()
        }
        None => return,
    };
    if empty {
        *metrics = None;
    }
}
