//! Recommendation tiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical recommendation label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongBuy,
    Buy,
    #[default]
    Hold,
    Wait,
    Sell,
}

impl Recommendation {
    /// Lower bounds of each tier, highest first; anything below is `Sell`
    pub const THRESHOLDS: [(f64, Recommendation); 4] = [
        (85.0, Recommendation::StrongBuy),
        (75.0, Recommendation::Buy),
        (60.0, Recommendation::Hold),
        (50.0, Recommendation::Wait),
    ];

    /// Map an overall score onto a tier
    pub fn from_score(score: f64) -> Self {
        Self::THRESHOLDS
            .iter()
            .find(|(bound, _)| score >= *bound)
            .map_or(Recommendation::Sell, |(_, tier)| *tier)
    }

    /// Map a free-form label (Chinese or English) onto a tier
    ///
    /// Longer phrases are checked before their substrings, so
    /// `强烈买入` is never read as `买入`. Negated advice such as `不建议买入`
    /// or `do not buy` names no tier and gives `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        const NEGATIONS: [&str; 10] = [
            "不建议", "不推荐", "不宜", "不要", "暂不", "避免", "not ", "don't", "dont ", "avoid",
        ];

        const TABLE: [(&str, Recommendation); 17] = [
            ("强烈买入", Recommendation::StrongBuy),
            ("strong_buy", Recommendation::StrongBuy),
            ("strong buy", Recommendation::StrongBuy),
            ("strongbuy", Recommendation::StrongBuy),
            ("强烈卖出", Recommendation::Sell),
            ("卖出", Recommendation::Sell),
            ("减持", Recommendation::Sell),
            ("sell", Recommendation::Sell),
            ("买入", Recommendation::Buy),
            ("增持", Recommendation::Buy),
            ("buy", Recommendation::Buy),
            ("持有", Recommendation::Hold),
            ("hold", Recommendation::Hold),
            ("观望", Recommendation::Wait),
            ("中性", Recommendation::Wait),
            ("wait", Recommendation::Wait),
            ("neutral", Recommendation::Wait),
        ];

        let lowered = label.trim().to_lowercase();
        if lowered.is_empty() || NEGATIONS.iter().any(|n| lowered.contains(n)) {
            return None;
        }
        TABLE
            .iter()
            .find(|(needle, _)| lowered.contains(needle))
            .map(|(_, tier)| *tier)
    }

    /// Ordinal position, `Sell` lowest
    pub fn rank(self) -> u8 {
        match self {
            Recommendation::Sell => 0,
            Recommendation::Wait => 1,
            Recommendation::Hold => 2,
            Recommendation::Buy => 3,
            Recommendation::StrongBuy => 4,
        }
    }

    /// snake_case identifier
    pub fn as_str(self) -> &'static str {
        match self {
            Recommendation::StrongBuy => "strong_buy",
            Recommendation::Buy => "buy",
            Recommendation::Hold => "hold",
            Recommendation::Wait => "wait",
            Recommendation::Sell => "sell",
        }
    }

    /// Chinese label used in prompts and summaries
    pub fn label_zh(self) -> &'static str {
        match self {
            Recommendation::StrongBuy => "强烈买入",
            Recommendation::Buy => "买入",
            Recommendation::Hold => "持有",
            Recommendation::Wait => "观望",
            Recommendation::Sell => "卖出",
        }
    }

    /// English label used in prompts and summaries
    pub fn label_en(self) -> &'static str {
        match self {
            Recommendation::StrongBuy => "Strong Buy",
            Recommendation::Buy => "Buy",
            Recommendation::Hold => "Hold",
            Recommendation::Wait => "Wait",
            Recommendation::Sell => "Sell",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(Recommendation::from_score(100.0), Recommendation::StrongBuy);
        assert_eq!(Recommendation::from_score(85.0), Recommendation::StrongBuy);
        assert_eq!(Recommendation::from_score(84.9), Recommendation::Buy);
        assert_eq!(Recommendation::from_score(75.0), Recommendation::Buy);
        assert_eq!(Recommendation::from_score(74.99), Recommendation::Hold);
        assert_eq!(Recommendation::from_score(73.5), Recommendation::Hold);
        assert_eq!(Recommendation::from_score(60.0), Recommendation::Hold);
        assert_eq!(Recommendation::from_score(59.9), Recommendation::Wait);
        assert_eq!(Recommendation::from_score(50.0), Recommendation::Wait);
        assert_eq!(Recommendation::from_score(49.9), Recommendation::Sell);
        assert_eq!(Recommendation::from_score(0.0), Recommendation::Sell);
    }

    #[test]
    fn test_tier_is_monotonic_in_score() {
        let mut previous = Recommendation::from_score(0.0).rank();
        for step in 1..=10_000 {
            let score = f64::from(step) / 100.0;
            let rank = Recommendation::from_score(score).rank();
            assert!(rank >= previous, "tier dropped at {score}");
            previous = rank;
        }
    }

    #[test]
    fn test_from_label_chinese() {
        assert_eq!(
            Recommendation::from_label("强烈买入"),
            Some(Recommendation::StrongBuy)
        );
        assert_eq!(Recommendation::from_label("买入"), Some(Recommendation::Buy));
        assert_eq!(Recommendation::from_label(" 持有 "), Some(Recommendation::Hold));
        assert_eq!(Recommendation::from_label("观望"), Some(Recommendation::Wait));
        assert_eq!(Recommendation::from_label("卖出"), Some(Recommendation::Sell));
        assert_eq!(Recommendation::from_label("谨慎增持"), Some(Recommendation::Buy));
    }

    #[test]
    fn test_from_label_english() {
        assert_eq!(
            Recommendation::from_label("Strong Buy"),
            Some(Recommendation::StrongBuy)
        );
        assert_eq!(
            Recommendation::from_label("strong_buy"),
            Some(Recommendation::StrongBuy)
        );
        assert_eq!(Recommendation::from_label("HOLD"), Some(Recommendation::Hold));
        assert_eq!(Recommendation::from_label("Neutral"), Some(Recommendation::Wait));
        assert_eq!(Recommendation::from_label("sell"), Some(Recommendation::Sell));
    }

    #[test]
    fn test_from_label_negated() {
        assert_eq!(Recommendation::from_label("不建议买入"), None);
        assert_eq!(Recommendation::from_label("暂不增持"), None);
        assert_eq!(Recommendation::from_label("Do not buy"), None);
        assert_eq!(Recommendation::from_label("建议买入"), Some(Recommendation::Buy));
    }

    #[test]
    fn test_from_label_unknown() {
        assert_eq!(Recommendation::from_label(""), None);
        assert_eq!(Recommendation::from_label("看情况"), None);
    }

    #[test]
    fn test_default_is_hold() {
        assert_eq!(Recommendation::default(), Recommendation::Hold);
        assert_eq!(Recommendation::Hold.to_string(), "hold");
    }
}
