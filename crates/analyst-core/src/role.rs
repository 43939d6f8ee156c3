//! Analyst roles and their fixed weight/temperature table

use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One analyst perspective
///
/// The six independent roles are weighted into the overall score. The
/// synthesizer reads their combined output and carries no weight of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalystRole {
    /// Margin of safety, intrinsic value, moat
    Value,
    /// Trend, momentum, support and resistance
    Technical,
    /// Revenue and earnings growth potential
    Growth,
    /// Profitability, balance sheet, cash flow
    Fundamental,
    /// Downside scenarios and volatility
    Risk,
    /// Policy, rates, sector cycle
    Macro,
    /// Reconciles the six independent opinions
    Synthesizer,
}

impl AnalystRole {
    /// The six roles fanned out concurrently, in stage order
    pub const INDEPENDENT: [AnalystRole; 6] = [
        AnalystRole::Value,
        AnalystRole::Technical,
        AnalystRole::Growth,
        AnalystRole::Fundamental,
        AnalystRole::Risk,
        AnalystRole::Macro,
    ];

    /// Every role including the synthesizer
    pub const ALL: [AnalystRole; 7] = [
        AnalystRole::Value,
        AnalystRole::Technical,
        AnalystRole::Growth,
        AnalystRole::Fundamental,
        AnalystRole::Risk,
        AnalystRole::Macro,
        AnalystRole::Synthesizer,
    ];

    /// Weight of this role in the overall score
    pub fn weight(self) -> f64 {
        match self {
            AnalystRole::Value => 0.25,
            AnalystRole::Technical => 0.15,
            AnalystRole::Growth => 0.20,
            AnalystRole::Fundamental => 0.15,
            AnalystRole::Risk => 0.15,
            AnalystRole::Macro => 0.10,
            AnalystRole::Synthesizer => 0.0,
        }
    }

    /// Sampling temperature for this role's model call
    ///
    /// Technical and risk stay low for repeatable output, growth runs hotter.
    pub fn temperature(self) -> f32 {
        match self {
            AnalystRole::Value => 0.5,
            AnalystRole::Technical => 0.3,
            AnalystRole::Growth => 0.6,
            AnalystRole::Fundamental => 0.5,
            AnalystRole::Risk => 0.4,
            AnalystRole::Macro => 0.5,
            AnalystRole::Synthesizer => 0.3,
        }
    }

    /// Stable identifier used in templates, JSON and URLs
    pub fn id(self) -> &'static str {
        match self {
            AnalystRole::Value => "value",
            AnalystRole::Technical => "technical",
            AnalystRole::Growth => "growth",
            AnalystRole::Fundamental => "fundamental",
            AnalystRole::Risk => "risk",
            AnalystRole::Macro => "macro",
            AnalystRole::Synthesizer => "synthesizer",
        }
    }

    /// Chinese display name
    pub fn display_name(self) -> &'static str {
        match self {
            AnalystRole::Value => "价值投资者",
            AnalystRole::Technical => "技术分析师",
            AnalystRole::Growth => "成长股分析师",
            AnalystRole::Fundamental => "基本面分析师",
            AnalystRole::Risk => "风险分析师",
            AnalystRole::Macro => "宏观分析师",
            AnalystRole::Synthesizer => "首席策略师",
        }
    }

    /// English display name
    pub fn english_name(self) -> &'static str {
        match self {
            AnalystRole::Value => "Value Investor",
            AnalystRole::Technical => "Technical Analyst",
            AnalystRole::Growth => "Growth Analyst",
            AnalystRole::Fundamental => "Fundamental Analyst",
            AnalystRole::Risk => "Risk Analyst",
            AnalystRole::Macro => "Macro Strategist",
            AnalystRole::Synthesizer => "Chief Strategist",
        }
    }

    /// Whether the role takes part in the fan-out
    pub fn is_independent(self) -> bool {
        !matches!(self, AnalystRole::Synthesizer)
    }
}

impl fmt::Display for AnalystRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for AnalystRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        AnalystRole::ALL
            .into_iter()
            .find(|role| role.id() == normalized)
            .ok_or_else(|| CoreError::UnknownRole(s.to_string()))
    }
}
