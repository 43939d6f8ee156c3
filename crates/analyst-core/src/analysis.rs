//! Per-analyst results and the final report

use crate::{AnalystRole, Market, Recommendation, TechnicalIndicators};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Score substituted for a role whose result is missing or degraded
pub const FALLBACK_SCORE: f64 = 50.0;

/// Confidence carried by a degraded result
pub const FALLBACK_CONFIDENCE: f64 = 0.0;

/// Structured outcome of one analyst role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalystResult {
    pub role: AnalystRole,
    /// 0..=100
    pub score: f64,
    /// 0..=100
    pub confidence: f64,
    pub recommendation: Recommendation,
    pub key_factors: Vec<String>,
    pub risks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub opportunities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Unparsed model output, kept for auditing
    pub raw_text: String,
    /// Set when the role failed and this is a stand-in. Not exposed to clients.
    #[serde(skip)]
    pub degraded: bool,
}

impl AnalystResult {
    /// Stand-in for a role whose prompt, model call or parse failed
    pub fn degraded(role: AnalystRole, reason: impl AsRef<str>) -> Self {
        Self {
            role,
            score: FALLBACK_SCORE,
            confidence: FALLBACK_CONFIDENCE,
            recommendation: Recommendation::from_score(FALLBACK_SCORE),
            key_factors: Vec::new(),
            risks: vec![format!(
                "{}分析暂不可用: {}",
                role.display_name(),
                reason.as_ref()
            )],
            opportunities: Vec::new(),
            summary: None,
            raw_text: String::new(),
            degraded: true,
        }
    }
}

/// Token counters accumulated over every model call of a job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounters {
    pub input: usize,
    pub output: usize,
}

impl UsageCounters {
    pub fn add(&mut self, input: usize, output: usize) {
        self.input += input;
        self.output += output;
    }

    pub fn total(&self) -> usize {
        self.input + self.output
    }
}

/// Final result of one analysis job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub symbol: String,
    pub stock_name: String,
    pub market: Market,
    /// Weighted over the six independent roles, 0..=100
    pub overall_score: f64,
    pub recommendation: Recommendation,
    pub confidence: f64,
    pub key_factors: Vec<String>,
    pub risks: Vec<String>,
    pub opportunities: Vec<String>,
    pub summary: String,
    /// Independent roles in stage order
    pub role_analysis: Vec<AnalystResult>,
    /// Synthesizer output, if it ran
    pub synthesis: Option<AnalystResult>,
    /// Recommendation the synthesizer reported, kept for comparison
    pub synthesis_recommendation: Option<Recommendation>,
    pub technical: Option<TechnicalIndicators>,
    pub model: String,
    /// Wall-clock seconds
    pub processing_time: f64,
    pub token_usage: UsageCounters,
    /// USD, when the model has a known price
    pub estimated_cost: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl AnalysisReport {
    /// Result for a given independent role
    pub fn role(&self, role: AnalystRole) -> Option<&AnalystResult> {
        self.role_analysis.iter().find(|r| r.role == role)
    }
}
