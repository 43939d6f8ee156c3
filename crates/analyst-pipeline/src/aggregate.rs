//! Fold per-role results into the final report
//!
//! The overall score is a weighted sum over all six independent roles. A
//! missing role contributes [`FALLBACK_SCORE`], so the weights always sum to
//! one and the score stays inside `[0, 100]`. The synthesizer's own
//! recommendation is kept for reference but never overrides the arithmetic.

use crate::StockContext;
use crate::runner::RoleOutcome;
use analyst_core::{
    AnalysisReport, AnalystResult, AnalystRole, FALLBACK_CONFIDENCE, FALLBACK_SCORE,
    Recommendation, UsageCounters,
};
use analyst_llm::{TokenUsage, estimate_cost};
use chrono::Utc;
use std::collections::HashSet;
use std::time::Duration;

/// Cap on merged key factors, risks and opportunities
pub const MAX_REPORT_ITEMS: usize = 10;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn find(results: &[AnalystResult], role: AnalystRole) -> Option<&AnalystResult> {
    results.iter().find(|r| r.role == role)
}

/// Unrounded weighted sum; tiers are picked from this value
pub fn raw_weighted_score(results: &[AnalystResult]) -> f64 {
    let sum: f64 = AnalystRole::INDEPENDENT
        .iter()
        .map(|&role| {
            let score = find(results, role).map_or(FALLBACK_SCORE, |r| r.score.clamp(0.0, 100.0));
            role.weight() * score
        })
        .sum();
    sum.clamp(0.0, 100.0)
}

/// Weighted overall score, rounded to one decimal for display
pub fn weighted_score(results: &[AnalystResult]) -> f64 {
    round1(raw_weighted_score(results))
}

/// Weight-averaged confidence; degraded or missing roles count as zero
pub fn derive_confidence(results: &[AnalystResult]) -> f64 {
    let sum: f64 = AnalystRole::INDEPENDENT
        .iter()
        .map(|&role| {
            let confidence = find(results, role)
                .filter(|r| !r.degraded)
                .map_or(FALLBACK_CONFIDENCE, |r| r.confidence.clamp(0.0, 100.0));
            role.weight() * confidence
        })
        .sum();
    round1(sum)
}

/// Exact-match dedup preserving first occurrence, capped at `limit`
pub fn dedup<'a, I>(items: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| !item.trim().is_empty())
        .filter(|item| seen.insert(item.as_str()))
        .take(limit)
        .cloned()
        .collect()
}

fn fallback_summary(symbol: &str, score: f64, recommendation: Recommendation) -> String {
    format!(
        "基于对{symbol}的多维度AI分析，综合评分{score:.1}分。建议{}。",
        recommendation.label_zh()
    )
}

/// Inputs gathered by the orchestrator for one job
pub struct ReportInputs<'a> {
    pub context: &'a StockContext,
    /// Independent role outcomes, any order
    pub roles: &'a [RoleOutcome],
    pub synthesis: Option<&'a RoleOutcome>,
    /// Model name used when no role reports one
    pub default_model: &'a str,
    pub elapsed: Duration,
}

/// Build the final report
pub fn assemble_report(inputs: &ReportInputs<'_>) -> AnalysisReport {
    let ctx = inputs.context;

    // Stage order, with a stand-in for any role that never reported
    let role_analysis: Vec<AnalystResult> = AnalystRole::INDEPENDENT
        .iter()
        .map(|&role| {
            inputs
                .roles
                .iter()
                .find(|o| o.result.role == role)
                .map_or_else(
                    || AnalystResult::degraded(role, "结果缺失"),
                    |o| o.result.clone(),
                )
        })
        .collect();

    let raw_score = raw_weighted_score(&role_analysis);
    let recommendation = Recommendation::from_score(raw_score);
    let overall_score = round1(raw_score);
    let synthesis = inputs
        .synthesis
        .filter(|s| !s.is_degraded())
        .map(|s| s.result.clone());

    let mut usage = TokenUsage::default();
    for outcome in inputs.roles.iter().chain(inputs.synthesis) {
        usage += outcome.usage;
    }
    let model = inputs
        .roles
        .iter()
        .chain(inputs.synthesis)
        .find_map(|o| o.model.clone())
        .unwrap_or_else(|| inputs.default_model.to_string());

    let opportunities = synthesis
        .as_ref()
        .map(|s| dedup(&s.opportunities, MAX_REPORT_ITEMS))
        .unwrap_or_default();
    let summary = synthesis
        .as_ref()
        .and_then(|s| s.summary.clone())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| fallback_summary(&ctx.symbol, overall_score, recommendation));

    AnalysisReport {
        symbol: ctx.symbol.clone(),
        stock_name: ctx.stock_name().to_string(),
        market: ctx.market,
        overall_score,
        recommendation,
        confidence: derive_confidence(&role_analysis),
        key_factors: dedup(
            role_analysis.iter().flat_map(|r| &r.key_factors),
            MAX_REPORT_ITEMS,
        ),
        risks: dedup(role_analysis.iter().flat_map(|r| &r.risks), MAX_REPORT_ITEMS),
        opportunities,
        summary,
        synthesis_recommendation: synthesis.as_ref().map(|s| s.recommendation),
        synthesis,
        technical: ctx.technical.clone(),
        estimated_cost: estimate_cost(&model, &usage),
        model,
        processing_time: round1(inputs.elapsed.as_secs_f64()),
        token_usage: UsageCounters {
            input: usage.input_tokens,
            output: usage.output_tokens,
        },
        role_analysis,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_context;

    fn result(role: AnalystRole, score: f64) -> AnalystResult {
        AnalystResult {
            role,
            score,
            confidence: 80.0,
            recommendation: Recommendation::from_score(score),
            key_factors: vec![format!("{role}因素"), "共同因素".to_string()],
            risks: vec!["共同风险".to_string()],
            opportunities: vec![],
            summary: None,
            raw_text: String::new(),
            degraded: false,
        }
    }

    fn all(scores: [f64; 6]) -> Vec<AnalystResult> {
        AnalystRole::INDEPENDENT
            .into_iter()
            .zip(scores)
            .map(|(role, score)| result(role, score))
            .collect()
    }

    fn outcome(result: AnalystResult) -> RoleOutcome {
        RoleOutcome {
            result,
            usage: TokenUsage {
                input_tokens: 1000,
                output_tokens: 200,
            },
            model: Some("deepseek-chat".to_string()),
        }
    }

    #[test]
    fn test_weights_sum_to_one() {
        let total: f64 = AnalystRole::INDEPENDENT.iter().map(|r| r.weight()).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(AnalystRole::Synthesizer.weight(), 0.0);
    }

    #[test]
    fn test_weighted_score_example() {
        let score = weighted_score(&all([80.0, 70.0, 65.0, 78.0, 72.0, 75.0]));
        assert_eq!(score, 73.5);
        assert_eq!(Recommendation::from_score(score), Recommendation::Hold);
    }

    #[test]
    fn test_missing_role_uses_fallback() {
        let mut results = all([80.0, 70.0, 65.0, 78.0, 72.0, 75.0]);
        results.retain(|r| r.role != AnalystRole::Value);
        assert_eq!(weighted_score(&results), 66.0);
        assert!(weighted_score(&[]) - FALLBACK_SCORE < 1e-9);
    }

    #[test]
    fn test_tier_uses_unrounded_score() {
        let results = all([74.96; 6]);
        assert_eq!(weighted_score(&results), 75.0);
        assert!(raw_weighted_score(&results) < 75.0);

        let ctx = sample_context();
        let roles: Vec<RoleOutcome> = results.into_iter().map(outcome).collect();
        let report = assemble_report(&ReportInputs {
            context: &ctx,
            roles: &roles,
            synthesis: None,
            default_model: "deepseek-chat",
            elapsed: Duration::from_secs(1),
        });
        assert_eq!(report.overall_score, 75.0);
        assert_eq!(report.recommendation, Recommendation::Hold);
    }

    #[test]
    fn test_score_stays_in_range() {
        for corner in [0.0, 100.0] {
            let score = weighted_score(&all([corner; 6]));
            assert_eq!(score, corner);
        }
        let mut results = all([100.0; 6]);
        results[0].score = 250.0;
        assert_eq!(weighted_score(&results), 100.0);

        for step in 0..=20 {
            let s = f64::from(step) * 5.0;
            let score = weighted_score(&all([s, 100.0 - s, s / 2.0, 100.0, 0.0, s]));
            assert!((0.0..=100.0).contains(&score));
        }
    }

    #[test]
    fn test_recommendation_is_monotonic() {
        let mut previous = Recommendation::Sell;
        for tenth in 0..=1000 {
            let tier = Recommendation::from_score(f64::from(tenth) / 10.0);
            assert!(tier.rank() >= previous.rank(), "{tenth}");
            previous = tier;
        }
    }

    #[test]
    fn test_confidence_ignores_degraded_roles() {
        let mut results = all([70.0; 6]);
        assert_eq!(derive_confidence(&results), 80.0);
        results[0] = AnalystResult::degraded(AnalystRole::Value, "timeout");
        assert_eq!(derive_confidence(&results), 60.0);
    }

    #[test]
    fn test_dedup_is_exact_and_ordered() {
        let items: Vec<String> = ["A", "b", "A", "B", " ", "b"]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(dedup(&items, 10), vec!["A", "b", "B"]);
        assert_eq!(dedup(&items, 2), vec!["A", "b"]);
    }

    #[test]
    fn test_assemble_report() {
        let ctx = sample_context();
        let roles: Vec<RoleOutcome> = all([80.0, 70.0, 65.0, 78.0, 72.0, 75.0])
            .into_iter()
            .rev()
            .map(outcome)
            .collect();
        let mut synth = result(AnalystRole::Synthesizer, 90.0);
        synth.opportunities = vec!["估值修复".to_string(), "估值修复".to_string()];
        synth.summary = Some("稳健".to_string());
        let synth = outcome(synth);

        let report = assemble_report(&ReportInputs {
            context: &ctx,
            roles: &roles,
            synthesis: Some(&synth),
            default_model: "unused",
            elapsed: Duration::from_millis(12_345),
        });

        assert_eq!(report.overall_score, 73.5);
        assert_eq!(report.recommendation, Recommendation::Hold);
        assert_eq!(report.synthesis_recommendation, Some(Recommendation::StrongBuy));
        assert_eq!(report.stock_name, "平安银行");
        let order: Vec<AnalystRole> = report.role_analysis.iter().map(|r| r.role).collect();
        assert_eq!(order, AnalystRole::INDEPENDENT.to_vec());
        assert_eq!(report.key_factors.len(), 7);
        assert_eq!(report.key_factors[1], "共同因素");
        assert_eq!(report.risks, vec!["共同风险"]);
        assert_eq!(report.opportunities, vec!["估值修复"]);
        assert_eq!(report.summary, "稳健");
        assert_eq!(report.token_usage.input, 7000);
        assert_eq!(report.token_usage.output, 1400);
        assert_eq!(report.model, "deepseek-chat");
        assert!(report.estimated_cost.is_some());
        assert_eq!(report.processing_time, 12.3);
    }

    #[test]
    fn test_assemble_without_synthesis_uses_fallback_summary() {
        let ctx = sample_context();
        let roles: Vec<RoleOutcome> = all([60.0; 6]).into_iter().take(3).map(outcome).collect();
        let synth = RoleOutcome::degraded(AnalystRole::Synthesizer, "timeout");

        let report = assemble_report(&ReportInputs {
            context: &ctx,
            roles: &roles,
            synthesis: Some(&synth),
            default_model: "deepseek-chat",
            elapsed: Duration::from_secs(1),
        });

        // 0.6 of the weight at 60, the rest at the fallback 50
        assert_eq!(report.overall_score, 56.0);
        assert_eq!(report.recommendation, Recommendation::Wait);
        assert!(report.synthesis.is_none());
        assert_eq!(
            report.summary,
            "基于对000001的多维度AI分析，综合评分56.0分。建议观望。"
        );
        assert_eq!(report.role_analysis.len(), 6);
        assert!(report.role_analysis[5].degraded);
        assert!(report.risks.iter().any(|r| r.contains("结果缺失")));
    }
}
