//! Model pricing table (USD per million tokens) and tier-based model choice

use crate::TokenUsage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Price of one model
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

/// A priced model
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub id: &'static str,
    pub display_name: &'static str,
    pub provider: &'static str,
    pub pricing: ModelPricing,
    pub context_window: u32,
}

const fn model(
    id: &'static str,
    display_name: &'static str,
    provider: &'static str,
    input: f64,
    output: f64,
    context_window: u32,
) -> ModelInfo {
    ModelInfo {
        id,
        display_name,
        provider,
        pricing: ModelPricing {
            input_per_million: input,
            output_per_million: output,
        },
        context_window,
    }
}

pub const MODELS: [ModelInfo; 6] = [
    model("deepseek-v3", "DeepSeek V3", "deepseek", 0.28, 0.42, 128_000),
    model("deepseek-v3-reasoner", "DeepSeek V3 Reasoner", "deepseek", 0.55, 2.19, 128_000),
    model("gpt-4o", "GPT-4o", "openai", 5.00, 20.00, 128_000),
    model("gpt-4o-mini", "GPT-4o Mini", "openai", 0.60, 2.40, 128_000),
    model("claude-3-5-sonnet", "Claude 3.5 Sonnet", "anthropic", 3.00, 15.00, 200_000),
    model("claude-3-5-haiku", "Claude 3.5 Haiku", "anthropic", 0.80, 4.00, 200_000),
];

/// API model names that bill as a priced model
const ALIASES: [(&str, &str); 2] = [
    ("deepseek-chat", "deepseek-v3"),
    ("deepseek-reasoner", "deepseek-v3-reasoner"),
];

/// Catalog entry for a model name, resolving aliases and a `provider/` prefix
pub fn model_info(model: &str) -> Option<&'static ModelInfo> {
    let model = model.rsplit('/').next().unwrap_or(model).trim();
    let canonical = ALIASES
        .iter()
        .find(|(alias, _)| *alias == model)
        .map_or(model, |(_, target)| *target);

    MODELS.iter().find(|m| m.id == canonical)
}

/// Price for a model name
pub fn pricing_for(model: &str) -> Option<ModelPricing> {
    model_info(model).map(|m| m.pricing)
}

/// Estimated cost in USD, `None` for unpriced models
pub fn estimate_cost(model: &str, usage: &TokenUsage) -> Option<f64> {
    pricing_for(model).map(|price| {
        (usage.input_tokens as f64 * price.input_per_million
            + usage.output_tokens as f64 * price.output_per_million)
            / 1_000_000.0
    })
}

/// Subscription level that bounds which models may be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Basic,
    Pro,
    Enterprise,
}

impl SubscriptionTier {
    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Basic => "basic",
            SubscriptionTier::Pro => "pro",
            SubscriptionTier::Enterprise => "enterprise",
        }
    }

    /// Model ids the tier may use, cheapest first
    pub fn models(self) -> &'static [&'static str] {
        match self {
            SubscriptionTier::Free => &["deepseek-v3"],
            SubscriptionTier::Basic => &["deepseek-v3", "deepseek-v3-reasoner"],
            SubscriptionTier::Pro => &["deepseek-v3", "deepseek-v3-reasoner", "gpt-4o-mini"],
            SubscriptionTier::Enterprise => &[
                "deepseek-v3",
                "deepseek-v3-reasoner",
                "gpt-4o",
                "gpt-4o-mini",
                "claude-3-5-sonnet",
                "claude-3-5-haiku",
            ],
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            SubscriptionTier::Free | SubscriptionTier::Basic => "deepseek-v3",
            SubscriptionTier::Pro | SubscriptionTier::Enterprise => "deepseek-v3-reasoner",
        }
    }

    pub fn allows(self, model: &str) -> bool {
        model_info(model).is_some_and(|m| self.models().contains(&m.id))
    }

    /// Catalog entries for [`Self::models`]
    pub fn available(self) -> Vec<&'static ModelInfo> {
        self.models().iter().filter_map(|id| model_info(id)).collect()
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(SubscriptionTier::Free),
            "basic" => Ok(SubscriptionTier::Basic),
            "pro" => Ok(SubscriptionTier::Pro),
            "enterprise" => Ok(SubscriptionTier::Enterprise),
            other => Err(format!("unknown subscription tier '{other}'")),
        }
    }
}

/// Preferred model for an analyst role id (`value`, `risk`, ...)
fn recommended_for(role: &str) -> &'static str {
    match role {
        "technical" => "deepseek-v3",
        "risk" => "claude-3-5-sonnet",
        _ => "deepseek-v3-reasoner",
    }
}

/// Best model a tier may use for one analyst role
///
/// A permitted user preference wins, then the role's recommended model,
/// then the tier's cheapest model.
pub fn optimal_model(role: &str, tier: SubscriptionTier, preference: Option<&str>) -> &'static str {
    if let Some(preferred) = preference.and_then(model_info) {
        if tier.allows(preferred.id) {
            return preferred.id;
        }
    }
    let recommended = recommended_for(role);
    if tier.allows(recommended) {
        return recommended;
    }
    tier.models().first().copied().unwrap_or("deepseek-v3")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_resolution() {
        assert_eq!(pricing_for("deepseek-chat"), pricing_for("deepseek-v3"));
        assert_eq!(pricing_for("deepseek/deepseek-chat"), pricing_for("deepseek-v3"));
        assert!(pricing_for("glm-4").is_none());
        assert_eq!(model_info("deepseek-reasoner").unwrap().display_name, "DeepSeek V3 Reasoner");
    }

    #[test]
    fn test_estimate_cost() {
        let usage = TokenUsage {
            input_tokens: 1_000_000,
            output_tokens: 500_000,
        };
        let cost = estimate_cost("gpt-4o-mini", &usage).unwrap();
        assert!((cost - 1.8).abs() < 1e-9);
        assert!(estimate_cost("unknown-model", &usage).is_none());
    }

    #[test]
    fn test_tier_access() {
        assert!(SubscriptionTier::Free.allows("deepseek-chat"));
        assert!(!SubscriptionTier::Free.allows("gpt-4o"));
        assert!(SubscriptionTier::Pro.allows("gpt-4o-mini"));
        assert!(!SubscriptionTier::Pro.allows("claude-3-5-sonnet"));
        assert_eq!(SubscriptionTier::Enterprise.available().len(), MODELS.len());
        assert_eq!(SubscriptionTier::Basic.default_model(), "deepseek-v3");
        assert_eq!("PRO".parse::<SubscriptionTier>().unwrap(), SubscriptionTier::Pro);
        assert!("gold".parse::<SubscriptionTier>().is_err());
    }

    #[test]
    fn test_optimal_model() {
        use SubscriptionTier::{Basic, Enterprise, Free, Pro};

        assert_eq!(optimal_model("risk", Enterprise, None), "claude-3-5-sonnet");
        // Recommended model out of reach: cheapest permitted model
        assert_eq!(optimal_model("risk", Pro, None), "deepseek-v3");
        assert_eq!(optimal_model("value", Basic, None), "deepseek-v3-reasoner");
        assert_eq!(optimal_model("value", Free, None), "deepseek-v3");
        assert_eq!(optimal_model("technical", Pro, Some("gpt-4o-mini")), "gpt-4o-mini");
        // Preference outside the tier is ignored
        assert_eq!(optimal_model("technical", Free, Some("gpt-4o")), "deepseek-v3");
        assert_eq!(optimal_model("macro", Enterprise, Some("deepseek-chat")), "deepseek-v3");
    }
}
