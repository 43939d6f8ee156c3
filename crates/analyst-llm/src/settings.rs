//! Model gateway settings read from the environment

use crate::{LLMError, PROVIDERS, ProviderSpec, Result, find_provider, is_viable_credential};
use analyst_utils::{EnvSource, EnvSourceExt, ProcessEnv};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

const DEFAULT_PROVIDER: &str = "deepseek";
const DEFAULT_TEMPERATURE: f32 = 0.5;
const DEFAULT_MAX_TOKENS: usize = 2000;
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Primary provider id
    pub provider: String,
    /// Model for the primary provider; fallbacks use their own defaults
    pub model: Option<String>,
    /// Temperature used when the caller gives none
    pub temperature: f32,
    pub max_tokens: usize,
    /// Per-call timeout
    pub timeout: Duration,
    /// Walk to the next provider on transient failures
    pub failover: bool,
    /// Explicit fallback order; `None` means the rest of the catalog
    pub fallback_providers: Option<Vec<String>>,
    /// Override of the primary provider's base URL
    pub api_base_override: Option<String>,
    /// Credentials keyed by provider id
    pub api_keys: HashMap<String, String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            model: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            failover: true,
            fallback_providers: None,
            api_base_override: None,
            api_keys: HashMap::new(),
        }
    }
}

/// Credential status of one provider, as reported by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub id: &'static str,
    pub name: &'static str,
    pub default_model: &'static str,
    pub models: Vec<&'static str>,
    pub available: bool,
    pub primary: bool,
}

impl LlmSettings {
    /// Read settings from the process environment
    pub fn from_env() -> Self {
        Self::from_source(&ProcessEnv)
    }

    /// Read settings from any [`EnvSource`]
    pub fn from_source<S: EnvSource + ?Sized>(env: &S) -> Self {
        let api_keys = PROVIDERS
            .iter()
            .filter_map(|p| env.string(p.env_key).map(|key| (p.id.to_string(), key)))
            .collect();

        Self {
            provider: env.string_or("LLM_PROVIDER", DEFAULT_PROVIDER).to_lowercase(),
            model: env.string("LLM_MODEL"),
            temperature: env.parse_or("LLM_TEMPERATURE", DEFAULT_TEMPERATURE),
            max_tokens: env.parse_or("LLM_MAX_TOKENS", DEFAULT_MAX_TOKENS),
            timeout: Duration::from_secs(env.parse_or("LLM_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)),
            failover: env.flag_or("LLM_FAILOVER", true),
            fallback_providers: env.list("LLM_FALLBACK_PROVIDERS"),
            api_base_override: env.string("LLM_API_BASE"),
            api_keys,
        }
    }

    /// Credential configured for a provider, viable or not
    pub fn api_key(&self, provider_id: &str) -> Option<&str> {
        self.api_keys.get(provider_id).map(String::as_str)
    }

    /// Whether a provider has a viable credential
    pub fn has_credential(&self, provider_id: &str) -> bool {
        is_viable_credential(self.api_key(provider_id))
    }

    /// Providers to try, primary first, without duplicates or unknown ids
    ///
    /// With failover disabled only the primary is returned.
    pub fn candidate_order(&self) -> Vec<&'static ProviderSpec> {
        let mut order: Vec<&'static ProviderSpec> = Vec::new();
        let mut push = |spec: &'static ProviderSpec| {
            if !order.iter().any(|s| s.id == spec.id) {
                order.push(spec);
            }
        };

        if let Some(primary) = find_provider(&self.provider) {
            push(primary);
        }
        if !self.failover {
            return order;
        }

        match &self.fallback_providers {
            Some(ids) => ids
                .iter()
                .filter_map(|id| {
                    let spec = find_provider(id);
                    if spec.is_none() {
                        tracing::warn!("Ignoring unknown fallback provider '{}'", id);
                    }
                    spec
                })
                .for_each(&mut push),
            None => PROVIDERS.iter().for_each(&mut push),
        }
        order
    }

    /// Model to request from a provider
    pub fn model_for(&self, spec: &ProviderSpec) -> String {
        match &self.model {
            Some(model) if spec.id == self.provider => model.clone(),
            _ => spec.default_model.to_string(),
        }
    }

    /// Base URL to use for a provider
    pub fn api_base_for(&self, spec: &ProviderSpec) -> String {
        match &self.api_base_override {
            Some(base) if spec.id == self.provider => base.clone(),
            _ => spec.api_base.to_string(),
        }
    }

    /// Status of every catalog provider
    pub fn available_providers(&self) -> Vec<ProviderStatus> {
        PROVIDERS
            .iter()
            .map(|p| ProviderStatus {
                id: p.id,
                name: p.display_name,
                default_model: p.default_model,
                models: p.models.to_vec(),
                available: self.has_credential(p.id),
                primary: p.id == self.provider,
            })
            .collect()
    }

    /// Reject settings that can never produce a working gateway
    pub fn validate(&self) -> Result<()> {
        if find_provider(&self.provider).is_none() {
            return Err(LLMError::ConfigurationError(format!(
                "Unknown LLM_PROVIDER '{}'",
                self.provider
            )));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(LLMError::ConfigurationError(format!(
                "LLM_TEMPERATURE must be within 0..=2, got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(LLMError::ConfigurationError(
                "LLM_MAX_TOKENS must be positive".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(LLMError::ConfigurationError(
                "LLM_TIMEOUT_SECS must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(order: &[&ProviderSpec]) -> Vec<&'static str> {
        order.iter().map(|s| s.id).collect()
    }

    #[test]
    fn test_defaults_from_empty_env() {
        let settings = LlmSettings::from_source(&HashMap::<String, String>::new());
        assert_eq!(settings.provider, "deepseek");
        assert_eq!(settings.max_tokens, 2000);
        assert_eq!(settings.timeout, Duration::from_secs(120));
        assert!(settings.failover);
        assert!(settings.api_keys.is_empty());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_reads_environment() {
        let env = [
            ("LLM_PROVIDER", "Qwen"),
            ("LLM_MODEL", "qwen-plus"),
            ("LLM_TEMPERATURE", "0.2"),
            ("LLM_TIMEOUT_SECS", "30"),
            ("LLM_FAILOVER", "off"),
            ("QWEN_API_KEY", " sk-live-123 "),
        ];
        let settings = LlmSettings::from_source(&env);

        assert_eq!(settings.provider, "qwen");
        assert_eq!(settings.model.as_deref(), Some("qwen-plus"));
        assert!((settings.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert!(!settings.failover);
        assert_eq!(settings.api_key("qwen"), Some("sk-live-123"));
    }

    #[test]
    fn test_default_candidate_order() {
        let settings = LlmSettings {
            provider: "zhipu".to_string(),
            ..Default::default()
        };
        assert_eq!(
            ids(&settings.candidate_order()),
            vec!["zhipu", "deepseek", "minimax", "qwen"]
        );
    }

    #[test]
    fn test_explicit_fallbacks_skip_unknown_and_duplicates() {
        let env = [
            ("LLM_PROVIDER", "deepseek"),
            ("LLM_FALLBACK_PROVIDERS", "qwen, openai, deepseek, qwen"),
        ];
        let settings = LlmSettings::from_source(&env);
        assert_eq!(ids(&settings.candidate_order()), vec!["deepseek", "qwen"]);
    }

    #[test]
    fn test_failover_disabled_keeps_primary_only() {
        let settings = LlmSettings {
            failover: false,
            ..Default::default()
        };
        assert_eq!(ids(&settings.candidate_order()), vec!["deepseek"]);
    }

    #[test]
    fn test_model_and_base_apply_to_primary_only() {
        let settings = LlmSettings {
            model: Some("deepseek-reasoner".to_string()),
            api_base_override: Some("http://localhost:9000/v1".to_string()),
            ..Default::default()
        };
        let deepseek = find_provider("deepseek").unwrap();
        let qwen = find_provider("qwen").unwrap();

        assert_eq!(settings.model_for(deepseek), "deepseek-reasoner");
        assert_eq!(settings.model_for(qwen), "qwen-max");
        assert_eq!(settings.api_base_for(deepseek), "http://localhost:9000/v1");
        assert_eq!(settings.api_base_for(qwen), qwen.api_base);
    }

    #[test]
    fn test_available_providers() {
        let env = [
            ("DEEPSEEK_API_KEY", "sk-your_deepseek_api_key_here"),
            ("MINIMAX_API_KEY", "mm-real-key"),
        ];
        let settings = LlmSettings::from_source(&env);
        let status = settings.available_providers();

        assert_eq!(status.len(), PROVIDERS.len());
        let deepseek = status.iter().find(|s| s.id == "deepseek").unwrap();
        assert!(deepseek.primary);
        assert!(!deepseek.available);
        assert!(status.iter().find(|s| s.id == "minimax").unwrap().available);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let unknown = LlmSettings {
            provider: "openai".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            unknown.validate(),
            Err(LLMError::ConfigurationError(_))
        ));

        let hot = LlmSettings {
            temperature: 3.5,
            ..Default::default()
        };
        assert!(hot.validate().is_err());

        let instant = LlmSettings {
            timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(instant.validate().is_err());
    }
}
