//! Ordered failover across model providers
//!
//! [`ModelGateway`] owns an ordered list of candidates. A call starts at the
//! candidate that last succeeded and walks the rest of the list in order on
//! transient errors. Permanent errors stop the walk immediately. When every
//! candidate fails transiently the gateway returns a fixed sentinel text
//! instead of an error, so a single analyst never aborts the whole job.

use crate::providers::{OpenAIConfig, OpenAIProvider};
use crate::{
    CompletionRequest, LLMError, LLMProvider, LlmSettings, Message, Result, StopReason, TokenUsage,
    is_viable_credential,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Returned when a call carries no messages
pub const EMPTY_MESSAGES_SENTINEL: &str = "无法生成分析：缺少输入消息";

/// Returned when every candidate failed with a transient error
pub const ALL_PROVIDERS_FAILED_SENTINEL: &str = "无法生成分析：所有模型服务均不可用";

/// One provider/model pair the gateway may call
#[derive(Clone)]
pub struct GatewayCandidate {
    pub id: String,
    pub model: String,
    pub provider: Arc<dyn LLMProvider>,
}

impl GatewayCandidate {
    pub fn new(id: impl Into<String>, model: impl Into<String>, provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            provider,
        }
    }
}

impl std::fmt::Debug for GatewayCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayCandidate")
            .field("id", &self.id)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

/// Call behaviour shared by every candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatewayOptions {
    pub failover: bool,
    pub max_tokens: usize,
    pub default_temperature: f32,
    pub call_timeout: Duration,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            failover: true,
            max_tokens: 2000,
            default_temperature: 0.5,
            call_timeout: Duration::from_secs(120),
        }
    }
}

impl From<&LlmSettings> for GatewayOptions {
    fn from(settings: &LlmSettings) -> Self {
        Self {
            failover: settings.failover,
            max_tokens: settings.max_tokens,
            default_temperature: settings.temperature,
            call_timeout: settings.timeout,
        }
    }
}

/// How a completion came about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// A provider answered
    Generated,
    /// No messages were supplied
    EmptyInput,
    /// Every candidate failed transiently
    AllProvidersFailed,
}

/// Text produced by the gateway plus where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    /// Candidate id that answered
    pub provider: Option<String>,
    pub model: Option<String>,
    pub usage: TokenUsage,
    pub outcome: CompletionOutcome,
}

impl Completion {
    fn sentinel(text: &str, outcome: CompletionOutcome) -> Self {
        Self {
            text: text.to_string(),
            provider: None,
            model: None,
            usage: TokenUsage::default(),
            outcome,
        }
    }

    /// True when the text is a sentinel rather than model output
    pub fn is_degraded(&self) -> bool {
        self.outcome != CompletionOutcome::Generated
    }
}

/// Provider-agnostic entry point for chat completions
pub struct ModelGateway {
    candidates: Vec<GatewayCandidate>,
    options: GatewayOptions,
    active: AtomicUsize,
}

impl ModelGateway {
    pub fn new(candidates: Vec<GatewayCandidate>, options: GatewayOptions) -> Self {
        Self {
            candidates,
            options,
            active: AtomicUsize::new(0),
        }
    }

    /// Build a gateway over every catalog provider with a viable credential
    ///
    /// Providers without one are skipped with a warning. Fails when none is
    /// left.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        settings.validate()?;

        let mut candidates = Vec::new();
        for spec in settings.candidate_order() {
            let key = settings.api_key(spec.id);
            if !is_viable_credential(key) {
                warn!("Skipping provider '{}': {} is not configured", spec.id, spec.env_key);
                continue;
            }
            let Some(key) = key else { continue };

            let config = OpenAIConfig::new(key)
                .with_name(spec.id)
                .with_api_base(settings.api_base_for(spec))
                .with_completions_path(spec.completions_path)
                .with_timeout(settings.timeout.as_secs().max(1));
            let provider = OpenAIProvider::with_config(config)?;

            candidates.push(GatewayCandidate::new(
                spec.id,
                settings.model_for(spec),
                Arc::new(provider),
            ));
        }

        if candidates.is_empty() {
            return Err(LLMError::NoProviderAvailable);
        }

        info!(
            "Model gateway ready: {}",
            candidates
                .iter()
                .map(|c| format!("{}/{}", c.id, c.model))
                .collect::<Vec<_>>()
                .join(" -> ")
        );
        Ok(Self::new(candidates, GatewayOptions::from(settings)))
    }

    pub fn options(&self) -> &GatewayOptions {
        &self.options
    }

    pub fn candidates(&self) -> &[GatewayCandidate] {
        &self.candidates
    }

    /// Candidate the next call starts with
    pub fn active_candidate(&self) -> Option<&GatewayCandidate> {
        self.candidates.get(self.active.load(Ordering::Relaxed))
    }

    /// Attempt order: the active candidate, then the rest in list order
    fn attempt_order(&self) -> Vec<usize> {
        let active = self.active.load(Ordering::Relaxed).min(self.candidates.len().saturating_sub(1));
        std::iter::once(active)
            .chain((0..self.candidates.len()).filter(|&i| i != active))
            .collect()
    }

    /// Run one chat completion
    ///
    /// `temperature` falls back to the configured default. Only permanent
    /// errors and an empty candidate list surface as `Err`.
    pub async fn complete(&self, messages: Vec<Message>, temperature: Option<f32>) -> Result<Completion> {
        if messages.is_empty() {
            warn!("Completion requested without messages");
            return Ok(Completion::sentinel(
                EMPTY_MESSAGES_SENTINEL,
                CompletionOutcome::EmptyInput,
            ));
        }
        if self.candidates.is_empty() {
            return Err(LLMError::NoProviderAvailable);
        }

        let temperature = temperature.unwrap_or(self.options.default_temperature);
        let mut last_error = None;

        for index in self.attempt_order() {
            let candidate = &self.candidates[index];
            let request = CompletionRequest::builder(&candidate.model)
                .messages(messages.clone())
                .max_tokens(self.options.max_tokens)
                .temperature(temperature)
                .build();

            debug!("Calling {}/{}", candidate.id, candidate.model);
            let result = match tokio::time::timeout(
                self.options.call_timeout,
                candidate.provider.complete(request),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(LLMError::Timeout(self.options.call_timeout)),
            };

            match result {
                Ok(response) => {
                    if self.active.swap(index, Ordering::Relaxed) != index {
                        info!("Switched active model provider to '{}'", candidate.id);
                    }
                    if response.stop_reason != StopReason::EndTurn {
                        warn!(
                            "Answer from '{}' ended early ({:?}), parsing what arrived",
                            candidate.id, response.stop_reason
                        );
                    }
                    return Ok(Completion {
                        text: response.message.content,
                        provider: Some(candidate.id.clone()),
                        model: Some(response.model),
                        usage: response.usage,
                        outcome: CompletionOutcome::Generated,
                    });
                }
                Err(e) if e.is_transient() => {
                    warn!("Provider '{}' failed transiently: {}", candidate.id, e);
                    last_error = Some(e);
                    if !self.options.failover {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Provider '{}' failed: {}", candidate.id, e);
                    return Err(e);
                }
            }
        }

        if let Some(e) = last_error {
            warn!("All model providers failed, last error: {}", e);
        }
        Ok(Completion::sentinel(
            ALL_PROVIDERS_FAILED_SENTINEL,
            CompletionOutcome::AllProvidersFailed,
        ))
    }
}
