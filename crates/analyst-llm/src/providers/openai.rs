//! OpenAI-compatible chat completion provider
//!
//! DeepSeek, MiniMax, Zhipu and Qwen all expose the OpenAI chat completion
//! wire format, differing only in base URL and completion path.
//!
//! # Example
//!
//! ```no_run
//! use analyst_llm::{CompletionRequest, LLMProvider, Message};
//! use analyst_llm::providers::{OpenAIConfig, OpenAIProvider};
//!
//! # async fn run() -> analyst_llm::Result<()> {
//! let config = OpenAIConfig::new("sk-...")
//!     .with_name("deepseek")
//!     .with_api_base("https://api.deepseek.com/v1")
//!     .with_timeout(60);
//! let provider = OpenAIProvider::with_config(config)?;
//!
//! let request = CompletionRequest::builder("deepseek-chat")
//!     .add_message(Message::user("你好"))
//!     .build();
//! let response = provider.complete(request).await?;
//! println!("{}", response.message.text());
//! # Ok(())
//! # }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, Result, StopReason,
    TokenUsage,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_COMPLETIONS_PATH: &str = "/chat/completions";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for an OpenAI-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Provider name reported by [`LLMProvider::name`]
    pub name: String,

    /// API key sent as a bearer token
    pub api_key: String,

    /// Base URL, e.g. "https://api.deepseek.com/v1"
    pub api_base: String,

    /// Path appended to the base URL (default: "/chat/completions")
    pub completions_path: String,

    /// Request timeout in seconds (default: 120)
    pub timeout_secs: u64,

    /// Optional list of supported models
    /// If None, any model string is accepted
    pub supported_models: Option<Vec<String>>,
}

impl OpenAIConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Set the provider name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set the completion path appended to the base URL
    pub fn with_completions_path(mut self, path: impl Into<String>) -> Self {
        self.completions_path = path.into();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set supported models list
    pub fn with_supported_models(mut self, models: Vec<String>) -> Self {
        self.supported_models = Some(models);
        self
    }

    /// Full URL of the completion endpoint
    pub fn endpoint(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        if self.completions_path.starts_with('/') {
            format!("{base}{}", self.completions_path)
        } else {
            format!("{base}/{}", self.completions_path)
        }
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            name: "openai".to_string(),
            api_key: String::new(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            completions_path: DEFAULT_COMPLETIONS_PATH.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            supported_models: None,
        }
    }
}

/// Provider for any OpenAI-compatible chat completion endpoint
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a provider with custom configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a provider with API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Validate model name against supported models list (if configured)
    fn validate_model(&self, model: &str) -> Result<()> {
        if let Some(supported) = &self.config.supported_models {
            if !supported.iter().any(|m| m == model) {
                return Err(LLMError::InvalidRequest(format!(
                    "Model '{model}' is not in the supported models list: {supported:?}"
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(provider = %self.config.name, model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.validate_model(&request.model)?;

        let endpoint = self.config.endpoint();
        debug!("Sending chat completion to {}", endpoint);

        let model = request.model.clone();
        let body = OpenAIRequest::from(request);

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(map_status(status, error_text, &model));
        }

        let payload: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| LLMError::UnexpectedResponse(format!("Failed to parse response: {e}")))?;

        into_completion(payload, &model)
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}

/// Map a non-success HTTP status onto the error taxonomy
fn map_status(status: StatusCode, body: String, model: &str) -> LLMError {
    match status.as_u16() {
        401 | 403 => LLMError::AuthenticationFailed,
        429 => LLMError::RateLimitExceeded(body),
        400 => LLMError::InvalidRequest(body),
        404 => LLMError::ModelNotFound(model.to_string()),
        500..=599 => LLMError::ServiceUnavailable(format!("HTTP {status}: {body}")),
        _ => LLMError::RequestFailed(format!("HTTP {status}: {body}")),
    }
}

/// Convert a decoded response into our format
fn into_completion(payload: OpenAIResponse, requested_model: &str) -> Result<CompletionResponse> {
    // MiniMax reports failures inside a 200 body
    if let Some(base) = payload.base_resp.as_ref().filter(|b| b.status_code != 0) {
        return Err(match base.status_code {
            1002 => LLMError::RateLimitExceeded(base.status_msg.clone()),
            1004 => LLMError::AuthenticationFailed,
            _ => LLMError::ProviderError(format!(
                "status {}: {}",
                base.status_code, base.status_msg
            )),
        });
    }

    let choice = payload
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LLMError::UnexpectedResponse("No choices in response".to_string()))?;

    let usage = payload.usage.unwrap_or_default();
    debug!(
        "Received response - finish_reason: {:?}, tokens: {}/{}",
        choice.finish_reason, usage.prompt_tokens, usage.completion_tokens
    );

    Ok(CompletionResponse {
        message: Message::assistant(choice.message.content.unwrap_or_default()),
        model: payload
            .model
            .unwrap_or_else(|| requested_model.to_string()),
        stop_reason: map_stop_reason(choice.finish_reason.as_deref().unwrap_or("stop")),
        usage: TokenUsage {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        },
    })
}

/// Map OpenAI stop reason to our format
fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "length" => StopReason::MaxTokens,
        "content_filter" => StopReason::ContentFilter,
        "stop" => StopReason::EndTurn,
        other => {
            debug!("Unknown stop reason: {}", other);
            StopReason::EndTurn
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

impl From<CompletionRequest> for OpenAIRequest {
    fn from(request: CompletionRequest) -> Self {
        Self {
            model: request.model,
            messages: request
                .messages
                .into_iter()
                .map(|m| OpenAIMessage {
                    role: m.role.as_str(),
                    content: m.content,
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
    model: Option<String>,
    base_resp: Option<BaseResp>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAIUsage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct BaseResp {
    status_code: i64,
    #[serde(default)]
    status_msg: String,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> OpenAIResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_provider_creation() {
        let provider = OpenAIProvider::new("test-key").unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.config().api_key, "test-key");
        assert_eq!(
            provider.config().endpoint(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_custom_endpoint() {
        let config = OpenAIConfig::new("test-key")
            .with_name("minimax")
            .with_api_base("https://api.minimax.chat/v1/")
            .with_completions_path("/text/chatcompletion_v2")
            .with_timeout(30);

        let provider = OpenAIProvider::with_config(config).unwrap();
        assert_eq!(provider.name(), "minimax");
        assert_eq!(provider.config().timeout_secs, 30);
        assert_eq!(
            provider.config().endpoint(),
            "https://api.minimax.chat/v1/text/chatcompletion_v2"
        );
    }

    #[test]
    fn test_model_validation() {
        let config = OpenAIConfig::new("test-key")
            .with_supported_models(vec!["glm-4".to_string()]);
        let provider = OpenAIProvider::with_config(config).unwrap();

        assert!(provider.validate_model("glm-4").is_ok());
        assert!(matches!(
            provider.validate_model("glm-3"),
            Err(LLMError::InvalidRequest(_))
        ));

        let open = OpenAIProvider::new("test-key").unwrap();
        assert!(open.validate_model("anything").is_ok());
    }

    #[test]
    fn test_status_mapping() {
        let model = "deepseek-chat";
        assert!(matches!(
            map_status(StatusCode::UNAUTHORIZED, String::new(), model),
            LLMError::AuthenticationFailed
        ));
        assert!(matches!(
            map_status(StatusCode::TOO_MANY_REQUESTS, "busy".into(), model),
            LLMError::RateLimitExceeded(_)
        ));
        assert!(matches!(
            map_status(StatusCode::BAD_REQUEST, "bad".into(), model),
            LLMError::InvalidRequest(_)
        ));
        assert!(matches!(
            map_status(StatusCode::NOT_FOUND, String::new(), model),
            LLMError::ModelNotFound(m) if m == model
        ));
        assert!(map_status(StatusCode::BAD_GATEWAY, String::new(), model).is_transient());
        assert!(!map_status(StatusCode::IM_A_TEAPOT, String::new(), model).is_transient());
    }

    #[test]
    fn test_request_conversion() {
        let request = CompletionRequest::builder("qwen-max")
            .add_message(Message::system("sys"))
            .add_message(Message::user("hi"))
            .temperature(0.4)
            .build();

        let body = serde_json::to_value(OpenAIRequest::from(request)).unwrap();
        assert_eq!(body["model"], "qwen-max");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
        assert!((body["temperature"].as_f64().unwrap() - 0.4).abs() < 1e-6);
        assert_eq!(body["max_tokens"], 2000);
    }

    #[test]
    fn test_response_conversion() {
        let payload = decode(json!({
            "model": "deepseek-chat",
            "choices": [{
                "message": {"role": "assistant", "content": "综合评分: 80"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 120, "completion_tokens": 30}
        }));

        let response = into_completion(payload, "deepseek-chat").unwrap();
        assert_eq!(response.message.text(), "综合评分: 80");
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.total(), 150);
    }

    #[test]
    fn test_response_without_usage_or_model() {
        let payload = decode(json!({
            "choices": [{"message": {"content": null}, "finish_reason": "length"}]
        }));

        let response = into_completion(payload, "glm-4").unwrap();
        assert_eq!(response.model, "glm-4");
        assert_eq!(response.message.text(), "");
        assert_eq!(response.stop_reason, StopReason::MaxTokens);
        assert_eq!(response.usage, TokenUsage::default());
    }

    #[test]
    fn test_response_without_choices() {
        let payload = decode(json!({"choices": []}));
        assert!(matches!(
            into_completion(payload, "m"),
            Err(LLMError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_minimax_error_body() {
        let payload = decode(json!({
            "choices": [],
            "base_resp": {"status_code": 1002, "status_msg": "rate limit"}
        }));
        let err = into_completion(payload, "minimax-m2").unwrap_err();
        assert!(err.is_transient());

        let payload = decode(json!({
            "choices": [],
            "base_resp": {"status_code": 1004, "status_msg": "auth"}
        }));
        assert!(matches!(
            into_completion(payload, "minimax-m2"),
            Err(LLMError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(map_stop_reason("stop"), StopReason::EndTurn);
        assert_eq!(map_stop_reason("length"), StopReason::MaxTokens);
        assert_eq!(map_stop_reason("content_filter"), StopReason::ContentFilter);
        assert_eq!(map_stop_reason("tool_calls"), StopReason::EndTurn);
    }
}
