//! Hand-written test doubles shared by the pipeline tests

use crate::{DataError, MarketDataProvider, StockContext};
use analyst_core::{AnalystRole, KlineBar, Market, MarketData, StockBasicInfo};
use analyst_llm::{
    CompletionRequest, CompletionResponse, GatewayCandidate, GatewayOptions, LLMError,
    LLMProvider, Message, ModelGateway, StopReason, TokenUsage,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Model answer in the catalog's output format
pub(crate) fn analyst_text(score: f64, label: &str) -> String {
    format!(
        "综合评分: {score}\n置信度: 80\n操作建议: {label}\n关键因素:\n- 因素{score}\n- 龙头地位稳固\n主要风险:\n- 风险{score}\n- 行业竞争加剧\n"
    )
}

pub(crate) fn sample_data() -> MarketData {
    MarketData {
        basic: StockBasicInfo {
            symbol: "000001".to_string(),
            name: "平安银行".to_string(),
            price: Some(11.5),
            ..Default::default()
        },
        kline: (0..30)
            .map(|i| KlineBar {
                timestamp: 1_700_000_000 + i * 86_400,
                open: 11.0,
                high: 12.0,
                low: 10.0,
                close: 11.0 + i as f64 * 0.05,
                volume: 1e6,
            })
            .collect(),
        financial: None,
        news: Vec::new(),
        source: "fixture".to_string(),
    }
}

pub(crate) fn sample_context() -> StockContext {
    StockContext::new("000001", Market::A, sample_data(), None)
}

enum Script {
    Answer(String),
    Fail(LLMError),
    Panic,
    Slow(Duration, String),
}

fn replay(error: &LLMError) -> LLMError {
    match error {
        LLMError::RateLimitExceeded(m) => LLMError::RateLimitExceeded(m.clone()),
        LLMError::InvalidRequest(m) => LLMError::InvalidRequest(m.clone()),
        LLMError::ServiceUnavailable(m) => LLMError::ServiceUnavailable(m.clone()),
        LLMError::AuthenticationFailed => LLMError::AuthenticationFailed,
        other => LLMError::ProviderError(other.to_string()),
    }
}

/// Provider that answers per role, recognising the role from the system prompt
pub(crate) struct RoleScriptedProvider {
    scripts: Mutex<HashMap<AnalystRole, Script>>,
    requests: Mutex<HashMap<AnalystRole, CompletionRequest>>,
    calls: AtomicUsize,
}

impl RoleScriptedProvider {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(HashMap::new()),
            requests: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        })
    }

    fn script(self: &Arc<Self>, role: AnalystRole, script: Script) -> Arc<Self> {
        self.scripts.lock().unwrap().insert(role, script);
        Arc::clone(self)
    }

    pub(crate) fn answer(self: &Arc<Self>, role: AnalystRole, text: impl Into<String>) -> Arc<Self> {
        self.script(role, Script::Answer(text.into()))
    }

    pub(crate) fn fail(self: &Arc<Self>, role: AnalystRole, error: LLMError) -> Arc<Self> {
        self.script(role, Script::Fail(error))
    }

    pub(crate) fn panic_on(self: &Arc<Self>, role: AnalystRole) -> Arc<Self> {
        self.script(role, Script::Panic)
    }

    pub(crate) fn slow(
        self: &Arc<Self>,
        role: AnalystRole,
        delay: Duration,
        text: impl Into<String>,
    ) -> Arc<Self> {
        self.script(role, Script::Slow(delay, text.into()))
    }

    /// Six independent roles with the given scores, plus a synthesizer
    pub(crate) fn with_scores(scores: [f64; 6]) -> Arc<Self> {
        let provider = Self::new();
        for (role, score) in AnalystRole::INDEPENDENT.into_iter().zip(scores) {
            provider.answer(role, analyst_text(score, "持有"));
        }
        provider.answer(
            AnalystRole::Synthesizer,
            format!("{}投资机会:\n- 估值修复\n执行摘要: 整体稳健，建议持有。\n", analyst_text(72.0, "买入")),
        )
    }

    pub(crate) fn last_request(&self, role: AnalystRole) -> Option<CompletionRequest> {
        self.requests.lock().unwrap().get(&role).cloned()
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn role_of(request: &CompletionRequest) -> Option<AnalystRole> {
        let system = &request.messages.first()?.content;
        AnalystRole::ALL
            .into_iter()
            .find(|r| system.contains(&format!("你是{}", r.display_name())))
    }
}

#[async_trait]
impl LLMProvider for RoleScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> analyst_llm::Result<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some(role) = Self::role_of(&request) else {
            return Err(LLMError::InvalidRequest("unknown role".to_string()));
        };
        self.requests.lock().unwrap().insert(role, request.clone());

        // Decided before panicking so the lock is never poisoned
        let step = match self.scripts.lock().unwrap().get(&role) {
            Some(Script::Answer(text)) => Some(Ok((None, text.clone()))),
            Some(Script::Slow(delay, text)) => Some(Ok((Some(*delay), text.clone()))),
            Some(Script::Fail(e)) => Some(Err(replay(e))),
            Some(Script::Panic) => None,
            None => Some(Err(LLMError::InvalidRequest(format!("no script for {role}")))),
        };
        let Some(step) = step else {
            panic!("scripted panic for {role}");
        };
        let (delay, text) = step?;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        Ok(CompletionResponse {
            message: Message::assistant(text),
            model: request.model,
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage {
                input_tokens: 100,
                output_tokens: 50,
            },
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub(crate) fn gateway_over(provider: Arc<RoleScriptedProvider>) -> Arc<ModelGateway> {
    Arc::new(ModelGateway::new(
        vec![GatewayCandidate::new("deepseek", "deepseek-chat", provider)],
        GatewayOptions::default(),
    ))
}

/// Data provider returning a fixed result, optionally after a delay
pub(crate) struct StaticDataProvider {
    result: Result<MarketData, DataError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StaticDataProvider {
    pub(crate) fn ok(data: MarketData) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(data),
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn failing(error: DataError) -> Arc<Self> {
        Arc::new(Self {
            result: Err(error),
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn slow(data: MarketData, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(data),
            delay: Some(delay),
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for StaticDataProvider {
    async fn collect(&self, _symbol: &str, _market: Market) -> Result<MarketData, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }

    fn name(&self) -> &str {
        "static"
    }
}
