//! Runs one analyst role end to end
//!
//! Prompt, model call and parse happen here. Any failure along the way is
//! absorbed into a degraded [`AnalystResult`] so a single role can never abort
//! the job.

use crate::context::synthesis_context;
use crate::{PipelineError, Result, StockContext};
use analyst_core::{AnalystResult, AnalystRole};
use analyst_llm::{Message, ModelGateway, TokenUsage};
use analyst_prompt::{Language, PromptCatalog, parse_output};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Result of one role plus what the model call cost
#[derive(Debug, Clone, PartialEq)]
pub struct RoleOutcome {
    pub result: AnalystResult,
    pub usage: TokenUsage,
    /// Model that answered, `None` when degraded
    pub model: Option<String>,
}

impl RoleOutcome {
    pub fn degraded(role: AnalystRole, reason: impl AsRef<str>) -> Self {
        Self {
            result: AnalystResult::degraded(role, reason),
            usage: TokenUsage::default(),
            model: None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.result.degraded
    }
}

/// Executes analyst roles against the model gateway
pub struct AnalystTaskRunner {
    gateway: Arc<ModelGateway>,
    catalog: Arc<PromptCatalog>,
}

impl AnalystTaskRunner {
    pub fn new(gateway: Arc<ModelGateway>, catalog: Arc<PromptCatalog>) -> Self {
        Self { gateway, catalog }
    }

    pub fn gateway(&self) -> &ModelGateway {
        &self.gateway
    }

    pub fn language(&self) -> Language {
        self.catalog.language()
    }

    /// Run an independent role over the market-data context
    pub async fn run(&self, role: AnalystRole, ctx: &StockContext) -> RoleOutcome {
        let block = ctx.render(self.language());
        self.execute(role, ctx, &block).await
    }

    /// Run the synthesizer over the independent results
    pub async fn synthesize(&self, ctx: &StockContext, results: &[AnalystResult]) -> RoleOutcome {
        let block = synthesis_context(results, self.language());
        self.execute(AnalystRole::Synthesizer, ctx, &block).await
    }

    #[instrument(skip(self, ctx, block), fields(symbol = %ctx.symbol))]
    async fn execute(&self, role: AnalystRole, ctx: &StockContext, block: &str) -> RoleOutcome {
        match self.try_execute(role, ctx, block).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("{} degraded for {}: {}", role, ctx.symbol, e);
                RoleOutcome::degraded(role, e.to_string())
            }
        }
    }

    async fn try_execute(
        &self,
        role: AnalystRole,
        ctx: &StockContext,
        block: &str,
    ) -> Result<RoleOutcome> {
        let prompt = self.catalog.build_prompt(role, ctx.stock_name(), &ctx.symbol);
        if prompt.is_empty() {
            return Err(PipelineError::EmptyPrompt(role));
        }
        let system = self.catalog.system_prompt(role)?;
        let messages = vec![
            Message::system(system),
            Message::user(format!("{prompt}\n\n{block}")),
        ];

        let completion = self
            .gateway
            .complete(messages, Some(role.temperature()))
            .await?;
        if completion.is_degraded() {
            return Err(PipelineError::ModelUnavailable(completion.text));
        }

        let result = parse_output(role, &completion.text);
        debug!(
            "{} scored {:.1} (confidence {:.0}) via {:?}",
            role, result.score, result.confidence, completion.provider
        );
        Ok(RoleOutcome {
            result,
            usage: completion.usage,
            model: completion.model,
        })
    }
}
