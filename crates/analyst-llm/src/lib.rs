//! Model gateway for the analyst pipeline
//!
//! This crate provides provider-agnostic abstractions for calling chat
//! completion models. It includes:
//!
//! - Message and completion request/response types
//! - The [`LLMProvider`] trait and an OpenAI-compatible HTTP provider
//! - A catalog of supported providers with credential checks
//! - [`ModelGateway`], which walks an ordered candidate list on transient failures
//! - A per-model pricing table for cost estimates and tier-based model choice

pub mod catalog;
pub mod completion;
pub mod error;
pub mod gateway;
pub mod messages;
pub mod pricing;
pub mod provider;
pub mod providers;
pub mod settings;

// Re-export main types
pub use catalog::{PROVIDERS, ProviderSpec, find_provider, is_viable_credential};
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use gateway::{
    ALL_PROVIDERS_FAILED_SENTINEL, Completion, CompletionOutcome, EMPTY_MESSAGES_SENTINEL,
    GatewayCandidate, GatewayOptions, ModelGateway,
};
pub use messages::{Message, Role};
pub use pricing::{
    MODELS, ModelInfo, ModelPricing, SubscriptionTier, estimate_cost, model_info, optimal_model,
    pricing_for,
};
pub use provider::LLMProvider;
pub use settings::{LlmSettings, ProviderStatus};
