//! Shared handler state

use analyst_jobs::{JobStore, StreamConfig};
use analyst_llm::LlmSettings;
use analyst_pipeline::Orchestrator;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
    /// Provider catalog and credentials, for `/api/providers`
    pub llm: Arc<LlmSettings>,
    pub stream: StreamConfig,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, llm: LlmSettings) -> Self {
        Self {
            orchestrator,
            llm: Arc::new(llm),
            stream: StreamConfig::default(),
            started_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_stream_config(mut self, stream: StreamConfig) -> Self {
        self.stream = stream;
        self
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        self.orchestrator.store()
    }
}
