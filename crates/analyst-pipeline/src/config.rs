//! Pipeline configuration

use crate::{PipelineError, Result};
use analyst_core::AnalystRole;
use analyst_prompt::Language;
use analyst_utils::{EnvSource, EnvSourceExt, ProcessEnv};
use std::time::Duration;

/// Configuration for one orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Budget for the single data-provider call
    pub collect_timeout: Duration,

    /// How long collected market data is reused
    pub cache_ttl: Duration,

    /// Analyst tasks allowed to run at once
    pub concurrency: usize,

    /// Prompt and report language
    pub language: Language,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            collect_timeout: Duration::from_secs(60),
            cache_ttl: Duration::from_secs(300),
            concurrency: AnalystRole::INDEPENDENT.len(),
            language: Language::Chinese,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Read `COLLECT_TIMEOUT_SECS`, `DATA_CACHE_TTL_SECS`, `ANALYST_CONCURRENCY`
    /// and `ANALYSIS_LANGUAGE`
    pub fn from_env() -> Result<Self> {
        Self::from_source(&ProcessEnv)
    }

    pub fn from_source<S: EnvSource + ?Sized>(env: &S) -> Result<Self> {
        let defaults = Self::default();
        Self::builder()
            .collect_timeout(Duration::from_secs(
                env.parse_or("COLLECT_TIMEOUT_SECS", defaults.collect_timeout.as_secs()),
            ))
            .cache_ttl(Duration::from_secs(
                env.parse_or("DATA_CACHE_TTL_SECS", defaults.cache_ttl.as_secs()),
            ))
            .concurrency(env.parse_or("ANALYST_CONCURRENCY", defaults.concurrency))
            .language(Language::from_code_or_default(
                &env.string_or("ANALYSIS_LANGUAGE", defaults.language.code()),
            ))
            .build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.collect_timeout.is_zero() {
            return Err(PipelineError::Config(
                "collect_timeout must be greater than 0".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(PipelineError::Config(
                "concurrency must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for PipelineConfig
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    collect_timeout: Option<Duration>,
    cache_ttl: Option<Duration>,
    concurrency: Option<usize>,
    language: Option<Language>,
}

impl PipelineConfigBuilder {
    pub fn collect_timeout(mut self, timeout: Duration) -> Self {
        self.collect_timeout = Some(timeout);
        self
    }

    /// Zero disables the data cache
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    pub fn language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<PipelineConfig> {
        let defaults = PipelineConfig::default();

        let config = PipelineConfig {
            collect_timeout: self.collect_timeout.unwrap_or(defaults.collect_timeout),
            cache_ttl: self.cache_ttl.unwrap_or(defaults.cache_ttl),
            concurrency: self.concurrency.unwrap_or(defaults.concurrency),
            language: self.language.unwrap_or(defaults.language),
        };

        config.validate()?;
        Ok(config)
    }
}
