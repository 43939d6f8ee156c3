//! The job store seam

use crate::Result;
use analyst_core::{AnalysisReport, Job, JobUpdate};
use analyst_utils::{EnvSource, EnvSourceExt, ProcessEnv};
use async_trait::async_trait;
use std::time::Duration;

/// Retention limits shared by every backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Refreshed on every write
    pub ttl: Duration,
    /// Oldest jobs are evicted beyond this count
    pub max_jobs: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            max_jobs: 500,
        }
    }
}

impl StoreConfig {
    /// Read `JOB_TTL_SECS` and `MAX_JOBS`
    pub fn from_env() -> Self {
        Self::from_source(&ProcessEnv)
    }

    pub fn from_source<S: EnvSource + ?Sized>(env: &S) -> Self {
        let defaults = Self::default();
        Self {
            ttl: Duration::from_secs(env.parse_or("JOB_TTL_SECS", defaults.ttl.as_secs()).max(1)),
            max_jobs: env.parse_or("MAX_JOBS", defaults.max_jobs).max(1),
        }
    }
}

/// Persistent record of every job's progress and outcome
///
/// Operations on one id are atomic. Writes refresh the TTL. Reads of an
/// absent or expired id return `None`.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new job, evicting the oldest beyond the cap
    async fn create(&self, job: Job) -> Result<()>;

    /// Apply a partial update; `false` when the job is absent or terminal
    async fn update(&self, id: &str, update: JobUpdate) -> Result<bool>;

    /// Mark completed with the report; `false` when absent or terminal
    async fn complete(&self, id: &str, report: AnalysisReport) -> Result<bool>;

    /// Mark failed with a message; `false` when absent or terminal
    async fn fail(&self, id: &str, error: &str) -> Result<bool>;

    async fn get(&self, id: &str) -> Result<Option<Job>>;

    /// Every live job, newest first
    async fn list_all(&self) -> Result<Vec<Job>>;

    /// Remove a job; `false` when it was not there
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Drop expired records, returning how many went
    async fn cleanup_expired(&self) -> Result<usize>;

    /// Backend name for health output
    fn backend(&self) -> &'static str;

    /// Whether the backend answers
    async fn ping(&self) -> bool {
        true
    }
}
