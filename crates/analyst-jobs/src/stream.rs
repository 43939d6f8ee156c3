//! Progress event stream for one job
//!
//! Polls the store at a fixed interval and yields an event only when the
//! observed (status, stage, progress) changes. The stream ends after exactly
//! one terminal event: complete, error, not found or timeout. Dropping the
//! stream stops polling.

use crate::JobStore;
use analyst_core::{Job, JobStatus, Stage};
use futures::Stream;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

/// Polling cadence and lifetime of a progress stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    pub poll_interval: Duration,
    /// Hard ceiling on the stream's wall-clock lifetime
    pub max_duration: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_duration: Duration::from_secs(300),
        }
    }
}

/// One event delivered to a progress subscriber
///
/// Progress, complete and error events carry the whole job, serialized
/// exactly as a poll returns it. Not-found and timeout carry the id and a
/// message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProgressEvent {
    Progress(Box<Job>),
    Complete(Box<Job>),
    Error(Box<Job>),
    NotFound { id: String, error: String },
    Timeout { id: String, error: String },
}

impl ProgressEvent {
    /// Event name used on the wire
    pub fn name(&self) -> &'static str {
        match self {
            ProgressEvent::Progress(_) => "progress",
            ProgressEvent::Complete(_) => "complete",
            ProgressEvent::Error(_) => "error",
            ProgressEvent::NotFound { .. } => "not_found",
            ProgressEvent::Timeout { .. } => "timeout",
        }
    }

    /// Whether the stream ends after this event
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProgressEvent::Progress(_))
    }

    /// Job snapshot carried by the event, if any
    pub fn job(&self) -> Option<&Job> {
        match self {
            ProgressEvent::Progress(job)
            | ProgressEvent::Complete(job)
            | ProgressEvent::Error(job) => Some(job),
            ProgressEvent::NotFound { .. } | ProgressEvent::Timeout { .. } => None,
        }
    }
}

struct PollState {
    store: Arc<dyn JobStore>,
    job_id: String,
    config: StreamConfig,
    started: Instant,
    last_seen: Option<(JobStatus, Stage, i32)>,
    polled_once: bool,
    finished: bool,
}

impl PollState {
    fn finish(&mut self, event: ProgressEvent) -> Option<ProgressEvent> {
        self.finished = true;
        Some(event)
    }

    async fn next_event(&mut self) -> Option<ProgressEvent> {
        loop {
            if self.finished {
                return None;
            }
            if self.polled_once {
                tokio::time::sleep(self.config.poll_interval).await;
            }
            self.polled_once = true;

            if self.started.elapsed() >= self.config.max_duration {
                let error = format!("进度订阅超过 {} 秒上限", self.config.max_duration.as_secs());
                return self.finish(ProgressEvent::Timeout {
                    id: self.job_id.clone(),
                    error,
                });
            }

            let mut job = match self.store.get(&self.job_id).await {
                Ok(Some(job)) => job,
                Ok(None) => {
                    return self.finish(ProgressEvent::NotFound {
                        id: self.job_id.clone(),
                        error: "任务不存在或已过期".to_string(),
                    });
                }
                Err(e) => {
                    warn!("Progress poll for {} failed: {}", self.job_id, e);
                    continue;
                }
            };

            match job.status {
                JobStatus::Completed if job.result.is_some() => {
                    return self.finish(ProgressEvent::Complete(Box::new(job)));
                }
                JobStatus::Completed => {
                    job.error = Some("任务已完成但缺少结果".to_string());
                    return self.finish(ProgressEvent::Error(Box::new(job)));
                }
                JobStatus::Failed => {
                    if job.error.is_none() {
                        job.error = Some(job.message.clone());
                    }
                    return self.finish(ProgressEvent::Error(Box::new(job)));
                }
                JobStatus::Pending | JobStatus::Running => {
                    let observed = (job.status, job.stage, job.progress);
                    if self.last_seen == Some(observed) {
                        continue;
                    }
                    self.last_seen = Some(observed);
                    return Some(ProgressEvent::Progress(Box::new(job)));
                }
            }
        }
    }
}

/// Stream progress events for `job_id` until a terminal event
pub fn progress_stream(
    store: Arc<dyn JobStore>,
    job_id: impl Into<String>,
    config: StreamConfig,
) -> impl Stream<Item = ProgressEvent> + Send {
    let state = PollState {
        store,
        job_id: job_id.into(),
        config,
        started: Instant::now(),
        last_seen: None,
        polled_once: false,
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        let event = state.next_event().await?;
        Some((event, state))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryJobStore;
    use analyst_core::{AnalysisReport, JobUpdate, Market, Recommendation, UsageCounters};
    use chrono::Utc;
    use futures::StreamExt;

    fn report() -> AnalysisReport {
        AnalysisReport {
            symbol: "600519".to_string(),
            stock_name: "贵州茅台".to_string(),
            market: Market::A,
            overall_score: 73.5,
            recommendation: Recommendation::Hold,
            confidence: 70.0,
            key_factors: vec![],
            risks: vec![],
            opportunities: vec![],
            summary: String::new(),
            role_analysis: vec![],
            synthesis: None,
            synthesis_recommendation: None,
            technical: None,
            model: "deepseek-chat".to_string(),
            processing_time: 1.0,
            token_usage: UsageCounters::default(),
            estimated_cost: None,
            created_at: Utc::now(),
        }
    }

    fn names(events: &[ProgressEvent]) -> Vec<&'static str> {
        events.iter().map(ProgressEvent::name).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_job_yields_not_found() {
        let store: Arc<dyn JobStore> = Arc::new(MemoryJobStore::default());
        let events: Vec<_> = progress_stream(store, "nope", StreamConfig::default())
            .collect()
            .await;
        assert_eq!(names(&events), vec!["not_found"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_emits_only_on_change_then_completes() {
        let memory = MemoryJobStore::default();
        memory.create(Job::new("j", "600519", Market::A)).await.unwrap();
        let store: Arc<dyn JobStore> = Arc::new(memory.clone());

        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            memory.update("j", JobUpdate::stage(Stage::CollectBasic)).await.unwrap();
            tokio::time::sleep(Duration::from_millis(2000)).await;
            memory.complete("j", report()).await.unwrap();
        });

        let events: Vec<_> = progress_stream(store, "j", StreamConfig::default())
            .collect()
            .await;
        writer.await.unwrap();

        assert_eq!(names(&events), vec!["progress", "progress", "complete"]);
        let basic = events[1].job().unwrap();
        assert_eq!(basic.stage, Stage::CollectBasic);
        assert_eq!(basic.progress, 10);
        assert!(basic.result.is_none());
        let done = events[2].job().unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.result.as_ref().unwrap().overall_score, 73.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_job_yields_error() {
        let memory = MemoryJobStore::default();
        memory.create(Job::new("j", "AAPL", Market::US)).await.unwrap();
        memory.fail("j", "行情源不可用").await.unwrap();
        let store: Arc<dyn JobStore> = Arc::new(memory);

        let events: Vec<_> = progress_stream(store, "j", StreamConfig::default())
            .collect()
            .await;
        assert_eq!(names(&events), vec!["error"]);
        let job = events[0].job().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("行情源不可用"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_job_times_out() {
        let memory = MemoryJobStore::default();
        memory.create(Job::new("j", "00700", Market::HK)).await.unwrap();
        let store: Arc<dyn JobStore> = Arc::new(memory);

        let config = StreamConfig {
            poll_interval: Duration::from_secs(1),
            max_duration: Duration::from_secs(5),
        };
        let events: Vec<_> = progress_stream(store, "j", config).collect().await;
        assert_eq!(names(&events), vec!["progress", "timeout"]);
        assert!(events.last().is_some_and(ProgressEvent::is_terminal));
    }

    #[test]
    fn test_event_serializes_as_job() {
        let mut job = Job::new("j", "600519", Market::A);
        job.apply(&JobUpdate::stage(Stage::AiMacro));
        let event = ProgressEvent::Progress(Box::new(job.clone()));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, serde_json::to_value(&job).unwrap());
        assert_eq!(json["id"], "j");
        assert_eq!(json["stage"], "ai_macro");
        assert_eq!(json["status"], "running");
        assert!(json["result"].is_null());
        assert!(json["error"].is_null());
        assert_eq!(event.name(), "progress");

        let missing = ProgressEvent::NotFound {
            id: "x".to_string(),
            error: "任务不存在或已过期".to_string(),
        };
        let json = serde_json::to_value(&missing).unwrap();
        assert_eq!(json["id"], "x");
        assert!(missing.job().is_none());
    }
}
