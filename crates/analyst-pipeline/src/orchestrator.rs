//! Per-job state machine
//!
//! One coordinating task per job walks the stages in order: collect market
//! data (or take it from the cache), compute indicators, fan the six
//! independent analysts out over a bounded pool, join all of them, run the
//! synthesizer and fold everything into a report. Only the data path or a
//! panic can fail a job; analyst failures arrive here already degraded.

use crate::aggregate::{ReportInputs, assemble_report};
use crate::data::normalize::{normalize_kline, sanitize_financial};
use crate::data::{MarketDataCache, MarketDataProvider, sentiment};
use crate::runner::{AnalystTaskRunner, RoleOutcome};
use crate::{
    DataError, PipelineConfig, PipelineError, ReportSink, Result, StockContext, indicators,
};
use analyst_core::{AnalysisReport, AnalystResult, AnalystRole, Job, JobUpdate, Market, MarketData, Stage};
use analyst_jobs::JobStore;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

const CACHE_HIT_MESSAGE: &str = "使用缓存数据";
const ABORTED: &str = "任务异常终止";

/// Drives analysis jobs from submission to a terminal state
#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<dyn JobStore>,
    data: Arc<dyn MarketDataProvider>,
    cache: MarketDataCache,
    runner: Arc<AnalystTaskRunner>,
    sink: Option<Arc<dyn ReportSink>>,
    config: PipelineConfig,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn JobStore>,
        data: Arc<dyn MarketDataProvider>,
        runner: Arc<AnalystTaskRunner>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            data,
            cache: MarketDataCache::new(config.cache_ttl),
            runner,
            sink: None,
            config,
        }
    }

    /// Hand every completed report to `sink` at the `save_result` stage
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    pub fn runner(&self) -> &AnalystTaskRunner {
        &self.runner
    }

    pub fn cache(&self) -> &MarketDataCache {
        &self.cache
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Record a new pending job without starting it
    pub async fn create_job(&self, symbol: &str, market: Market) -> Result<Job> {
        let symbol = normalize_symbol(symbol)?;
        let job = Job::new(Uuid::new_v4().to_string(), symbol, market);
        self.store.create(job.clone()).await?;
        Ok(job)
    }

    /// Create a job and run it in the background, returning its id at once
    pub async fn submit(&self, symbol: &str, market: Market) -> Result<String> {
        let job = self.create_job(symbol, market).await?;
        info!("Submitted job {} for {} ({})", job.id, job.symbol, market);

        let this = self.clone();
        let id = job.id.clone();
        tokio::spawn(async move {
            this.run_job(&job.id, &job.symbol, job.market).await;
        });
        Ok(id)
    }

    /// Run a created job to completion or failure
    ///
    /// Never returns an error: the outcome lands in the store. A panic
    /// anywhere in the run fails the job instead of leaving it running.
    #[instrument(skip_all, fields(job_id = %job_id, symbol = %symbol, market = %market))]
    pub async fn run_job(&self, job_id: &str, symbol: &str, market: Market) {
        let outcome = AssertUnwindSafe(self.execute(job_id, symbol, market))
            .catch_unwind()
            .await;
        let outcome = outcome.unwrap_or_else(|_| {
            error!("Job {} panicked", job_id);
            Err(PipelineError::Aborted(ABORTED.to_string()))
        });
        match outcome {
            Ok(report) => {
                info!(
                    "Job {} completed: {:.1} {}",
                    job_id,
                    report.overall_score,
                    report.recommendation.as_str()
                );
                if let Err(e) = self.store.complete(job_id, report).await {
                    error!("Failed to store result of job {}: {}", job_id, e);
                }
            }
            Err(e) => {
                error!("Job {} failed: {}", job_id, e);
                if let Err(store_err) = self.store.fail(job_id, &e.to_string()).await {
                    error!("Failed to mark job {} failed: {}", job_id, store_err);
                }
            }
        }
    }

    async fn execute(&self, job_id: &str, symbol: &str, market: Market) -> Result<AnalysisReport> {
        let started = Instant::now();
        self.advance(
            job_id,
            JobUpdate::stage(Stage::Start).with_message(format!("开始分析 {symbol} ({market})")),
        )
        .await;

        let cached = self.cache.get(symbol, market).await;
        let check = JobUpdate::stage(Stage::CheckCache);
        let check = if cached.is_some() {
            debug!("Cache hit for {} ({})", symbol, market);
            check.with_message(CACHE_HIT_MESSAGE)
        } else {
            check
        };
        self.advance(job_id, check).await;

        // Cached data was cleaned when it was collected; the collect stages
        // pass straight through for it.
        self.advance(job_id, JobUpdate::stage(Stage::CollectBasic)).await;
        let (mut data, fresh) = match cached {
            Some(data) => (data, false),
            None => (self.collect(symbol, market).await?, true),
        };

        self.advance(job_id, JobUpdate::stage(Stage::CollectKline)).await;
        if fresh {
            let dropped = normalize_kline(&mut data.kline);
            if dropped > 0 {
                debug!("Dropped {} malformed or duplicate bars for {}", dropped, symbol);
            }
        }

        self.advance(job_id, JobUpdate::stage(Stage::CollectFinancial)).await;
        if fresh {
            sanitize_financial(&mut data.financial);
        }

        self.advance(job_id, JobUpdate::stage(Stage::CollectNews)).await;
        if fresh {
            sentiment::annotate(&mut data.news);
            self.cache.insert(symbol, market, data.clone()).await;
        }

        self.advance(job_id, JobUpdate::stage(Stage::CalculateTechnical)).await;
        let technical = indicators::compute(&data.kline);
        let ctx = Arc::new(StockContext::new(symbol, market, data, technical));

        let roles = self.fan_out(job_id, &ctx).await;

        self.advance(job_id, JobUpdate::stage(Stage::Synthesize)).await;
        let results: Vec<AnalystResult> = roles.iter().map(|o| o.result.clone()).collect();
        let synthesis = self.runner.synthesize(&ctx, &results).await;

        let default_model = self
            .runner
            .gateway()
            .active_candidate()
            .map_or("unknown", |c| c.model.as_str());
        let report = assemble_report(&ReportInputs {
            context: &ctx,
            roles: &roles,
            synthesis: Some(&synthesis),
            default_model,
            elapsed: started.elapsed(),
        });

        self.advance(job_id, JobUpdate::stage(Stage::SaveResult)).await;
        if let Some(sink) = &self.sink {
            if let Err(e) = sink.save(&report).await {
                warn!("Report sink failed for job {}: {}", job_id, e);
            }
        }
        Ok(report)
    }

    /// Market data for a symbol outside any job, served from the cache when fresh
    pub async fn collect_data(&self, symbol: &str, market: Market) -> Result<MarketData> {
        let symbol = normalize_symbol(symbol)?;
        if let Some(data) = self.cache.get(&symbol, market).await {
            debug!("Cache hit for {} ({})", symbol, market);
            return Ok(data);
        }
        let mut data = self.collect(&symbol, market).await?;
        normalize_kline(&mut data.kline);
        sanitize_financial(&mut data.financial);
        sentiment::annotate(&mut data.news);
        self.cache.insert(&symbol, market, data.clone()).await;
        Ok(data)
    }

    /// Single provider call, bounded by the collect timeout
    async fn collect(&self, symbol: &str, market: Market) -> Result<MarketData> {
        let timeout = self.config.collect_timeout;
        let data = tokio::time::timeout(timeout, self.data.collect(symbol, market))
            .await
            .map_err(|_| DataError::Timeout(timeout))??;
        debug!(
            "Collected {} bars and {} headlines for {} from {}",
            data.kline.len(),
            data.news.len(),
            symbol,
            self.data.name()
        );
        Ok(data)
    }

    /// Run the six independent roles and wait for every one of them
    ///
    /// Stages advance by completion count, so progress stays monotonic
    /// whichever role finishes first. Outcomes come back in role order.
    async fn fan_out(&self, job_id: &str, ctx: &Arc<StockContext>) -> Vec<RoleOutcome> {
        let roles = AnalystRole::INDEPENDENT;
        self.advance(job_id, JobUpdate::stage(Stage::for_role(roles[0]))).await;

        let permits = Arc::new(Semaphore::new(self.config.concurrency));
        let mut tasks = JoinSet::new();
        for role in roles {
            let runner = Arc::clone(&self.runner);
            let ctx = Arc::clone(ctx);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                runner.run(role, &ctx).await
            });
        }

        let mut outcomes: Vec<RoleOutcome> = Vec::with_capacity(roles.len());
        let mut finished = 0;
        while let Some(joined) = tasks.join_next().await {
            finished += 1;
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!("Analyst task aborted in job {}: {}", job_id, e),
            }
            if let Some(&next) = roles.get(finished) {
                self.advance(job_id, JobUpdate::stage(Stage::for_role(next))).await;
            }
        }

        roles
            .into_iter()
            .map(|role| {
                outcomes
                    .iter()
                    .position(|o| o.result.role == role)
                    .map_or_else(
                        || RoleOutcome::degraded(role, ABORTED),
                        |i| outcomes.swap_remove(i),
                    )
            })
            .collect()
    }

    async fn advance(&self, job_id: &str, update: JobUpdate) {
        match self.store.update(job_id, update).await {
            Ok(true) => {}
            Ok(false) => debug!("Job {} not updated (absent or terminal)", job_id),
            Err(e) => warn!("Progress update for job {} failed: {}", job_id, e),
        }
    }
}

fn normalize_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(DataError::InvalidSymbol(symbol).into());
    }
    Ok(symbol)
}
