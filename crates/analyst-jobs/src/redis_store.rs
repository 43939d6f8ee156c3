//! Redis-backed job store
//!
//! Each job is a hash under `stock_analysis:task:{id}`; a sorted set scored by
//! creation time indexes live ids for listing and cap eviction. Conditional
//! writes run as Lua scripts so a check-then-write on one id is atomic.

use crate::{JobStore, JobStoreError, Result, StoreConfig};
use analyst_core::{AnalysisReport, Job, JobStatus, JobUpdate, Market, Stage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Prefix of every job hash key
pub const KEY_PREFIX: &str = "stock_analysis:task:";

/// Applies field/value pairs when the job exists and is not terminal
///
/// Progress only moves forward, except on the write that fails the job.
///
/// KEYS[1] job hash; ARGV[1] ttl seconds; ARGV[2..] field, value pairs
static CONDITIONAL_WRITE: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return 0
end
local status = redis.call('HGET', KEYS[1], 'status')
if status == 'completed' or status == 'failed' then
    return 0
end
local failing = false
for i = 2, #ARGV, 2 do
    if ARGV[i] == 'status' and ARGV[i + 1] == 'failed' then
        failing = true
    end
end
local current = tonumber(redis.call('HGET', KEYS[1], 'progress') or '0') or 0
for i = 2, #ARGV, 2 do
    local value = ARGV[i + 1]
    if ARGV[i] == 'progress' and not failing and (tonumber(value) or 0) < current then
        value = tostring(current)
    end
    redis.call('HSET', KEYS[1], ARGV[i], value)
end
redis.call('EXPIRE', KEYS[1], ARGV[1])
return 1
",
    )
});

/// Connection settings for [`RedisJobStore`]
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    pub url: String,
    /// Budget for the initial connection and PING
    pub connect_timeout: Duration,
    pub store: StoreConfig,
}

impl RedisStoreConfig {
    pub fn new(url: impl Into<String>, store: StoreConfig) -> Self {
        Self {
            url: url.into(),
            connect_timeout: Duration::from_secs(5),
            store,
        }
    }
}

/// [`JobStore`] shared across service instances through Redis
#[derive(Clone)]
pub struct RedisJobStore {
    conn: ConnectionManager,
    config: StoreConfig,
}

impl RedisJobStore {
    /// Connect and verify the server answers PING
    pub async fn connect(config: RedisStoreConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())?;

        let mut conn = tokio::time::timeout(config.connect_timeout, client.get_connection_manager())
            .await
            .map_err(|_| {
                JobStoreError::Unavailable(format!(
                    "no connection to {} within {:?}",
                    config.url, config.connect_timeout
                ))
            })??;

        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong != "PONG" {
            return Err(JobStoreError::Unavailable(format!("unexpected PING reply '{pong}'")));
        }

        info!("Connected to Redis job store at {}", config.url);
        Ok(Self {
            conn,
            config: config.store,
        })
    }

    fn key(id: &str) -> String {
        format!("{KEY_PREFIX}{id}")
    }

    fn index_key() -> String {
        format!("{KEY_PREFIX}ids")
    }

    fn ttl_secs(&self) -> i64 {
        self.config.ttl.as_secs().max(1) as i64
    }

    async fn conditional_write(&self, id: &str, fields: Vec<(&'static str, String)>) -> Result<bool> {
        let mut conn = self.conn.clone();
        let mut invocation = CONDITIONAL_WRITE.prepare_invoke();
        invocation.key(Self::key(id)).arg(self.ttl_secs());
        for (field, value) in fields {
            invocation.arg(field).arg(value);
        }
        let applied: i64 = invocation.invoke_async(&mut conn).await?;
        Ok(applied == 1)
    }

    /// Drop the oldest ids beyond the cap
    async fn enforce_cap(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let index = Self::index_key();
        let count: usize = conn.zcard(&index).await?;
        if count <= self.config.max_jobs {
            return Ok(());
        }

        let excess = (count - self.config.max_jobs) as isize;
        let oldest: Vec<String> = conn.zrange(&index, 0, excess - 1).await?;
        if oldest.is_empty() {
            return Ok(());
        }
        debug!("Evicting {} jobs over the cap", oldest.len());

        let keys: Vec<String> = oldest.iter().map(|id| Self::key(id)).collect();
        let _: () = redis::pipe()
            .atomic()
            .del(&keys)
            .ignore()
            .zrem(&index, &oldest)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl JobStore for RedisJobStore {
    async fn create(&self, job: Job) -> Result<()> {
        let mut conn = self.conn.clone();
        let key = Self::key(&job.id);
        let score = job.created_at.timestamp_millis();
        let fields = encode_job(&job)?;

        let _: () = redis::pipe()
            .atomic()
            .hset_multiple(&key, &fields)
            .ignore()
            .expire(&key, self.ttl_secs())
            .ignore()
            .zadd(Self::index_key(), &job.id, score)
            .ignore()
            .query_async(&mut conn)
            .await?;

        self.enforce_cap().await
    }

    async fn update(&self, id: &str, update: JobUpdate) -> Result<bool> {
        self.conditional_write(id, encode_update(&update, Utc::now())).await
    }

    async fn complete(&self, id: &str, report: AnalysisReport) -> Result<bool> {
        let result = serde_json::to_string(&report)?;
        let fields = vec![
            ("status", JobStatus::Completed.as_str().to_string()),
            ("stage", Stage::Complete.as_str().to_string()),
            ("progress", Stage::Complete.progress().to_string()),
            ("message", Stage::Complete.default_message().to_string()),
            ("result", result),
            ("error", String::new()),
            ("updated_at", Utc::now().to_rfc3339()),
        ];
        self.conditional_write(id, fields).await
    }

    async fn fail(&self, id: &str, error: &str) -> Result<bool> {
        let fields = vec![
            ("status", JobStatus::Failed.as_str().to_string()),
            ("stage", Stage::Error.as_str().to_string()),
            ("progress", Stage::Error.progress().to_string()),
            ("message", format!("错误: {error}")),
            ("error", error.to_string()),
            ("updated_at", Utc::now().to_rfc3339()),
        ];
        self.conditional_write(id, fields).await
    }

    async fn get(&self, id: &str) -> Result<Option<Job>> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn.hgetall(Self::key(id)).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        decode_job(id, &fields).map(Some)
    }

    async fn list_all(&self) -> Result<Vec<Job>> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn.zrevrange(Self::index_key(), 0, -1).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for id in &ids {
            pipe.hgetall(Self::key(id));
        }
        let records: Vec<HashMap<String, String>> = pipe.query_async(&mut conn).await?;

        let mut jobs = Vec::with_capacity(ids.len());
        for (id, fields) in ids.iter().zip(records) {
            if fields.is_empty() {
                continue;
            }
            match decode_job(id, &fields) {
                Ok(job) => jobs.push(job),
                Err(e) => warn!("Skipping unreadable job {}: {}", id, e),
            }
        }
        Ok(jobs)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let (deleted, _): (i64, i64) = redis::pipe()
            .atomic()
            .del(Self::key(id))
            .zrem(Self::index_key(), id)
            .query_async(&mut conn)
            .await?;
        Ok(deleted > 0)
    }

    async fn cleanup_expired(&self) -> Result<usize> {
        let mut conn = self.conn.clone();
        let index = Self::index_key();
        let ids: Vec<String> = conn.zrange(&index, 0, -1).await?;
        if ids.is_empty() {
            return Ok(0);
        }

        let mut pipe = redis::pipe();
        for id in &ids {
            pipe.exists(Self::key(id));
        }
        let present: Vec<bool> = pipe.query_async(&mut conn).await?;

        let stale: Vec<&String> = ids
            .iter()
            .zip(present)
            .filter_map(|(id, exists)| (!exists).then_some(id))
            .collect();
        if stale.is_empty() {
            return Ok(0);
        }

        let _: i64 = conn.zrem(&index, &stale).await?;
        debug!("Pruned {} expired job ids", stale.len());
        Ok(stale.len())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn ping(&self) -> bool {
        let mut conn = self.conn.clone();
        let reply: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
        matches!(reply, Ok(pong) if pong == "PONG")
    }
}

/// Flatten a job into hash fields
pub(crate) fn encode_job(job: &Job) -> Result<Vec<(&'static str, String)>> {
    let result = match &job.result {
        Some(report) => serde_json::to_string(report)?,
        None => String::new(),
    };
    Ok(vec![
        ("id", job.id.clone()),
        ("symbol", job.symbol.clone()),
        ("market", job.market.code().to_string()),
        ("status", job.status.as_str().to_string()),
        ("stage", job.stage.as_str().to_string()),
        ("progress", job.progress.to_string()),
        ("message", job.message.clone()),
        ("result", result),
        ("error", job.error.clone().unwrap_or_default()),
        ("created_at", job.created_at.to_rfc3339()),
        ("updated_at", job.updated_at.to_rfc3339()),
    ])
}

/// Hash fields touched by a partial update
pub(crate) fn encode_update(update: &JobUpdate, now: DateTime<Utc>) -> Vec<(&'static str, String)> {
    let mut fields = Vec::with_capacity(5);
    if let Some(status) = update.status {
        fields.push(("status", status.as_str().to_string()));
    }
    if let Some(stage) = update.stage {
        fields.push(("stage", stage.as_str().to_string()));
    }
    if let Some(progress) = update.progress {
        fields.push(("progress", progress.clamp(0, 100).to_string()));
    }
    if let Some(message) = &update.message {
        fields.push(("message", message.clone()));
    }
    fields.push(("updated_at", now.to_rfc3339()));
    fields
}

fn invalid(id: &str, detail: impl Into<String>) -> JobStoreError {
    JobStoreError::InvalidRecord {
        id: id.to_string(),
        detail: detail.into(),
    }
}

fn required<'a>(fields: &'a HashMap<String, String>, id: &str, name: &str) -> Result<&'a str> {
    fields
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| invalid(id, format!("missing field '{name}'")))
}

fn parsed<T>(fields: &HashMap<String, String>, id: &str, name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = required(fields, id, name)?;
    raw.parse()
        .map_err(|e| invalid(id, format!("bad {name} '{raw}': {e}")))
}

fn timestamp(fields: &HashMap<String, String>, id: &str, name: &str) -> Result<DateTime<Utc>> {
    let raw = required(fields, id, name)?;
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| invalid(id, format!("bad {name} '{raw}': {e}")))
}

/// Rebuild a job from its hash fields
pub(crate) fn decode_job(id: &str, fields: &HashMap<String, String>) -> Result<Job> {
    let result = match fields.get("result").map(String::as_str) {
        None | Some("") => None,
        Some(raw) => Some(serde_json::from_str::<AnalysisReport>(raw)?),
    };

    Ok(Job {
        id: fields.get("id").cloned().unwrap_or_else(|| id.to_string()),
        symbol: required(fields, id, "symbol")?.to_string(),
        market: parsed::<Market>(fields, id, "market")?,
        status: parsed::<JobStatus>(fields, id, "status")?,
        stage: parsed::<Stage>(fields, id, "stage")?,
        progress: parsed::<i32>(fields, id, "progress")?,
        message: fields.get("message").cloned().unwrap_or_default(),
        result,
        error: fields.get("error").filter(|e| !e.is_empty()).cloned(),
        created_at: timestamp(fields, id, "created_at")?,
        updated_at: timestamp(fields, id, "updated_at")?,
    })
}
