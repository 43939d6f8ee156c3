//! In-process job store
//!
//! Used when Redis is not configured or not reachable. Expiry is checked on
//! access and swept on every create.

use crate::{JobStore, Result, StoreConfig};
use analyst_core::{AnalysisReport, Job, JobUpdate};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

struct Entry {
    job: Job,
    expires_at: Instant,
    /// Insertion order, oldest lowest
    seq: u64,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Thread-safe in-memory [`JobStore`]
#[derive(Clone)]
pub struct MemoryJobStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    next_seq: Arc<AtomicU64>,
    config: StoreConfig,
}

impl MemoryJobStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            next_seq: Arc::new(AtomicU64::new(0)),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Number of live jobs
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.values().filter(|e| !e.is_expired(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Run `apply` on a live, non-terminal job and refresh its TTL
    async fn modify<F>(&self, id: &str, apply: F) -> bool
    where
        F: FnOnce(&mut Job) -> bool,
    {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        let Some(entry) = entries.get_mut(id) else {
            return false;
        };
        if entry.is_expired(now) {
            entries.remove(id);
            return false;
        }
        if entry.job.status.is_terminal() || !apply(&mut entry.job) {
            return false;
        }
        entry.expires_at = now + self.config.ttl;
        true
    }

    fn sweep(entries: &mut HashMap<String, Entry>, now: Instant) -> usize {
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        before - entries.len()
    }
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, job: Job) -> Result<()> {
        let now = Instant::now();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.entries.write().await;

        Self::sweep(&mut entries, now);
        entries.insert(
            job.id.clone(),
            Entry {
                job,
                expires_at: now + self.config.ttl,
                seq,
            },
        );

        if entries.len() > self.config.max_jobs {
            let mut by_age: Vec<(u64, String)> =
                entries.iter().map(|(id, e)| (e.seq, id.clone())).collect();
            by_age.sort_unstable();
            let excess = entries.len() - self.config.max_jobs;
            for (_, id) in by_age.into_iter().take(excess) {
                debug!("Evicting job {} over the cap", id);
                entries.remove(&id);
            }
        }
        Ok(())
    }

    async fn update(&self, id: &str, update: JobUpdate) -> Result<bool> {
        Ok(self.modify(id, |job| job.apply(&update)).await)
    }

    async fn complete(&self, id: &str, report: AnalysisReport) -> Result<bool> {
        Ok(self
            .modify(id, |job| {
                job.complete(report);
                true
            })
            .await)
    }

    async fn fail(&self, id: &str, error: &str) -> Result<bool> {
        Ok(self
            .modify(id, |job| {
                job.fail(error);
                true
            })
            .await)
    }

    async fn get(&self, id: &str) -> Result<Option<Job>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(id) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.job.clone())),
                Some(_) => {}
            }
        }
        self.entries.write().await.remove(id);
        Ok(None)
    }

    async fn list_all(&self) -> Result<Vec<Job>> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        let mut live: Vec<&Entry> = entries.values().filter(|e| !e.is_expired(now)).collect();
        live.sort_unstable_by(|a, b| b.seq.cmp(&a.seq));
        Ok(live.into_iter().map(|e| e.job.clone()).collect())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.entries.write().await.remove(id).is_some())
    }

    async fn cleanup_expired(&self) -> Result<usize> {
        let mut entries = self.entries.write().await;
        Ok(Self::sweep(&mut entries, Instant::now()))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
