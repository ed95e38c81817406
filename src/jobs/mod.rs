//! Scheduled cleanup of ephemeral data.
//!
//! Retention policies register on a [`CleanupJob`]; each run executes every
//! policy once. With no policies registered a run only logs completion.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::LocalCache;

/// One retention rule. Returns how many items it purged.
#[async_trait]
pub trait RetentionPolicy: Send + Sync {
    async fn purge(&self) -> Result<usize>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub policies_run: usize,
    pub policies_failed: usize,
    pub purged: usize,
}

#[derive(Clone, Default)]
pub struct CleanupJob {
    policies: Vec<Arc<dyn RetentionPolicy>>,
}

impl CleanupJob {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, policy: Arc<dyn RetentionPolicy>) {
        info!("Cleanup policy registered: {}", policy.name());
        self.policies.push(policy);
    }

    pub fn policy_count(&self) -> usize {
        self.policies.len()
    }

    /// Run every policy once; a failing policy does not stop the rest.
    pub async fn run_once(&self) -> CleanupReport {
        let mut report = CleanupReport::default();
        for policy in &self.policies {
            report.policies_run += 1;
            match policy.purge().await {
                Ok(n) => report.purged += n,
                Err(e) => {
                    report.policies_failed += 1;
                    warn!("Cleanup policy '{}' failed: {:#}", policy.name(), e);
                }
            }
        }
        info!(
            "Cleanup complete: {} policies, {} purged, {} failed",
            report.policies_run, report.purged, report.policies_failed
        );
        report
    }

    /// Run on a fixed period until the task is aborted.
    pub fn spawn(self, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                self.run_once().await;
            }
        })
    }
}

/// Sweeps local-tier cache entries whose TTL elapsed without a read.
pub struct ExpiredCacheEntries {
    cache: LocalCache,
}

impl ExpiredCacheEntries {
    pub fn new(cache: LocalCache) -> Self {
        ExpiredCacheEntries { cache }
    }
}

#[async_trait]
impl RetentionPolicy for ExpiredCacheEntries {
    fn name(&self) -> &str {
        "expired-local-cache-entries"
    }

    async fn purge(&self) -> Result<usize> {
        let purged = self.cache.evict_expired().await;
        debug!("Local cache holds {} entries after sweep", self.cache.len().await);
        Ok(purged)
    }
}
