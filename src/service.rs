//! Crawl service
//!
//! Entry point for callers that want a crawl of one company. The service
//! bounds how many browser sessions are alive at once, optionally runs crawls
//! of the same slug one after another, and records every invocation in the
//! `crawl_runs` table.
//!
//! Each crawl opens its own storage handle; nothing is shared between
//! invocations except the session slots.

use crate::config::{AdmissionPolicy, Config};
use crate::crawler::{CrawlSummary, Orchestrator};
use crate::session::{launcher_for, SessionLauncher};
use crate::storage::{FeedbackStore, PersistenceWriter, SqliteStorage};
use crate::HarvestError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};

/// Bounded pool of crawl slots in front of the orchestrator
pub struct CrawlService {
    config: Arc<Config>,
    config_hash: String,
    orchestrator: Orchestrator,
    slots: Arc<Semaphore>,
    limit: usize,
    slug_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CrawlService {
    /// Creates a service using the engine named in the configuration
    pub fn new(config: Config, config_hash: impl Into<String>) -> Self {
        let launcher = launcher_for(&config.browser);
        Self::with_launcher(config, config_hash, launcher)
    }

    /// Creates a service over an explicit session launcher
    pub fn with_launcher(
        config: Config,
        config_hash: impl Into<String>,
        launcher: Arc<dyn SessionLauncher>,
    ) -> Self {
        let limit = config.service.max_concurrent_crawls as usize;
        let orchestrator = Orchestrator::new(launcher, config.site.root_url.clone());

        Self {
            config: Arc::new(config),
            config_hash: config_hash.into(),
            orchestrator,
            slots: Arc::new(Semaphore::new(limit)),
            limit,
            slug_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Number of crawl slots currently free
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Crawls one company and persists its feedback
    ///
    /// # Flow
    ///
    /// 1. Wait for the slug's lock when per-slug locking is on
    /// 2. Take a session slot, waiting or failing with `Busy` per admission policy
    /// 3. Open a storage handle and record a `running` crawl run
    /// 4. Run the orchestrator
    /// 5. Mark the run `completed` with its total, or `failed` with the fault
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - Items found, in reverse encounter order
    /// * `Err(HarvestError)` - No slot free, or the crawl failed
    pub async fn crawl(&self, slug: &str) -> crate::Result<CrawlSummary> {
        if !self.config.service.per_slug_lock {
            return self.crawl_admitted(slug).await;
        }

        let lock = self.acquire_slug_lock(slug).await;
        let result = {
            let _guard = lock.lock().await;
            self.crawl_admitted(slug).await
        };
        self.release_slug_lock(slug, lock).await;

        result
    }

    async fn crawl_admitted(&self, slug: &str) -> crate::Result<CrawlSummary> {
        let _permit = match self.config.service.admission {
            AdmissionPolicy::Queue => self
                .slots
                .acquire()
                .await
                .map_err(|_| HarvestError::Busy { limit: self.limit })?,
            AdmissionPolicy::Reject => self.slots.try_acquire().map_err(|_| {
                tracing::warn!("Rejecting crawl of '{}': all {} slots busy", slug, self.limit);
                HarvestError::Busy { limit: self.limit }
            })?,
        };

        let mut store = SqliteStorage::open(&self.config.storage)?;
        let run_id = store.create_run(slug, &self.config_hash)?;
        tracing::info!("Starting crawl run {} for '{}'", run_id, slug);

        let mut writer = PersistenceWriter::new(store);
        let outcome = self.orchestrator.run(slug, &mut writer).await;
        let mut store = writer.into_store();

        match outcome {
            Ok(summary) => {
                store.complete_run(run_id, summary.total as u64)?;
                Ok(summary)
            }
            Err(e) => {
                if let Err(record_err) = store.fail_run(run_id, &e.to_string()) {
                    tracing::warn!("Failed to record failure of run {}: {}", run_id, record_err);
                }
                Err(e)
            }
        }
    }

    async fn acquire_slug_lock(&self, slug: &str) -> Arc<Mutex<()>> {
        let mut locks = self.slug_locks.lock().await;
        Arc::clone(locks.entry(slug.to_string()).or_default())
    }

    /// Drops the caller's handle and forgets the slug once nobody else holds it
    async fn release_slug_lock(&self, slug: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.slug_locks.lock().await;
        drop(lock);
        if locks
            .get(slug)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(slug);
        }
    }
}
