//! Persistence writer
//!
//! Merges a crawl's items into the store one at a time, in the order given.
//! There is no transaction around the batch: a failing write stops the batch
//! and items written before it stay written.

use crate::feedback::FeedbackItem;
use crate::storage::{FeedbackStore, StorageResult, UpsertOutcome};

/// Counts of what a persist call did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistOutcome {
    pub inserted: usize,
    pub updated: usize,
}

impl PersistOutcome {
    /// Number of items written
    pub fn total(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Owns the store handle for one crawl invocation
pub struct PersistenceWriter<S: FeedbackStore> {
    store: S,
}

impl<S: FeedbackStore> PersistenceWriter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Upserts every item under `company_id`, sequentially
    ///
    /// # Returns
    ///
    /// * `Ok(PersistOutcome)` - All items written
    /// * `Err(StorageError)` - The first failing write; later items are not attempted
    pub fn persist(
        &mut self,
        company_id: &str,
        items: &[FeedbackItem],
    ) -> StorageResult<PersistOutcome> {
        let mut outcome = PersistOutcome::default();

        for item in items {
            match self.store.upsert_feedback(company_id, item)? {
                UpsertOutcome::Inserted => outcome.inserted += 1,
                UpsertOutcome::Updated => outcome.updated += 1,
            }
        }

        tracing::info!(
            "Saved {} item(s) for '{}' ({} new, {} updated)",
            outcome.total(),
            company_id,
            outcome.inserted,
            outcome.updated
        );

        Ok(outcome)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
