// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! The cleanup engine.
//!
//! A [`Cleaner`] classifies question bank content into unused,
//! duplicate and orphaned candidates, and deletes candidates in
//! batches. Classification results are advisory: nothing is ever
//! deleted based on a stale list. Immediately before each deletion the
//! engine re-reads the usage references and drops any candidate that
//! became used, or stopped being a duplicate surplus or an orphan, in
//! the meantime.
//!
//! Deletion happens in bounded chunks, each in its own storage unit of
//! work. A failing chunk is rolled back, recorded in the
//! [`DeletionReport`] and processing moves on to the next chunk, so a
//! single bad row cannot wedge a whole run.

use std::{sync::Arc, time::Duration};

use qbc_data_model::{Clock, DEFAULT_BATCH_SIZE};
use qbc_storage::{RepositoryError, RepositoryFactory, SessionStore, StatisticsCache};
use thiserror::Error;

pub mod classifier;
pub mod deleter;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod session;
pub mod statistics;
#[cfg(test)]
mod tests;
pub mod usage;
pub mod verifier;

pub use self::{
    session::{BatchReport, SessionStatus, StartReport},
    usage::UsageIndex,
};

/// Error returned by the cleanup engine
#[derive(Debug, Error)]
pub enum CleanerError {
    /// Error from the storage backend
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Tunables of the [`Cleaner`]
#[derive(Debug, Clone)]
pub struct CleanerOptions {
    /// Batch size used when the caller does not specify one
    pub batch_size: usize,

    /// Pause between the aggregate queries of a statistics refresh, to
    /// avoid hammering a production database
    pub throttle: Duration,

    /// How long a cached statistics snapshot stays valid
    pub statistics_max_age: chrono::Duration,
}

impl Default for CleanerOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            throttle: Duration::from_millis(100),
            statistics_max_age: chrono::Duration::hours(1),
        }
    }
}

/// The cleanup engine. Cheap to clone, shared across HTTP handlers
/// and the unattended task.
#[derive(Clone)]
pub struct Cleaner {
    factory: Arc<dyn RepositoryFactory>,
    clock: Arc<dyn Clock>,
    session_store: Arc<dyn SessionStore>,
    cache: Arc<dyn StatisticsCache>,
    options: CleanerOptions,
}

impl Cleaner {
    /// Assemble a cleaner from its collaborators
    #[must_use]
    pub fn new(
        factory: Arc<dyn RepositoryFactory>,
        clock: Arc<dyn Clock>,
        session_store: Arc<dyn SessionStore>,
        cache: Arc<dyn StatisticsCache>,
        options: CleanerOptions,
    ) -> Self {
        Self {
            factory,
            clock,
            session_store,
            cache,
            options,
        }
    }

    pub(crate) fn factory(&self) -> &dyn RepositoryFactory {
        self.factory.as_ref()
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub(crate) fn session_store(&self) -> &dyn SessionStore {
        self.session_store.as_ref()
    }

    pub(crate) fn cache(&self) -> &dyn StatisticsCache {
        self.cache.as_ref()
    }

    pub(crate) fn options(&self) -> &CleanerOptions {
        &self.options
    }

    /// The configured default batch size
    #[must_use]
    pub fn default_batch_size(&self) -> usize {
        self.options.batch_size
    }

    /// Check that the storage backend is reachable by opening and
    /// discarding one unit of work
    pub async fn ping(&self) -> Result<(), CleanerError> {
        let repo = self.factory().create().await?;
        repo.cancel().await?;
        Ok(())
    }
}

impl std::fmt::Debug for Cleaner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cleaner")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
