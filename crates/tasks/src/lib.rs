// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

#![deny(missing_docs)]

//! The unattended cleanup pass.
//!
//! Scheduling is the caller's concern: this crate only knows how to
//! run one pass when invoked, by cron, a systemd timer or the `qbc
//! cleanup` command. Each pass deletes at most one batch per cleanup
//! kind, so an oversized backlog is worked off across invocations
//! instead of holding the database for hours.
//!
//! Duplicate deletion is deliberately left to interactive sessions;
//! picking which member of a duplicate group survives is a call an
//! administrator should stay in the loop for.

use qbc_cleaner::{Cleaner, CleanerError};
use qbc_config::CleanupConfig;
use qbc_data_model::{CleanupType, DeletionReport};
use tracing::{debug, info};

/// The cleanup kinds one unattended pass works through, in dependency
/// order: deleting unused questions first means their answers never
/// show up as unused afterwards
const PASS_KINDS: [CleanupType; 3] = [
    CleanupType::UnusedQuestions,
    CleanupType::OrphanedAnswers,
    CleanupType::UnusedAnswers,
];

/// A single unattended cleanup pass over the question bank
pub struct CleanupTask {
    cleaner: Cleaner,
    config: CleanupConfig,
}

impl CleanupTask {
    /// Create the task from the shared engine and the cleanup
    /// configuration
    #[must_use]
    pub fn new(cleaner: Cleaner, config: CleanupConfig) -> Self {
        Self { cleaner, config }
    }

    /// Run one pass: a single batch each of unused questions, orphaned
    /// answers and unused answers.
    ///
    /// Does nothing unless `auto_cleanup` is enabled. Chunk failures
    /// are already isolated by the engine, so the pass keeps going and
    /// reports them in the merged [`DeletionReport`].
    #[tracing::instrument(name = "task.cleanup_question_bank", skip_all)]
    pub async fn run(&self) -> Result<DeletionReport, CleanerError> {
        if !self.config.auto_cleanup {
            debug!("auto cleanup is disabled, skipping");
            return Ok(DeletionReport::new());
        }

        let mut total = DeletionReport::new();
        for kind in PASS_KINDS {
            let report = self
                .cleaner
                .run_single_batch(kind, self.config.batch_size)
                .await?;

            if report.deleted == 0 && report.failed == 0 {
                debug!(cleanup.kind = %kind, "nothing to clean up");
            } else {
                info!(
                    cleanup.kind = %kind,
                    cleanup.deleted = report.deleted,
                    cleanup.failed = report.failed,
                    "cleaned up question bank content",
                );
            }

            total.merge(report);
        }

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use qbc_cleaner::{
        CleanerOptions,
        mock::{MockData, MockRepositoryFactory},
    };
    use qbc_data_model::MockClock;
    use qbc_storage::{InMemorySessionStore, InMemoryStatisticsCache};

    use super::*;

    fn task(factory: &MockRepositoryFactory, auto_cleanup: bool) -> CleanupTask {
        let cleaner = Cleaner::new(
            Arc::new(factory.clone()),
            Arc::new(MockClock::default()),
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemoryStatisticsCache::new()),
            CleanerOptions {
                throttle: std::time::Duration::ZERO,
                ..CleanerOptions::default()
            },
        );
        CleanupTask::new(
            cleaner,
            CleanupConfig {
                auto_cleanup,
                ..CleanupConfig::default()
            },
        )
    }

    fn bank() -> MockData {
        let mut data = MockData::new();
        data.add_question(1, "Used", "truefalse", "kept");
        data.add_question(2, "Unused", "truefalse", "goes away");
        data.add_quiz_reference(1);
        data.add_answer(10, 1, "True");
        data.add_answer(20, 2, "True");
        // Question 99 no longer exists
        data.add_answer(30, 99, "Stale");
        data
    }

    #[tokio::test]
    async fn disabled_task_does_nothing() {
        let factory = MockRepositoryFactory::new(bank());

        let report = task(&factory, false).run().await.unwrap();
        assert_eq!(report, DeletionReport::new());
        assert_eq!(factory.snapshot().questions.len(), 2);
        assert_eq!(factory.snapshot().answers.len(), 3);
    }

    #[tokio::test]
    async fn one_pass_cleans_all_kinds() {
        let factory = MockRepositoryFactory::new(bank());

        let report = task(&factory, true).run().await.unwrap();
        // Question 2 (its answer goes with it, uncounted) plus the
        // orphan
        assert_eq!(report.deleted, 2);
        assert_eq!(report.failed, 0);

        let data = factory.snapshot();
        let questions: Vec<i64> = data.questions.keys().copied().collect();
        assert_eq!(questions, vec![1]);
        let answers: Vec<i64> = data.answers.keys().copied().collect();
        assert_eq!(answers, vec![10]);
    }
}
