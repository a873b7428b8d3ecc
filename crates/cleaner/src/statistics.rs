// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! Cached aggregate statistics over the question bank.

use qbc_data_model::{Statistics, StatisticsSnapshot, TableStats};
use qbc_storage::{QuestionScope, RepositoryError};

use crate::{Cleaner, CleanerError, UsageIndex};

/// Tables shown on the detailed statistics view, with their display
/// labels
const DETAILED_TABLES: [(&str, &str); 6] = [
    ("question", "Questions"),
    ("question_answers", "Answers"),
    ("question_versions", "Question versions"),
    ("question_bank_entries", "Bank entries"),
    ("question_categories", "Categories"),
    ("question_references", "Quiz references"),
];

/// An aggregate count is informational, so a failing query degrades to
/// zero instead of failing the whole snapshot
fn or_zero(result: Result<usize, RepositoryError>, what: &'static str) -> usize {
    match result {
        Ok(count) => count,
        Err(e) => {
            tracing::warn!(
                error = &e as &dyn std::error::Error,
                statistic = what,
                "failed to compute statistic, reporting zero",
            );
            0
        }
    }
}

impl Cleaner {
    /// Get the overview statistics, from cache when fresh enough.
    ///
    /// `force_refresh` bypasses the cache. The refresh runs one
    /// aggregate query per counter with a small pause in between, so
    /// it can take a moment on a large bank.
    #[tracing::instrument(name = "cleaner.statistics", skip(self), err)]
    pub async fn statistics(
        &self,
        force_refresh: bool,
    ) -> Result<StatisticsSnapshot, CleanerError> {
        let now = self.clock().now();

        if !force_refresh
            && let Some(snapshot) = self.cache().get().await
            && snapshot.is_fresh(now, self.options().statistics_max_age)
        {
            return Ok(snapshot);
        }

        let throttle = self.options().throttle;
        let mut repo = self.factory().create().await?;
        let usage = UsageIndex::load(&mut repo).await?;

        let total_questions = or_zero(
            repo.stats().count_top_level_questions().await,
            "total_questions",
        );
        tokio::time::sleep(throttle).await;

        let duplicated_questions = or_zero(
            repo.stats().count_duplicated_questions().await,
            "duplicated_questions",
        );
        tokio::time::sleep(throttle).await;

        let unused_questions = or_zero(
            repo.question()
                .count_unused(usage.entries(), QuestionScope::new())
                .await,
            "unused_questions",
        );
        tokio::time::sleep(throttle).await;

        let orphaned_answers = or_zero(repo.answer().count_orphaned().await, "orphaned_answers");
        tokio::time::sleep(throttle).await;

        let unused_question_answers = or_zero(
            repo.answer().count_unused(usage.entries()).await,
            "unused_question_answers",
        );

        // Read-only unit of work; roll it back either way
        if let Err(e) = repo.cancel().await {
            tracing::warn!(
                error = &e as &dyn std::error::Error,
                "failed to close statistics unit of work",
            );
        }

        let snapshot = StatisticsSnapshot {
            statistics: Statistics {
                total_questions,
                duplicated_questions,
                unused_questions,
                orphaned_answers,
                unused_question_answers,
            },
            taken_at: now,
        };
        self.cache().set(snapshot).await;

        Ok(snapshot)
    }

    /// Row counts of the question-related tables, for the detailed
    /// statistics view. Tables absent from the store are skipped.
    #[tracing::instrument(name = "cleaner.detailed_statistics", skip(self), err)]
    pub async fn detailed_statistics(&self) -> Result<Vec<TableStats>, CleanerError> {
        let throttle = self.options().throttle;
        let mut repo = self.factory().create().await?;

        let mut stats = Vec::with_capacity(DETAILED_TABLES.len());
        for (i, (table, label)) in DETAILED_TABLES.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(throttle).await;
            }
            if let Some(rows) = repo.stats().table_rows(table).await? {
                stats.push(TableStats {
                    table: (*table).to_owned(),
                    label: (*label).to_owned(),
                    rows,
                });
            }
        }
        repo.save().await?;

        Ok(stats)
    }

    /// Drop the cached statistics snapshot; the next read recomputes
    /// it
    pub async fn invalidate_statistics(&self) {
        self.cache().clear().await;
    }
}
