// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! Repository computing aggregate counts for the statistics view.

use async_trait::async_trait;

use crate::repository::forward_repository;

/// A [`StatsRepository`] computes the aggregate counts shown on the
/// statistics dashboard. Counts here are informational; nothing in the
/// deletion pipeline depends on them.
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// The error type returned by the repository
    type Error;

    /// Count all top-level questions with a current ready version
    async fn count_top_level_questions(&mut self) -> Result<usize, Self::Error>;

    /// Count top-level questions that share their signature with at
    /// least one other question
    async fn count_duplicated_questions(&mut self) -> Result<usize, Self::Error>;

    /// Row count of the named table, or `None` if the table does not
    /// exist
    async fn table_rows(&mut self, table: &str) -> Result<Option<u64>, Self::Error>;
}

forward_repository!(StatsRepository {
    fn count_top_level_questions() -> usize;
    fn count_duplicated_questions() -> usize;
    fn table_rows(table: &str) -> Option<u64>;
});
