// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Headline counts shown on the cleanup overview.
///
/// Counts are exact (`COUNT(DISTINCT question id)`, not bank entry
/// id, to avoid double counting across versions). A count that could
/// not be computed is reported as zero; zero therefore does not mean
/// verified-empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Top-level questions in the bank
    pub total_questions: usize,

    /// Surplus members of duplicate groups, i.e. group sizes minus
    /// one keeper each
    pub duplicated_questions: usize,

    /// Top-level questions whose current version is ready and whose
    /// bank entry is unreferenced
    pub unused_questions: usize,

    /// Answers whose parent question row is gone
    pub orphaned_answers: usize,

    /// Answers belonging to unused questions
    pub unused_question_answers: usize,
}

/// A cached [`Statistics`] value with the time it was computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    /// The counts
    pub statistics: Statistics,

    /// When the counts were computed
    pub taken_at: DateTime<Utc>,
}

impl StatisticsSnapshot {
    /// Whether the snapshot is still within its validity window
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: chrono::Duration) -> bool {
        now - self.taken_at < max_age
    }
}

/// Row count of one question-related table, for the detailed
/// statistics view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStats {
    /// Table name, without any store-side prefix
    pub table: String,

    /// Human-readable label
    pub label: String,

    /// Number of rows
    pub rows: u64,
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    #[test]
    fn snapshot_freshness_window() {
        let taken_at = Utc.with_ymd_and_hms(2022, 1, 16, 14, 40, 0).unwrap();
        let snapshot = StatisticsSnapshot {
            statistics: Statistics::default(),
            taken_at,
        };

        assert!(snapshot.is_fresh(taken_at + Duration::minutes(59), Duration::hours(1)));
        assert!(!snapshot.is_fresh(taken_at + Duration::hours(1), Duration::hours(1)));
    }
}
