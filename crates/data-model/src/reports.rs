// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of cleanup a session operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupType {
    /// Delete all but the oldest member of each duplicate group
    DuplicateQuestions,

    /// Delete top-level questions whose current version is ready and
    /// whose bank entry is referenced by no quiz slot
    UnusedQuestions,

    /// Delete answers whose parent question row no longer exists
    OrphanedAnswers,

    /// Delete answers belonging to unused questions
    UnusedAnswers,
}

impl CleanupType {
    /// All cleanup types, in display order
    pub const ALL: [Self; 4] = [
        Self::DuplicateQuestions,
        Self::UnusedQuestions,
        Self::OrphanedAnswers,
        Self::UnusedAnswers,
    ];

    /// Stable name used in logs and over the wire
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DuplicateQuestions => "duplicate_questions",
            Self::UnusedQuestions => "unused_questions",
            Self::OrphanedAnswers => "orphaned_answers",
            Self::UnusedAnswers => "unused_answers",
        }
    }
}

impl std::fmt::Display for CleanupType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown cleanup type
#[derive(Debug, Error)]
#[error("unknown cleanup type {0:?}")]
pub struct UnknownCleanupType(pub String);

impl std::str::FromStr for CleanupType {
    type Err = UnknownCleanupType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "duplicate_questions" => Ok(Self::DuplicateQuestions),
            "unused_questions" => Ok(Self::UnusedQuestions),
            "orphaned_answers" => Ok(Self::OrphanedAnswers),
            "unused_answers" => Ok(Self::UnusedAnswers),
            other => Err(UnknownCleanupType(other.to_owned())),
        }
    }
}

/// Outcome of one deletion call.
///
/// A chunk that fails adds its whole size to `failed` and its error
/// message to `errors`; processing always continues with the next
/// chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    /// Number of rows successfully deleted
    pub deleted: usize,

    /// Number of candidate rows in chunks that failed
    pub failed: usize,

    /// One message per failed chunk, surfaced verbatim to the caller
    pub errors: Vec<String>,
}

impl DeletionReport {
    /// An empty report
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successfully deleted chunk
    pub fn record_deleted(&mut self, count: usize) {
        self.deleted += count;
    }

    /// Record a failed chunk
    pub fn record_failed(&mut self, count: usize, error: String) {
        self.failed += count;
        self.errors.push(error);
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: Self) {
        self.deleted += other.deleted;
        self.failed += other.failed;
        self.errors.extend(other.errors);
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn cleanup_type_round_trips() {
        for kind in CleanupType::ALL {
            assert_eq!(kind.as_str().parse::<CleanupType>().unwrap(), kind);
        }
        let err = "everything".parse::<CleanupType>();
        assert_matches!(err, Err(UnknownCleanupType(name)) if name == "everything");
    }

    #[test]
    fn report_merge_accumulates() {
        let mut report = DeletionReport::new();
        report.record_deleted(10);

        let mut other = DeletionReport::new();
        other.record_failed(5, "chunk 2 exploded".to_owned());
        other.record_deleted(3);

        report.merge(other);
        assert_eq!(report.deleted, 13);
        assert_eq!(report.failed, 5);
        assert_eq!(report.errors, vec!["chunk 2 exploded".to_owned()]);
    }
}
