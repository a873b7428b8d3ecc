// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! Domain model for the question bank cleaner.
//!
//! All entities here are read-side projections of an externally-owned
//! relational schema: the cleaner never creates or mutates questions,
//! versions, bank entries or references; it only reads them for
//! classification and deletes rows once they are verified unused.

#![deny(missing_docs)]

mod answers;
mod clock;
mod ids;
mod questions;
mod reports;
mod statistics;

pub use self::{
    answers::{Answer, UnusedAnswer},
    clock::{Clock, MockClock, SystemClock},
    ids::{AnswerId, ContextId, EntryId, QuestionId, VersionId},
    questions::{
        DuplicateGroup, Question, QuestionVersionStatus, Signature, UnknownVersionStatus,
    },
    reports::{CleanupType, DeletionReport, UnknownCleanupType},
    statistics::{Statistics, StatisticsSnapshot, TableStats},
};

/// Hard upper bound on batch sizes and result caps. Each `process`
/// call must stay bounded in wall-clock time; the driver relies on it.
pub const MAX_BATCH_SIZE: usize = 10_000;

/// Default batch size when the caller does not specify one.
pub const DEFAULT_BATCH_SIZE: usize = 1_000;

/// Clamp a caller-provided batch size or result cap to `[1, 10000]`.
#[must_use]
pub fn clamp_batch_size(size: usize) -> usize {
    size.clamp(1, MAX_BATCH_SIZE)
}

#[cfg(test)]
mod tests {
    use super::clamp_batch_size;

    #[test]
    fn batch_size_clamps_to_bounds() {
        assert_eq!(clamp_batch_size(0), 1);
        assert_eq!(clamp_batch_size(1), 1);
        assert_eq!(clamp_batch_size(1_000), 1_000);
        assert_eq!(clamp_batch_size(10_000), 10_000);
        assert_eq!(clamp_batch_size(usize::MAX), 10_000);
    }
}
