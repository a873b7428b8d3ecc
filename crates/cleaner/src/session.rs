// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! The batch-driven cleanup session.
//!
//! A session is owned by its actor and driven from outside: `start`
//! sizes the work, then the actor calls `process` once per batch until
//! the report says it is done. Nothing about the session is persisted
//! beyond the actor's stop flag, so an abandoned session costs
//! nothing and a new `start` picks up exactly where the data is now.

use qbc_data_model::{CleanupType, DeletionReport, clamp_batch_size};
use serde::Serialize;

use crate::{Cleaner, CleanerError, classifier, classifier::Candidates, deleter, verifier};

/// Outcome of starting a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartReport {
    /// The cleanup the session operates on
    pub cleanup_type: CleanupType,

    /// Candidates at start time; later batches recount, so this is a
    /// planning figure only
    pub total: usize,

    /// The clamped batch size the session will use
    pub batch_size: usize,

    /// Number of `process` calls the actor should make
    pub total_batches: usize,
}

/// Outcome of processing one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// The cleanup the batch belonged to
    pub cleanup_type: CleanupType,

    /// 1-based number of the processed batch
    pub batch_number: usize,

    /// Rows deleted in this batch
    pub deleted: usize,

    /// Candidate rows in chunks that failed
    pub failed: usize,

    /// One message per failed chunk
    pub errors: Vec<String>,

    /// Candidates left after this batch
    pub remaining: usize,

    /// The batch was skipped because the actor requested a stop
    pub stopped: bool,

    /// No candidates are left
    pub done: bool,
}

/// Current cancellation state of an actor's session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    /// Whether a stop has been requested and not yet been cleared by a
    /// new `start`
    pub stop_requested: bool,
}

impl Cleaner {
    /// Start a cleanup session: clear the actor's stop flag and size
    /// the work.
    ///
    /// `num_batches` caps how many batches the actor intends to run;
    /// zero or `None` means as many as the data needs.
    #[tracing::instrument(
        name = "cleaner.start_session",
        skip(self),
        fields(cleanup.kind = %kind),
        err,
    )]
    pub async fn start_session(
        &self,
        actor: &str,
        kind: CleanupType,
        batch_size: Option<usize>,
        num_batches: Option<usize>,
    ) -> Result<StartReport, CleanerError> {
        self.session_store().clear_stop(actor).await;

        let batch_size = clamp_batch_size(batch_size.unwrap_or(self.options().batch_size));

        let mut repo = self.factory().create().await?;
        let total = classifier::candidate_count(&mut repo, kind).await?;
        repo.save().await?;

        let needed = total.div_ceil(batch_size);
        let total_batches = match num_batches {
            Some(n) if n > 0 => needed.min(n),
            _ => needed,
        };

        tracing::info!(
            cleanup.total = total,
            cleanup.batch_size = batch_size,
            cleanup.total_batches = total_batches,
            "cleanup session started",
        );

        Ok(StartReport {
            cleanup_type: kind,
            total,
            batch_size,
            total_batches,
        })
    }

    /// Process one batch: re-classify, re-verify and delete.
    ///
    /// The candidate list is recomputed from the head on every call;
    /// earlier batches shrank it, so `batch_number` is only echoed
    /// back for progress display.
    ///
    /// This makes repeating a batch number safe: a repeated call works
    /// on whatever candidates remain, so a row is never deleted twice,
    /// and once the list is exhausted further calls report
    /// `deleted = 0` without error.
    #[tracing::instrument(
        name = "cleaner.process_batch",
        skip(self),
        fields(cleanup.kind = %kind),
        err,
    )]
    pub async fn process_batch(
        &self,
        actor: &str,
        kind: CleanupType,
        batch_size: Option<usize>,
        batch_number: usize,
    ) -> Result<BatchReport, CleanerError> {
        let batch_size = clamp_batch_size(batch_size.unwrap_or(self.options().batch_size));

        if self.session_store().is_stop_requested(actor).await {
            tracing::info!("cleanup session stopped by actor");
            let remaining = self.candidate_count(kind).await?;
            return Ok(BatchReport {
                cleanup_type: kind,
                batch_number,
                deleted: 0,
                failed: 0,
                errors: Vec::new(),
                remaining,
                stopped: true,
                done: remaining == 0,
            });
        }

        let report = self.run_single_batch(kind, batch_size).await?;
        let remaining = self.candidate_count(kind).await?;

        Ok(BatchReport {
            cleanup_type: kind,
            batch_number,
            deleted: report.deleted,
            failed: report.failed,
            errors: report.errors,
            remaining,
            stopped: false,
            done: remaining == 0,
        })
    }

    /// Raise the actor's stop flag; the next `process` call will skip
    /// its batch
    pub async fn stop_session(&self, actor: &str) {
        self.session_store().request_stop(actor).await;
    }

    /// The actor's current cancellation state
    pub async fn session_status(&self, actor: &str) -> SessionStatus {
        SessionStatus {
            stop_requested: self.session_store().is_stop_requested(actor).await,
        }
    }

    /// Classify, verify and delete one batch of the given cleanup
    /// type. This is the unattended entry point; the interactive
    /// session wraps it with stop-flag handling and progress.
    pub async fn run_single_batch(
        &self,
        kind: CleanupType,
        batch_size: usize,
    ) -> Result<DeletionReport, CleanerError> {
        let batch_size = clamp_batch_size(batch_size);

        let mut repo = self.factory().create().await?;
        let candidates = classifier::candidate_batch(&mut repo, kind, batch_size).await?;

        let verified = match &candidates {
            Candidates::Questions(ids) => match kind {
                CleanupType::DuplicateQuestions => {
                    Candidates::Questions(verifier::verify_duplicate_questions(&mut repo, ids).await?)
                }
                _ => Candidates::Questions(verifier::verify_unused_questions(&mut repo, ids).await?),
            },
            Candidates::Answers(ids) => match kind {
                CleanupType::OrphanedAnswers => {
                    Candidates::Answers(verifier::verify_orphaned_answers(&mut repo, ids).await?)
                }
                _ => Candidates::Answers(verifier::verify_unused_answers(&mut repo, ids).await?),
            },
        };
        repo.save().await?;

        if verified.is_empty() {
            return Ok(DeletionReport::new());
        }

        let report = match verified {
            Candidates::Questions(ids) => deleter::delete_questions(self.factory(), &ids).await,
            Candidates::Answers(ids) => deleter::delete_answers(self.factory(), &ids).await,
        };

        // Counts moved, the cached statistics are stale now
        self.cache().clear().await;

        tracing::info!(
            cleanup.kind = %kind,
            cleanup.deleted = report.deleted,
            cleanup.failed = report.failed,
            "cleanup batch finished",
        );

        Ok(report)
    }
}
