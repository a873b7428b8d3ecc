// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! Chunked deletion with per-chunk units of work.
//!
//! Question deletion has to respect the dependency order of the
//! schema: answers first, then the per-type option rows, then the
//! version rows, then bank entries left without versions, and the
//! question rows last. Each chunk runs in its own storage transaction;
//! a failure rolls that chunk back, is recorded in the report and the
//! next chunk proceeds.

use qbc_data_model::{AnswerId, DeletionReport, QuestionId};
use qbc_storage::{RepositoryError, RepositoryFactory};

/// Rows deleted per unit of work.
///
/// Fixed rather than derived from the session batch size:
/// the chunk bounds how much one transaction deletes and how much one
/// failure rolls back, independent of how large a batch the caller
/// asked for. Batches are capped at 10 000 candidates, so a batch
/// spans at most ten chunks, and a batch smaller than this is a single
/// transaction.
pub(crate) const DELETE_CHUNK: usize = 1_000;

/// Delete verified question candidates, with all their dependent rows
pub(crate) async fn delete_questions(
    factory: &dyn RepositoryFactory,
    ids: &[QuestionId],
) -> DeletionReport {
    let mut report = DeletionReport::new();
    for chunk in ids.chunks(DELETE_CHUNK) {
        match delete_question_chunk(factory, chunk).await {
            Ok(deleted) => report.record_deleted(deleted),
            Err(e) => {
                tracing::warn!(
                    error = &e as &dyn std::error::Error,
                    chunk_size = chunk.len(),
                    "question deletion chunk failed, rolled back",
                );
                report.record_failed(chunk.len(), e.to_string());
            }
        }
    }
    report
}

async fn delete_question_chunk(
    factory: &dyn RepositoryFactory,
    chunk: &[QuestionId],
) -> Result<usize, RepositoryError> {
    let mut repo = factory.create().await?;

    let result = async {
        repo.answer().delete_for_questions(chunk).await?;

        let qtypes = repo.question().qtypes_of(chunk).await?;
        for qtype in qtypes {
            repo.question().delete_type_options(&qtype, chunk).await?;
        }

        repo.question().delete_versions(chunk).await?;
        repo.question().delete_dangling_entries().await?;
        repo.question().delete_questions(chunk).await
    }
    .await;

    match result {
        Ok(deleted) => {
            repo.save().await?;
            Ok(usize::try_from(deleted).unwrap_or(usize::MAX))
        }
        Err(e) => {
            if let Err(cancel_error) = repo.cancel().await {
                tracing::warn!(
                    error = &cancel_error as &dyn std::error::Error,
                    "failed to roll back deletion chunk",
                );
            }
            Err(e)
        }
    }
}

/// Delete verified answer candidates
pub(crate) async fn delete_answers(
    factory: &dyn RepositoryFactory,
    ids: &[AnswerId],
) -> DeletionReport {
    let mut report = DeletionReport::new();
    for chunk in ids.chunks(DELETE_CHUNK) {
        match delete_answer_chunk(factory, chunk).await {
            Ok(deleted) => report.record_deleted(deleted),
            Err(e) => {
                tracing::warn!(
                    error = &e as &dyn std::error::Error,
                    chunk_size = chunk.len(),
                    "answer deletion chunk failed, rolled back",
                );
                report.record_failed(chunk.len(), e.to_string());
            }
        }
    }
    report
}

async fn delete_answer_chunk(
    factory: &dyn RepositoryFactory,
    chunk: &[AnswerId],
) -> Result<usize, RepositoryError> {
    let mut repo = factory.create().await?;

    let result = repo.answer().delete_by_ids(chunk).await;

    match result {
        Ok(deleted) => {
            repo.save().await?;
            Ok(usize::try_from(deleted).unwrap_or(usize::MAX))
        }
        Err(e) => {
            if let Err(cancel_error) = repo.cancel().await {
                tracing::warn!(
                    error = &cancel_error as &dyn std::error::Error,
                    "failed to roll back deletion chunk",
                );
            }
            Err(e)
        }
    }
}
