// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! Deletion-time re-verification of candidates.
//!
//! Classification lists can go stale between being computed and being
//! acted on: a teacher can add a question to a quiz, restore a backup
//! or delete a duplicate by hand. Every function here re-reads the
//! relevant state and returns only the candidates that are still safe
//! to delete right now.

use std::collections::BTreeSet;

use qbc_data_model::{AnswerId, QuestionId, Signature};
use qbc_storage::{BoxRepository, RepositoryError};

use crate::UsageIndex;

/// Of the given question candidates, keep those that are still
/// top-level and whose bank entry is still unreferenced
pub(crate) async fn verify_unused_questions(
    repo: &mut BoxRepository,
    ids: &[QuestionId],
) -> Result<Vec<QuestionId>, RepositoryError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let usage = UsageIndex::load(repo).await?;
    let pairs = repo.question().top_level_entry_pairs(ids).await?;

    Ok(pairs
        .into_iter()
        .filter(|(_, entry)| !usage.is_used(*entry))
        .map(|(id, _)| id)
        .collect())
}

/// Of the given duplicate candidates, keep those that are still a
/// surplus member of their group and still unreferenced.
///
/// The groups are re-derived from scratch by signature, over all
/// questions carrying the signature and not just the candidates, so
/// the lowest-id keeper of each group survives even when it was never
/// a candidate.
pub(crate) async fn verify_duplicate_questions(
    repo: &mut BoxRepository,
    ids: &[QuestionId],
) -> Result<Vec<QuestionId>, RepositoryError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let signatures: Vec<Signature> = {
        let mut signatures: Vec<Signature> = repo
            .question()
            .signatures_for(ids)
            .await?
            .into_iter()
            .map(|(_, signature)| signature)
            .collect();
        signatures.sort();
        signatures.dedup();
        signatures
    };

    // Rows come back ordered by signature then id, so each group is a
    // consecutive run and its first row is the keeper
    let fresh = repo.question().by_signatures(&signatures).await?;

    let requested: BTreeSet<QuestionId> = ids.iter().copied().collect();
    let mut surplus = Vec::new();
    let mut current: Option<(&Signature, usize)> = None;
    for (id, signature) in &fresh {
        let group_len = match &mut current {
            Some((sig, len)) if **sig == *signature => {
                *len += 1;
                *len
            }
            _ => {
                current = Some((signature, 1));
                1
            }
        };

        // Skip the first row of each run, that member is kept
        if group_len > 1 && requested.contains(id) {
            surplus.push(*id);
        }
    }

    if surplus.is_empty() {
        return Ok(surplus);
    }

    // A duplicate whose entry became referenced is off the table too
    let usage = UsageIndex::load(repo).await?;
    let pairs = repo.question().top_level_entry_pairs(&surplus).await?;

    Ok(pairs
        .into_iter()
        .filter(|(_, entry)| !usage.is_used(*entry))
        .map(|(id, _)| id)
        .collect())
}

/// Of the given answer candidates, keep those whose parent question
/// row is still gone
pub(crate) async fn verify_orphaned_answers(
    repo: &mut BoxRepository,
    ids: &[AnswerId],
) -> Result<Vec<AnswerId>, RepositoryError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    repo.answer().filter_orphaned(ids).await
}

/// Of the given answer candidates, keep those whose parent question
/// is still verified unused
pub(crate) async fn verify_unused_answers(
    repo: &mut BoxRepository,
    ids: &[AnswerId],
) -> Result<Vec<AnswerId>, RepositoryError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let questions: Vec<QuestionId> = repo
        .answer()
        .question_ids_for(ids)
        .await?
        .into_iter()
        .collect();
    let verified: BTreeSet<QuestionId> = verify_unused_questions(repo, &questions)
        .await?
        .into_iter()
        .collect();

    repo.answer().ids_for_questions(ids, &verified).await
}
