// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! Classification of question bank content into deletion candidates.
//!
//! Everything here is advisory: the lists and counts feed the review
//! UI and the batch driver, but deletion only happens after the
//! verifier re-checked each candidate against fresh data.

use qbc_data_model::{
    Answer, AnswerId, CleanupType, DuplicateGroup, Question, QuestionId, Signature, UnusedAnswer,
};
use qbc_storage::{BoxRepository, QuestionScope, RepositoryError};

use crate::{Cleaner, CleanerError, UsageIndex};

/// Candidate ids of one batch; which table they point at depends on
/// the cleanup type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidates {
    /// Question row ids
    Questions(Vec<QuestionId>),

    /// Answer row ids
    Answers(Vec<AnswerId>),
}

impl Candidates {
    /// Whether the batch is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Questions(ids) => ids.is_empty(),
            Self::Answers(ids) => ids.is_empty(),
        }
    }
}

/// Count the deletion candidates of the given cleanup type
pub(crate) async fn candidate_count(
    repo: &mut BoxRepository,
    kind: CleanupType,
) -> Result<usize, RepositoryError> {
    match kind {
        CleanupType::DuplicateQuestions => repo.stats().count_duplicated_questions().await,
        CleanupType::UnusedQuestions => {
            let usage = UsageIndex::load(repo).await?;
            repo.question()
                .count_unused(usage.entries(), QuestionScope::new())
                .await
        }
        CleanupType::OrphanedAnswers => repo.answer().count_orphaned().await,
        CleanupType::UnusedAnswers => {
            let usage = UsageIndex::load(repo).await?;
            repo.answer().count_unused(usage.entries()).await
        }
    }
}

/// Fetch one batch of candidate ids, always from the head of the
/// candidate list: earlier batches shrink the list, so the head is
/// what is left to do.
pub(crate) async fn candidate_batch(
    repo: &mut BoxRepository,
    kind: CleanupType,
    batch_size: usize,
) -> Result<Candidates, RepositoryError> {
    let candidates = match kind {
        CleanupType::DuplicateQuestions => {
            // A group of n rows yields n - 1 deletable members, so
            // twice the batch size is always enough rows
            let groups = duplicate_groups(repo, batch_size.saturating_mul(2)).await?;
            let ids = groups
                .iter()
                .flat_map(|group| group.deletable().map(|question| question.id))
                .take(batch_size)
                .collect();
            Candidates::Questions(ids)
        }
        CleanupType::UnusedQuestions => {
            let usage = UsageIndex::load(repo).await?;
            let ids = repo
                .question()
                .unused_ids(usage.entries(), 0, batch_size)
                .await?;
            Candidates::Questions(ids)
        }
        CleanupType::OrphanedAnswers => {
            let ids = repo.answer().orphaned_ids(0, batch_size).await?;
            Candidates::Answers(ids)
        }
        CleanupType::UnusedAnswers => {
            let usage = UsageIndex::load(repo).await?;
            let ids = repo
                .answer()
                .unused_ids(usage.entries(), 0, batch_size)
                .await?;
            Candidates::Answers(ids)
        }
    };

    Ok(candidates)
}

/// Fetch duplicate groups. `cap` bounds the number of question rows
/// read; a group split by the cap can lose its tail, which only makes
/// the result an under-approximation.
pub(crate) async fn duplicate_groups(
    repo: &mut BoxRepository,
    cap: usize,
) -> Result<Vec<DuplicateGroup>, RepositoryError> {
    let rows = repo.question().list_duplicates(cap).await?;

    let mut groups = Vec::new();
    let mut current: Option<(Signature, Vec<Question>)> = None;
    for (question, signature) in rows {
        match &mut current {
            Some((sig, members)) if *sig == signature => members.push(question),
            _ => {
                if let Some((sig, members)) = current.take() {
                    groups.extend(DuplicateGroup::new(sig, members));
                }
                current = Some((signature, vec![question]));
            }
        }
    }
    if let Some((sig, members)) = current {
        groups.extend(DuplicateGroup::new(sig, members));
    }

    Ok(groups)
}

impl Cleaner {
    /// Count the deletion candidates of the given cleanup type
    pub async fn candidate_count(&self, kind: CleanupType) -> Result<usize, CleanerError> {
        let mut repo = self.factory().create().await?;
        let count = candidate_count(&mut repo, kind).await?;
        repo.save().await?;
        Ok(count)
    }

    /// List unused questions for review, up to `cap` rows
    pub async fn list_unused_questions(
        &self,
        scope: QuestionScope,
        cap: usize,
    ) -> Result<Vec<Question>, CleanerError> {
        let mut repo = self.factory().create().await?;
        let usage = UsageIndex::load(&mut repo).await?;
        let questions = repo
            .question()
            .list_unused(usage.entries(), scope, cap)
            .await?;
        repo.save().await?;
        Ok(questions)
    }

    /// List used questions for review, with offset pagination
    pub async fn list_used_questions(
        &self,
        scope: QuestionScope,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Question>, CleanerError> {
        let mut repo = self.factory().create().await?;
        let usage = UsageIndex::load(&mut repo).await?;
        let questions = repo
            .question()
            .list_used(usage.entries(), scope, offset, limit)
            .await?;
        repo.save().await?;
        Ok(questions)
    }

    /// List duplicate groups for review; `cap` bounds the number of
    /// question rows read
    pub async fn duplicate_groups(&self, cap: usize) -> Result<Vec<DuplicateGroup>, CleanerError> {
        let mut repo = self.factory().create().await?;
        let groups = duplicate_groups(&mut repo, cap).await?;
        repo.save().await?;
        Ok(groups)
    }

    /// List orphaned answers for review, up to `cap` rows
    pub async fn list_orphaned_answers(&self, cap: usize) -> Result<Vec<Answer>, CleanerError> {
        let mut repo = self.factory().create().await?;
        let answers = repo.answer().list_orphaned(cap).await?;
        repo.save().await?;
        Ok(answers)
    }

    /// List answers of unused questions for review, up to `cap` rows
    pub async fn list_unused_answers(
        &self,
        cap: usize,
    ) -> Result<Vec<UnusedAnswer>, CleanerError> {
        let mut repo = self.factory().create().await?;
        let usage = UsageIndex::load(&mut repo).await?;
        let answers = repo.answer().list_unused(usage.entries(), cap).await?;
        repo.save().await?;
        Ok(answers)
    }
}
