// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! Repository over answer option rows.

use std::collections::BTreeSet;

use async_trait::async_trait;
use qbc_data_model::{Answer, AnswerId, EntryId, QuestionId, UnusedAnswer};

use crate::repository::forward_repository;

/// An [`AnswerRepository`] reads and deletes answer option rows.
///
/// Two distinct classifications live here: *orphaned* answers, whose
/// parent question row no longer exists at all, and *unused* answers,
/// whose parent question exists but is itself unused. Orphans are
/// deleted directly; unused answers are deleted through the same
/// verification pipeline as their parent questions.
#[async_trait]
pub trait AnswerRepository: Send + Sync {
    /// The error type returned by the repository
    type Error;

    /// Count answers whose parent question row does not exist
    async fn count_orphaned(&mut self) -> Result<usize, Self::Error>;

    /// List orphaned answers, ordered by id, up to `cap` rows
    async fn list_orphaned(&mut self, cap: usize) -> Result<Vec<Answer>, Self::Error>;

    /// The id slice `[offset, offset + limit)` of the orphaned
    /// answer list, ordered by id
    async fn orphaned_ids(
        &mut self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<AnswerId>, Self::Error>;

    /// Count answers belonging to top-level questions whose current
    /// version is ready and whose bank entry is not in `used`
    async fn count_unused(&mut self, used: &BTreeSet<EntryId>) -> Result<usize, Self::Error>;

    /// List unused answers with their parent question's name, ordered
    /// by id, up to `cap` rows
    async fn list_unused(
        &mut self,
        used: &BTreeSet<EntryId>,
        cap: usize,
    ) -> Result<Vec<UnusedAnswer>, Self::Error>;

    /// The id slice `[offset, offset + limit)` of the unused answer
    /// list, ordered by id
    async fn unused_ids(
        &mut self,
        used: &BTreeSet<EntryId>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<AnswerId>, Self::Error>;

    /// The distinct parent question ids of the given answers
    async fn question_ids_for(
        &mut self,
        ids: &[AnswerId],
    ) -> Result<BTreeSet<QuestionId>, Self::Error>;

    /// Of the given ids, return those that are still orphaned right
    /// now. This is the deletion-time re-check.
    async fn filter_orphaned(&mut self, ids: &[AnswerId]) -> Result<Vec<AnswerId>, Self::Error>;

    /// Of the given ids, return those whose parent question is in
    /// `questions`
    async fn ids_for_questions(
        &mut self,
        ids: &[AnswerId],
        questions: &BTreeSet<QuestionId>,
    ) -> Result<Vec<AnswerId>, Self::Error>;

    /// Delete the given answer rows by id
    async fn delete_by_ids(&mut self, ids: &[AnswerId]) -> Result<u64, Self::Error>;

    /// Delete all answer rows belonging to the given questions
    async fn delete_for_questions(&mut self, ids: &[QuestionId]) -> Result<u64, Self::Error>;
}

forward_repository!(AnswerRepository {
    fn count_orphaned() -> usize;
    fn list_orphaned(cap: usize) -> Vec<Answer>;
    fn orphaned_ids(offset: usize, limit: usize) -> Vec<AnswerId>;
    fn count_unused(used: &BTreeSet<EntryId>) -> usize;
    fn list_unused(used: &BTreeSet<EntryId>, cap: usize) -> Vec<UnusedAnswer>;
    fn unused_ids(used: &BTreeSet<EntryId>, offset: usize, limit: usize) -> Vec<AnswerId>;
    fn question_ids_for(ids: &[AnswerId]) -> BTreeSet<QuestionId>;
    fn filter_orphaned(ids: &[AnswerId]) -> Vec<AnswerId>;
    fn ids_for_questions(ids: &[AnswerId], questions: &BTreeSet<QuestionId>) -> Vec<AnswerId>;
    fn delete_by_ids(ids: &[AnswerId]) -> u64;
    fn delete_for_questions(ids: &[QuestionId]) -> u64;
});
