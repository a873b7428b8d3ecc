// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! Repository over question, version and bank entry rows.

use std::collections::BTreeSet;

use async_trait::async_trait;
use qbc_data_model::{ContextId, EntryId, Question, QuestionId, Signature};

use crate::repository::forward_repository;

/// Optional scoping of classification queries, e.g. to one course
/// context
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuestionScope {
    context: Option<ContextId>,
}

impl QuestionScope {
    /// Create an unscoped filter matching the whole bank
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to questions whose category belongs to the given
    /// context
    #[must_use]
    pub fn in_context(mut self, context: ContextId) -> Self {
        self.context = Some(context);
        self
    }

    /// The context restriction, if any
    #[must_use]
    pub fn context(&self) -> Option<ContextId> {
        self.context
    }
}

/// A [`QuestionRepository`] reads question rows for classification
/// and deletes them, with their dependent rows, once verified unused.
///
/// Every classification method excludes sub-questions
/// (`parent != 0`) and questions that have no current version, i.e.
/// no version rows at all or only hidden ones; those are logically
/// gone already.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// The error type returned by the repository
    type Error;

    /// Count top-level questions whose current version is ready and
    /// whose bank entry is *not* in `used`. Exact
    /// (`COUNT(DISTINCT question id)`).
    async fn count_unused(
        &mut self,
        used: &BTreeSet<EntryId>,
        scope: QuestionScope,
    ) -> Result<usize, Self::Error>;

    /// Count top-level questions whose current version is ready and
    /// whose bank entry *is* in `used`
    async fn count_used(
        &mut self,
        used: &BTreeSet<EntryId>,
        scope: QuestionScope,
    ) -> Result<usize, Self::Error>;

    /// List unused questions, ordered by id, up to `cap` rows
    async fn list_unused(
        &mut self,
        used: &BTreeSet<EntryId>,
        scope: QuestionScope,
        cap: usize,
    ) -> Result<Vec<Question>, Self::Error>;

    /// List used questions with offset pagination; used sets can be
    /// large and are for display only
    async fn list_used(
        &mut self,
        used: &BTreeSet<EntryId>,
        scope: QuestionScope,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Question>, Self::Error>;

    /// The id slice `[offset, offset + limit)` of the unused
    /// candidate list, ordered by id. Recomputed fresh for every
    /// batch.
    async fn unused_ids(
        &mut self,
        used: &BTreeSet<EntryId>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<QuestionId>, Self::Error>;

    /// All top-level questions whose signature occurs at least twice,
    /// with their signature, ordered by signature then id so the
    /// caller can reconstruct the groups
    async fn list_duplicates(
        &mut self,
        cap: usize,
    ) -> Result<Vec<(Question, Signature)>, Self::Error>;

    /// The signatures of the given questions
    async fn signatures_for(
        &mut self,
        ids: &[QuestionId],
    ) -> Result<Vec<(QuestionId, Signature)>, Self::Error>;

    /// All top-level questions carrying any of the given signatures,
    /// ordered by signature then id. This is the fresh group re-read
    /// the verifier does at deletion time.
    async fn by_signatures(
        &mut self,
        signatures: &[Signature],
    ) -> Result<Vec<(QuestionId, Signature)>, Self::Error>;

    /// The distinct bank entry ids the given questions belong to
    async fn entry_ids_for(
        &mut self,
        ids: &[QuestionId],
    ) -> Result<BTreeSet<EntryId>, Self::Error>;

    /// The distinct question ids belonging to the given bank entries
    async fn question_ids_for_entries(
        &mut self,
        entry_ids: &BTreeSet<EntryId>,
    ) -> Result<BTreeSet<QuestionId>, Self::Error>;

    /// `(question id, entry id)` pairs for the given ids, top-level
    /// questions only
    async fn top_level_entry_pairs(
        &mut self,
        ids: &[QuestionId],
    ) -> Result<Vec<(QuestionId, EntryId)>, Self::Error>;

    /// The distinct question type tags present among the given ids
    async fn qtypes_of(&mut self, ids: &[QuestionId]) -> Result<Vec<String>, Self::Error>;

    /// Delete the type-specific option rows of the given questions
    /// from `qtype_{qtype}_options`, if that table exists. Returns
    /// the number of deleted rows, zero when the table is absent.
    async fn delete_type_options(
        &mut self,
        qtype: &str,
        ids: &[QuestionId],
    ) -> Result<u64, Self::Error>;

    /// Delete the version rows of the given questions
    async fn delete_versions(&mut self, ids: &[QuestionId]) -> Result<u64, Self::Error>;

    /// Delete bank entries that have no remaining version rows.
    /// Global, not chunk-scoped; idempotent, so it runs on every
    /// chunk even after partial failures.
    async fn delete_dangling_entries(&mut self) -> Result<u64, Self::Error>;

    /// Delete the question rows themselves. Must run last within a
    /// chunk.
    async fn delete_questions(&mut self, ids: &[QuestionId]) -> Result<u64, Self::Error>;
}

forward_repository!(QuestionRepository {
    fn count_unused(used: &BTreeSet<EntryId>, scope: QuestionScope) -> usize;
    fn count_used(used: &BTreeSet<EntryId>, scope: QuestionScope) -> usize;
    fn list_unused(used: &BTreeSet<EntryId>, scope: QuestionScope, cap: usize) -> Vec<Question>;
    fn list_used(
        used: &BTreeSet<EntryId>,
        scope: QuestionScope,
        offset: usize,
        limit: usize,
    ) -> Vec<Question>;
    fn unused_ids(used: &BTreeSet<EntryId>, offset: usize, limit: usize) -> Vec<QuestionId>;
    fn list_duplicates(cap: usize) -> Vec<(Question, Signature)>;
    fn signatures_for(ids: &[QuestionId]) -> Vec<(QuestionId, Signature)>;
    fn by_signatures(signatures: &[Signature]) -> Vec<(QuestionId, Signature)>;
    fn entry_ids_for(ids: &[QuestionId]) -> BTreeSet<EntryId>;
    fn question_ids_for_entries(entry_ids: &BTreeSet<EntryId>) -> BTreeSet<QuestionId>;
    fn top_level_entry_pairs(ids: &[QuestionId]) -> Vec<(QuestionId, EntryId)>;
    fn qtypes_of(ids: &[QuestionId]) -> Vec<String>;
    fn delete_type_options(qtype: &str, ids: &[QuestionId]) -> u64;
    fn delete_versions(ids: &[QuestionId]) -> u64;
    fn delete_dangling_entries() -> u64;
    fn delete_questions(ids: &[QuestionId]) -> u64;
});
