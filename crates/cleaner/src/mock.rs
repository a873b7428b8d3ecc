// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! An in-memory implementation of the storage repositories, for
//! engine and handler tests.
//!
//! The mock mirrors the relational semantics the PostgreSQL backend
//! implements in SQL: joins, the current-version rule, chunk ordering
//! and the unit-of-work boundary. `create` stages a copy of the shared
//! data, `save` publishes it back and `cancel` discards it, so tests
//! can observe rollback behavior.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use qbc_data_model::{
    Answer, AnswerId, EntryId, Question, QuestionId, QuestionVersionStatus, Signature,
    UnusedAnswer,
};
use qbc_storage::{
    AnswerRepository, BoxRepository, MapErr, QuestionRepository, QuestionScope, RepositoryAccess,
    RepositoryError, RepositoryFactory, RepositoryTransaction, StatsRepository, UsageRepository,
};
use thiserror::Error;

/// Error produced by the mock, usually only when injected
#[derive(Debug, Error)]
#[error("mock repository failure: {0}")]
pub struct MockError(pub String);

/// A question row
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionRow {
    /// Row id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Question type tag
    pub qtype: String,
    /// Body text
    pub question_text: String,
    /// Parent question id, `0` for top-level
    pub parent: i64,
}

/// A question version row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRow {
    /// Row id
    pub id: i64,
    /// The versioned question
    pub question_id: i64,
    /// The bank entry grouping the versions
    pub entry_id: i64,
    /// Version number within the entry
    pub version: i64,
    /// Publication status
    pub status: QuestionVersionStatus,
}

/// A bank entry row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRow {
    /// Row id
    pub id: i64,
    /// The owning category
    pub category_id: i64,
}

/// A category row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRow {
    /// Row id
    pub id: i64,
    /// Display name
    pub name: String,
    /// The context the category belongs to
    pub context_id: i64,
}

/// A usage reference row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRow {
    /// The referenced bank entry
    pub entry_id: i64,
    /// Referencing component
    pub component: String,
    /// Referencing area
    pub area: String,
}

/// An answer row
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerRow {
    /// Row id
    pub id: i64,
    /// The owning question
    pub question_id: i64,
    /// Answer text
    pub answer_text: String,
    /// Grade fraction
    pub fraction: f64,
    /// Feedback text
    pub feedback: String,
}

/// The whole data set behind a [`MockRepositoryFactory`]
#[derive(Debug, Clone, Default)]
pub struct MockData {
    /// Question rows by id
    pub questions: BTreeMap<i64, QuestionRow>,
    /// Version rows by id
    pub versions: BTreeMap<i64, VersionRow>,
    /// Bank entry rows by id
    pub entries: BTreeMap<i64, EntryRow>,
    /// Category rows by id
    pub categories: BTreeMap<i64, CategoryRow>,
    /// Usage reference rows
    pub references: Vec<ReferenceRow>,
    /// Per-type option tables: table name to owning question ids
    pub qtype_options: BTreeMap<String, Vec<i64>>,
    /// Answer rows by id
    pub answers: BTreeMap<i64, AnswerRow>,
    /// When set, `delete_questions` fails with an injected error
    pub fail_delete_questions: bool,
    /// When set, `delete_by_ids` on answers fails with an injected
    /// error
    pub fail_delete_answers: bool,
}

impl MockData {
    /// An empty data set with one default category
    #[must_use]
    pub fn new() -> Self {
        let mut data = Self::default();
        data.categories.insert(
            1,
            CategoryRow {
                id: 1,
                name: "Default".to_owned(),
                context_id: 1,
            },
        );
        data
    }

    /// Add a category
    pub fn add_category(&mut self, id: i64, name: &str, context_id: i64) {
        self.categories.insert(
            id,
            CategoryRow {
                id,
                name: name.to_owned(),
                context_id,
            },
        );
    }

    /// Add a ready, single-version, top-level question in category 1.
    /// The entry and version rows reuse the question id.
    pub fn add_question(&mut self, id: i64, name: &str, qtype: &str, question_text: &str) {
        self.add_question_in_category(id, name, qtype, question_text, 1);
    }

    /// Add a ready, single-version, top-level question in the given
    /// category
    pub fn add_question_in_category(
        &mut self,
        id: i64,
        name: &str,
        qtype: &str,
        question_text: &str,
        category_id: i64,
    ) {
        self.questions.insert(
            id,
            QuestionRow {
                id,
                name: name.to_owned(),
                qtype: qtype.to_owned(),
                question_text: question_text.to_owned(),
                parent: 0,
            },
        );
        self.entries.insert(id, EntryRow { id, category_id });
        self.versions.insert(
            id,
            VersionRow {
                id,
                question_id: id,
                entry_id: id,
                version: 1,
                status: QuestionVersionStatus::Ready,
            },
        );
    }

    /// Add a bare version row, for multi-version scenarios
    pub fn add_version(
        &mut self,
        id: i64,
        question_id: i64,
        entry_id: i64,
        version: i64,
        status: QuestionVersionStatus,
    ) {
        self.versions.insert(
            id,
            VersionRow {
                id,
                question_id,
                entry_id,
                version,
                status,
            },
        );
    }

    /// Add an answer row
    pub fn add_answer(&mut self, id: i64, question_id: i64, answer_text: &str) {
        self.answers.insert(
            id,
            AnswerRow {
                id,
                question_id,
                answer_text: answer_text.to_owned(),
                fraction: 1.0,
                feedback: String::new(),
            },
        );
    }

    /// Reference a bank entry from a quiz slot
    pub fn add_quiz_reference(&mut self, entry_id: i64) {
        self.add_reference(entry_id, "mod_quiz", "slot");
    }

    /// Reference a bank entry from an arbitrary component
    pub fn add_reference(&mut self, entry_id: i64, component: &str, area: &str) {
        self.references.push(ReferenceRow {
            entry_id,
            component: component.to_owned(),
            area: area.to_owned(),
        });
    }

    /// Create an empty per-type option table
    pub fn add_qtype_table(&mut self, qtype: &str) {
        self.qtype_options
            .entry(format!("qtype_{qtype}_options"))
            .or_default();
    }

    /// Add an option row to a per-type option table, creating it if
    /// needed
    pub fn add_qtype_option(&mut self, qtype: &str, question_id: i64) {
        self.qtype_options
            .entry(format!("qtype_{qtype}_options"))
            .or_default()
            .push(question_id);
    }

    fn used_entries(&self) -> BTreeSet<i64> {
        self.references
            .iter()
            .filter(|r| r.component == "mod_quiz" && r.area == "slot")
            .map(|r| r.entry_id)
            .collect()
    }

    fn version_of(&self, question_id: i64) -> Option<&VersionRow> {
        self.versions
            .values()
            .find(|v| v.question_id == question_id)
    }

    fn is_current(&self, row: &VersionRow) -> bool {
        !self.versions.values().any(|other| {
            other.entry_id == row.entry_id
                && other.version > row.version
                && other.status != QuestionVersionStatus::Hidden
        })
    }

    /// Top-level questions with a current version, paired with that
    /// version row. `ready_only` restricts the status the way the
    /// classification queries do. Ordered by question id.
    fn classified(&self, ready_only: bool) -> Vec<(&QuestionRow, &VersionRow)> {
        self.questions
            .values()
            .filter(|q| q.parent == 0)
            .filter_map(|q| self.version_of(q.id).map(|v| (q, v)))
            .filter(|(_, v)| {
                let status_ok = if ready_only {
                    v.status == QuestionVersionStatus::Ready
                } else {
                    v.status != QuestionVersionStatus::Hidden
                };
                status_ok && self.is_current(v)
            })
            .collect()
    }

    fn in_scope(&self, version: &VersionRow, scope: QuestionScope) -> bool {
        let Some(context) = scope.context() else {
            return true;
        };
        self.entries
            .get(&version.entry_id)
            .and_then(|entry| self.categories.get(&entry.category_id))
            .is_some_and(|category| category.context_id == context.value())
    }

    fn to_question(&self, row: &QuestionRow, version: &VersionRow) -> Option<Question> {
        let entry = self.entries.get(&version.entry_id)?;
        let category = self.categories.get(&entry.category_id)?;
        Some(Question {
            id: QuestionId::from(row.id),
            name: row.name.clone(),
            qtype: row.qtype.clone(),
            question_text: row.question_text.clone(),
            parent: row.parent,
            category_id: category.id,
            category_name: category.name.clone(),
            version: version.version,
            entry_id: EntryId::from(version.entry_id),
        })
    }

    fn signature_of(row: &QuestionRow) -> Signature {
        Signature::new(&row.name, &row.qtype, &row.question_text)
    }

    fn is_orphaned_answer(&self, answer: &AnswerRow) -> bool {
        !self.questions.contains_key(&answer.question_id)
    }

    /// Questions counted as unused against the given used set, ordered
    /// by id
    fn unused(&self, used: &BTreeSet<EntryId>) -> Vec<(&QuestionRow, &VersionRow)> {
        self.classified(true)
            .into_iter()
            .filter(|(_, v)| !used.contains(&EntryId::from(v.entry_id)))
            .collect()
    }

    fn to_answer(row: &AnswerRow) -> Answer {
        Answer {
            id: AnswerId::from(row.id),
            question_id: QuestionId::from(row.question_id),
            answer_text: row.answer_text.clone(),
            fraction: row.fraction,
            feedback: row.feedback.clone(),
        }
    }
}

/// A repository over one staged copy of the shared [`MockData`]
pub struct MockRepository {
    shared: Arc<Mutex<MockData>>,
    staged: MockData,
}

struct MockAccess<'c> {
    data: &'c mut MockData,
}

#[async_trait]
impl UsageRepository for MockAccess<'_> {
    type Error = MockError;

    async fn used_entry_ids(&mut self) -> Result<BTreeSet<EntryId>, Self::Error> {
        Ok(self
            .data
            .used_entries()
            .into_iter()
            .map(EntryId::from)
            .collect())
    }
}

#[async_trait]
impl QuestionRepository for MockAccess<'_> {
    type Error = MockError;

    async fn count_unused(
        &mut self,
        used: &BTreeSet<EntryId>,
        scope: QuestionScope,
    ) -> Result<usize, Self::Error> {
        Ok(self
            .data
            .unused(used)
            .into_iter()
            .filter(|(_, v)| self.data.in_scope(v, scope))
            .count())
    }

    async fn count_used(
        &mut self,
        used: &BTreeSet<EntryId>,
        scope: QuestionScope,
    ) -> Result<usize, Self::Error> {
        Ok(self
            .data
            .classified(true)
            .into_iter()
            .filter(|(_, v)| used.contains(&EntryId::from(v.entry_id)))
            .filter(|(_, v)| self.data.in_scope(v, scope))
            .count())
    }

    async fn list_unused(
        &mut self,
        used: &BTreeSet<EntryId>,
        scope: QuestionScope,
        cap: usize,
    ) -> Result<Vec<Question>, Self::Error> {
        Ok(self
            .data
            .unused(used)
            .into_iter()
            .filter(|(_, v)| self.data.in_scope(v, scope))
            .filter_map(|(q, v)| self.data.to_question(q, v))
            .take(cap)
            .collect())
    }

    async fn list_used(
        &mut self,
        used: &BTreeSet<EntryId>,
        scope: QuestionScope,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Question>, Self::Error> {
        Ok(self
            .data
            .classified(true)
            .into_iter()
            .filter(|(_, v)| used.contains(&EntryId::from(v.entry_id)))
            .filter(|(_, v)| self.data.in_scope(v, scope))
            .filter_map(|(q, v)| self.data.to_question(q, v))
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn unused_ids(
        &mut self,
        used: &BTreeSet<EntryId>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<QuestionId>, Self::Error> {
        Ok(self
            .data
            .unused(used)
            .into_iter()
            .map(|(q, _)| QuestionId::from(q.id))
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn list_duplicates(
        &mut self,
        cap: usize,
    ) -> Result<Vec<(Question, Signature)>, Self::Error> {
        let mut by_signature: BTreeMap<Signature, Vec<(&QuestionRow, &VersionRow)>> =
            BTreeMap::new();
        for (q, v) in self.data.classified(false) {
            by_signature
                .entry(MockData::signature_of(q))
                .or_default()
                .push((q, v));
        }

        let mut rows = Vec::new();
        for (signature, members) in by_signature {
            if members.len() < 2 {
                continue;
            }
            for (q, v) in members {
                if let Some(question) = self.data.to_question(q, v) {
                    rows.push((question, signature.clone()));
                }
            }
        }
        rows.truncate(cap);
        Ok(rows)
    }

    async fn signatures_for(
        &mut self,
        ids: &[QuestionId],
    ) -> Result<Vec<(QuestionId, Signature)>, Self::Error> {
        let mut out = Vec::new();
        for id in ids {
            if let Some(q) = self.data.questions.get(&id.value()) {
                out.push((*id, MockData::signature_of(q)));
            }
        }
        out.sort_by_key(|(id, _)| *id);
        Ok(out)
    }

    async fn by_signatures(
        &mut self,
        signatures: &[Signature],
    ) -> Result<Vec<(QuestionId, Signature)>, Self::Error> {
        let wanted: BTreeSet<&Signature> = signatures.iter().collect();
        let mut out: Vec<(QuestionId, Signature)> = self
            .data
            .classified(false)
            .into_iter()
            .map(|(q, _)| (QuestionId::from(q.id), MockData::signature_of(q)))
            .filter(|(_, signature)| wanted.contains(signature))
            .collect();
        out.sort_by(|a, b| (&a.1, a.0).cmp(&(&b.1, b.0)));
        Ok(out)
    }

    async fn entry_ids_for(
        &mut self,
        ids: &[QuestionId],
    ) -> Result<BTreeSet<EntryId>, Self::Error> {
        let ids: BTreeSet<i64> = ids.iter().map(|id| id.value()).collect();
        Ok(self
            .data
            .versions
            .values()
            .filter(|v| ids.contains(&v.question_id))
            .map(|v| EntryId::from(v.entry_id))
            .collect())
    }

    async fn question_ids_for_entries(
        &mut self,
        entry_ids: &BTreeSet<EntryId>,
    ) -> Result<BTreeSet<QuestionId>, Self::Error> {
        Ok(self
            .data
            .versions
            .values()
            .filter(|v| entry_ids.contains(&EntryId::from(v.entry_id)))
            .map(|v| QuestionId::from(v.question_id))
            .collect())
    }

    async fn top_level_entry_pairs(
        &mut self,
        ids: &[QuestionId],
    ) -> Result<Vec<(QuestionId, EntryId)>, Self::Error> {
        let mut pairs = BTreeSet::new();
        for id in ids {
            let Some(q) = self.data.questions.get(&id.value()) else {
                continue;
            };
            if q.parent != 0 {
                continue;
            }
            for v in self.data.versions.values() {
                if v.question_id == q.id {
                    pairs.insert((*id, EntryId::from(v.entry_id)));
                }
            }
        }
        Ok(pairs.into_iter().collect())
    }

    async fn qtypes_of(&mut self, ids: &[QuestionId]) -> Result<Vec<String>, Self::Error> {
        let ids: BTreeSet<i64> = ids.iter().map(|id| id.value()).collect();
        let qtypes: BTreeSet<String> = self
            .data
            .questions
            .values()
            .filter(|q| ids.contains(&q.id))
            .map(|q| q.qtype.clone())
            .collect();
        Ok(qtypes.into_iter().collect())
    }

    async fn delete_type_options(
        &mut self,
        qtype: &str,
        ids: &[QuestionId],
    ) -> Result<u64, Self::Error> {
        if qtype == "missingtype" {
            return Ok(0);
        }
        let table = format!("qtype_{qtype}_options");
        let Some(rows) = self.data.qtype_options.get_mut(&table) else {
            return Ok(0);
        };
        let ids: BTreeSet<i64> = ids.iter().map(|id| id.value()).collect();
        let before = rows.len();
        rows.retain(|question_id| !ids.contains(question_id));
        Ok((before - rows.len()) as u64)
    }

    async fn delete_versions(&mut self, ids: &[QuestionId]) -> Result<u64, Self::Error> {
        let ids: BTreeSet<i64> = ids.iter().map(|id| id.value()).collect();
        let before = self.data.versions.len();
        self.data.versions.retain(|_, v| !ids.contains(&v.question_id));
        Ok((before - self.data.versions.len()) as u64)
    }

    async fn delete_dangling_entries(&mut self) -> Result<u64, Self::Error> {
        let live: BTreeSet<i64> = self.data.versions.values().map(|v| v.entry_id).collect();
        let before = self.data.entries.len();
        self.data.entries.retain(|id, _| live.contains(id));
        Ok((before - self.data.entries.len()) as u64)
    }

    async fn delete_questions(&mut self, ids: &[QuestionId]) -> Result<u64, Self::Error> {
        if self.data.fail_delete_questions {
            return Err(MockError("injected failure deleting questions".to_owned()));
        }
        let ids: BTreeSet<i64> = ids.iter().map(|id| id.value()).collect();
        let before = self.data.questions.len();
        self.data.questions.retain(|id, _| !ids.contains(id));
        Ok((before - self.data.questions.len()) as u64)
    }
}

#[async_trait]
impl AnswerRepository for MockAccess<'_> {
    type Error = MockError;

    async fn count_orphaned(&mut self) -> Result<usize, Self::Error> {
        Ok(self
            .data
            .answers
            .values()
            .filter(|a| self.data.is_orphaned_answer(a))
            .count())
    }

    async fn list_orphaned(&mut self, cap: usize) -> Result<Vec<Answer>, Self::Error> {
        Ok(self
            .data
            .answers
            .values()
            .filter(|a| self.data.is_orphaned_answer(a))
            .map(MockData::to_answer)
            .take(cap)
            .collect())
    }

    async fn orphaned_ids(
        &mut self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<AnswerId>, Self::Error> {
        Ok(self
            .data
            .answers
            .values()
            .filter(|a| self.data.is_orphaned_answer(a))
            .map(|a| AnswerId::from(a.id))
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn count_unused(&mut self, used: &BTreeSet<EntryId>) -> Result<usize, Self::Error> {
        let unused: BTreeSet<i64> = self.data.unused(used).iter().map(|(q, _)| q.id).collect();
        Ok(self
            .data
            .answers
            .values()
            .filter(|a| unused.contains(&a.question_id))
            .count())
    }

    async fn list_unused(
        &mut self,
        used: &BTreeSet<EntryId>,
        cap: usize,
    ) -> Result<Vec<UnusedAnswer>, Self::Error> {
        let unused: BTreeSet<i64> = self.data.unused(used).iter().map(|(q, _)| q.id).collect();
        Ok(self
            .data
            .answers
            .values()
            .filter(|a| unused.contains(&a.question_id))
            .take(cap)
            .map(|a| UnusedAnswer {
                answer: MockData::to_answer(a),
                question_name: self
                    .data
                    .questions
                    .get(&a.question_id)
                    .map(|q| q.name.clone())
                    .unwrap_or_default(),
            })
            .collect())
    }

    async fn unused_ids(
        &mut self,
        used: &BTreeSet<EntryId>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<AnswerId>, Self::Error> {
        let unused: BTreeSet<i64> = self.data.unused(used).iter().map(|(q, _)| q.id).collect();
        Ok(self
            .data
            .answers
            .values()
            .filter(|a| unused.contains(&a.question_id))
            .map(|a| AnswerId::from(a.id))
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn question_ids_for(
        &mut self,
        ids: &[AnswerId],
    ) -> Result<BTreeSet<QuestionId>, Self::Error> {
        let ids: BTreeSet<i64> = ids.iter().map(|id| id.value()).collect();
        Ok(self
            .data
            .answers
            .values()
            .filter(|a| ids.contains(&a.id))
            .map(|a| QuestionId::from(a.question_id))
            .collect())
    }

    async fn filter_orphaned(&mut self, ids: &[AnswerId]) -> Result<Vec<AnswerId>, Self::Error> {
        let ids: BTreeSet<i64> = ids.iter().map(|id| id.value()).collect();
        Ok(self
            .data
            .answers
            .values()
            .filter(|a| ids.contains(&a.id) && self.data.is_orphaned_answer(a))
            .map(|a| AnswerId::from(a.id))
            .collect())
    }

    async fn ids_for_questions(
        &mut self,
        ids: &[AnswerId],
        questions: &BTreeSet<QuestionId>,
    ) -> Result<Vec<AnswerId>, Self::Error> {
        let ids: BTreeSet<i64> = ids.iter().map(|id| id.value()).collect();
        Ok(self
            .data
            .answers
            .values()
            .filter(|a| {
                ids.contains(&a.id) && questions.contains(&QuestionId::from(a.question_id))
            })
            .map(|a| AnswerId::from(a.id))
            .collect())
    }

    async fn delete_by_ids(&mut self, ids: &[AnswerId]) -> Result<u64, Self::Error> {
        if self.data.fail_delete_answers {
            return Err(MockError("injected failure deleting answers".to_owned()));
        }
        let ids: BTreeSet<i64> = ids.iter().map(|id| id.value()).collect();
        let before = self.data.answers.len();
        self.data.answers.retain(|id, _| !ids.contains(id));
        Ok((before - self.data.answers.len()) as u64)
    }

    async fn delete_for_questions(&mut self, ids: &[QuestionId]) -> Result<u64, Self::Error> {
        let ids: BTreeSet<i64> = ids.iter().map(|id| id.value()).collect();
        let before = self.data.answers.len();
        self.data
            .answers
            .retain(|_, a| !ids.contains(&a.question_id));
        Ok((before - self.data.answers.len()) as u64)
    }
}

#[async_trait]
impl StatsRepository for MockAccess<'_> {
    type Error = MockError;

    async fn count_top_level_questions(&mut self) -> Result<usize, Self::Error> {
        Ok(self.data.classified(true).len())
    }

    async fn count_duplicated_questions(&mut self) -> Result<usize, Self::Error> {
        let mut by_signature: BTreeMap<Signature, usize> = BTreeMap::new();
        for (q, _) in self.data.classified(false) {
            *by_signature.entry(MockData::signature_of(q)).or_default() += 1;
        }
        Ok(by_signature
            .values()
            .filter(|count| **count > 1)
            .map(|count| count - 1)
            .sum())
    }

    async fn table_rows(&mut self, table: &str) -> Result<Option<u64>, Self::Error> {
        let rows = match table {
            "question" => self.data.questions.len(),
            "question_answers" => self.data.answers.len(),
            "question_versions" => self.data.versions.len(),
            "question_bank_entries" => self.data.entries.len(),
            "question_categories" => self.data.categories.len(),
            "question_references" => self.data.references.len(),
            other => match self.data.qtype_options.get(other) {
                Some(rows) => rows.len(),
                None => return Ok(None),
            },
        };
        Ok(Some(rows as u64))
    }
}

impl RepositoryAccess for MockRepository {
    type Error = MockError;

    fn usage<'c>(&'c mut self) -> Box<dyn UsageRepository<Error = Self::Error> + 'c> {
        Box::new(MockAccess {
            data: &mut self.staged,
        })
    }

    fn question<'c>(&'c mut self) -> Box<dyn QuestionRepository<Error = Self::Error> + 'c> {
        Box::new(MockAccess {
            data: &mut self.staged,
        })
    }

    fn answer<'c>(&'c mut self) -> Box<dyn AnswerRepository<Error = Self::Error> + 'c> {
        Box::new(MockAccess {
            data: &mut self.staged,
        })
    }

    fn stats<'c>(&'c mut self) -> Box<dyn StatsRepository<Error = Self::Error> + 'c> {
        Box::new(MockAccess {
            data: &mut self.staged,
        })
    }
}

impl RepositoryTransaction for MockRepository {
    type Error = MockError;

    fn save(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>> {
        let MockRepository { shared, staged } = *self;
        Box::pin(async move {
            *shared.lock().unwrap() = staged;
            Ok(())
        })
    }

    fn cancel(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>> {
        Box::pin(async move { Ok(()) })
    }
}

/// A [`RepositoryFactory`] handing out [`MockRepository`] instances
/// over one shared data set
#[derive(Clone, Default)]
pub struct MockRepositoryFactory {
    data: Arc<Mutex<MockData>>,
}

impl MockRepositoryFactory {
    /// Create a factory over the given data set
    #[must_use]
    pub fn new(data: MockData) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
        }
    }

    /// A copy of the current shared data, for assertions
    #[must_use]
    pub fn snapshot(&self) -> MockData {
        self.data.lock().unwrap().clone()
    }

    /// Mutate the shared data in place, e.g. to interleave changes
    /// between classification and deletion
    pub fn mutate(&self, f: impl FnOnce(&mut MockData)) {
        f(&mut self.data.lock().unwrap());
    }
}

#[async_trait]
impl RepositoryFactory for MockRepositoryFactory {
    async fn create(&self) -> Result<BoxRepository, RepositoryError> {
        let staged = self.data.lock().unwrap().clone();
        let repo = MockRepository {
            shared: Arc::clone(&self.data),
            staged,
        };
        Ok(Box::new(MapErr::new(repo, RepositoryError::from_error)))
    }
}
