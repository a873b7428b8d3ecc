// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! [`QuestionRepository`] implementation over the question, version
//! and bank entry tables.

use std::collections::BTreeSet;

use async_trait::async_trait;
use qbc_data_model::{EntryId, Question, QuestionId, Signature};
use qbc_storage::{QuestionRepository, QuestionScope};
use sea_query::{
    Alias, Expr, Func, Order, PostgresQueryBuilder, Query, SelectStatement,
};
use sea_query_binder::SqlxBinder;
use sqlx::PgConnection;

use crate::{
    DatabaseError, TracedExecute,
    expr::{
        in_chunks, join_category, join_current_version, not_in_chunks, qv, signature_expr,
        table_exists,
    },
    filter::StatementExt,
    iden::{QuestionBankEntries, QuestionCategories, QuestionVersions, Questions},
};

/// An implementation of [`QuestionRepository`] for a PostgreSQL
/// connection
pub struct PgQuestionRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgQuestionRepository<'c> {
    /// Create a new [`PgQuestionRepository`] from an active connection
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

#[derive(sqlx::FromRow)]
struct QuestionLookup {
    question_id: i64,
    question_name: String,
    question_qtype: String,
    question_text: String,
    question_parent: i64,
    category_id: i64,
    category_name: String,
    version: i64,
    entry_id: i64,
}

impl From<QuestionLookup> for Question {
    fn from(value: QuestionLookup) -> Self {
        Question {
            id: QuestionId::from(value.question_id),
            name: value.question_name,
            qtype: value.question_qtype,
            question_text: value.question_text,
            parent: value.question_parent,
            category_id: value.category_id,
            category_name: value.category_name,
            version: value.version,
            entry_id: EntryId::from(value.entry_id),
        }
    }
}

#[derive(sqlx::FromRow)]
struct DuplicateLookup {
    #[sqlx(flatten)]
    question: QuestionLookup,
    signature: String,
}

/// Select the columns [`QuestionLookup`] maps from. The statement must
/// have the version and category joins applied.
fn question_columns(select: &mut SelectStatement) {
    select
        .expr_as(
            Expr::col((Questions::Table, Questions::Id)),
            Alias::new("question_id"),
        )
        .expr_as(
            Expr::col((Questions::Table, Questions::Name)),
            Alias::new("question_name"),
        )
        .expr_as(
            Expr::col((Questions::Table, Questions::Qtype)),
            Alias::new("question_qtype"),
        )
        .expr_as(
            Expr::col((Questions::Table, Questions::QuestionText)),
            Alias::new("question_text"),
        )
        .expr_as(
            Expr::col((Questions::Table, Questions::Parent)),
            Alias::new("question_parent"),
        )
        .expr_as(
            Expr::col((QuestionCategories::Table, QuestionCategories::Id)),
            Alias::new("category_id"),
        )
        .expr_as(
            Expr::col((QuestionCategories::Table, QuestionCategories::Name)),
            Alias::new("category_name"),
        )
        .expr_as(
            Expr::col((qv(), QuestionVersions::Version)),
            Alias::new("version"),
        )
        .expr_as(
            Expr::col((qv(), QuestionVersions::QuestionBankEntryId)),
            Alias::new("entry_id"),
        );
}

/// Subquery listing the signatures occurring more than once among
/// top-level questions with a current non-hidden version
fn duplicated_signatures() -> SelectStatement {
    let mut select = Query::select();
    select.expr(signature_expr()).from(Questions::Table);
    join_current_version(&mut select, false);
    select
        .add_group_by([signature_expr()])
        .and_having(Expr::expr(Func::count(Expr::col((Questions::Table, Questions::Id)))).gt(1));
    select
}

/// Only plain identifier characters may reach the option table name;
/// the sentinel type of deleted plugins has no table of its own.
fn is_safe_qtype(qtype: &str) -> bool {
    !qtype.is_empty()
        && qtype != "missingtype"
        && qtype
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[async_trait]
impl QuestionRepository for PgQuestionRepository<'_> {
    type Error = DatabaseError;

    #[tracing::instrument(
        name = "db.question.count_unused",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn count_unused(
        &mut self,
        used: &BTreeSet<EntryId>,
        scope: QuestionScope,
    ) -> Result<usize, Self::Error> {
        let used: Vec<i64> = used.iter().map(|id| id.value()).collect();

        let mut select = Query::select();
        select
            .expr(Func::count_distinct(Expr::col((
                Questions::Table,
                Questions::Id,
            ))))
            .from(Questions::Table);
        join_current_version(&mut select, true);
        join_category(&mut select);
        select
            .cond_where(not_in_chunks(
                Expr::col((qv(), QuestionVersions::QuestionBankEntryId)),
                &used,
            ))
            .apply_filter(scope);

        let (sql, arguments) = select.build_sqlx(PostgresQueryBuilder);
        let count: i64 = sqlx::query_scalar_with(&sql, arguments)
            .traced()
            .fetch_one(&mut *self.conn)
            .await?;

        count.try_into().map_err(DatabaseError::to_invalid_operation)
    }

    #[tracing::instrument(
        name = "db.question.count_used",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn count_used(
        &mut self,
        used: &BTreeSet<EntryId>,
        scope: QuestionScope,
    ) -> Result<usize, Self::Error> {
        let used: Vec<i64> = used.iter().map(|id| id.value()).collect();

        let mut select = Query::select();
        select
            .expr(Func::count_distinct(Expr::col((
                Questions::Table,
                Questions::Id,
            ))))
            .from(Questions::Table);
        join_current_version(&mut select, true);
        join_category(&mut select);
        select
            .cond_where(in_chunks(
                Expr::col((qv(), QuestionVersions::QuestionBankEntryId)),
                &used,
            ))
            .apply_filter(scope);

        let (sql, arguments) = select.build_sqlx(PostgresQueryBuilder);
        let count: i64 = sqlx::query_scalar_with(&sql, arguments)
            .traced()
            .fetch_one(&mut *self.conn)
            .await?;

        count.try_into().map_err(DatabaseError::to_invalid_operation)
    }

    #[tracing::instrument(
        name = "db.question.list_unused",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn list_unused(
        &mut self,
        used: &BTreeSet<EntryId>,
        scope: QuestionScope,
        cap: usize,
    ) -> Result<Vec<Question>, Self::Error> {
        let used: Vec<i64> = used.iter().map(|id| id.value()).collect();

        let mut select = Query::select();
        select.from(Questions::Table);
        join_current_version(&mut select, true);
        join_category(&mut select);
        question_columns(&mut select);
        select
            .cond_where(not_in_chunks(
                Expr::col((qv(), QuestionVersions::QuestionBankEntryId)),
                &used,
            ))
            .apply_filter(scope)
            .order_by((Questions::Table, Questions::Id), Order::Asc)
            .limit(cap as u64);

        let (sql, arguments) = select.build_sqlx(PostgresQueryBuilder);
        let rows: Vec<QuestionLookup> = sqlx::query_as_with(&sql, arguments)
            .traced()
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows.into_iter().map(Question::from).collect())
    }

    #[tracing::instrument(
        name = "db.question.list_used",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn list_used(
        &mut self,
        used: &BTreeSet<EntryId>,
        scope: QuestionScope,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Question>, Self::Error> {
        let used: Vec<i64> = used.iter().map(|id| id.value()).collect();

        let mut select = Query::select();
        select.from(Questions::Table);
        join_current_version(&mut select, true);
        join_category(&mut select);
        question_columns(&mut select);
        select
            .cond_where(in_chunks(
                Expr::col((qv(), QuestionVersions::QuestionBankEntryId)),
                &used,
            ))
            .apply_filter(scope)
            .order_by((Questions::Table, Questions::Id), Order::Asc)
            .offset(offset as u64)
            .limit(limit as u64);

        let (sql, arguments) = select.build_sqlx(PostgresQueryBuilder);
        let rows: Vec<QuestionLookup> = sqlx::query_as_with(&sql, arguments)
            .traced()
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows.into_iter().map(Question::from).collect())
    }

    #[tracing::instrument(
        name = "db.question.unused_ids",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn unused_ids(
        &mut self,
        used: &BTreeSet<EntryId>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<QuestionId>, Self::Error> {
        let used: Vec<i64> = used.iter().map(|id| id.value()).collect();

        let mut select = Query::select();
        select
            .column((Questions::Table, Questions::Id))
            .from(Questions::Table);
        join_current_version(&mut select, true);
        select
            .cond_where(not_in_chunks(
                Expr::col((qv(), QuestionVersions::QuestionBankEntryId)),
                &used,
            ))
            .order_by((Questions::Table, Questions::Id), Order::Asc)
            .offset(offset as u64)
            .limit(limit as u64);

        let (sql, arguments) = select.build_sqlx(PostgresQueryBuilder);
        let ids: Vec<i64> = sqlx::query_scalar_with(&sql, arguments)
            .traced()
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(ids.into_iter().map(QuestionId::from).collect())
    }

    #[tracing::instrument(
        name = "db.question.list_duplicates",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn list_duplicates(
        &mut self,
        cap: usize,
    ) -> Result<Vec<(Question, Signature)>, Self::Error> {
        let mut select = Query::select();
        select.from(Questions::Table);
        join_current_version(&mut select, false);
        join_category(&mut select);
        question_columns(&mut select);
        select
            .expr_as(signature_expr(), Alias::new("signature"))
            .and_where(Expr::expr(signature_expr()).in_subquery(duplicated_signatures()))
            .order_by_expr(signature_expr(), Order::Asc)
            .order_by((Questions::Table, Questions::Id), Order::Asc)
            .limit(cap as u64);

        let (sql, arguments) = select.build_sqlx(PostgresQueryBuilder);
        let rows: Vec<DuplicateLookup> = sqlx::query_as_with(&sql, arguments)
            .traced()
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| (Question::from(row.question), Signature::from_raw(row.signature)))
            .collect())
    }

    #[tracing::instrument(
        name = "db.question.signatures_for",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn signatures_for(
        &mut self,
        ids: &[QuestionId],
    ) -> Result<Vec<(QuestionId, Signature)>, Self::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = ids.iter().map(|id| id.value()).collect();

        let (sql, arguments) = Query::select()
            .column((Questions::Table, Questions::Id))
            .expr(signature_expr())
            .from(Questions::Table)
            .cond_where(in_chunks(
                Expr::col((Questions::Table, Questions::Id)),
                &ids,
            ))
            .order_by((Questions::Table, Questions::Id), Order::Asc)
            .build_sqlx(PostgresQueryBuilder);

        let rows: Vec<(i64, String)> = sqlx::query_as_with(&sql, arguments)
            .traced()
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, signature)| (QuestionId::from(id), Signature::from_raw(signature)))
            .collect())
    }

    #[tracing::instrument(
        name = "db.question.by_signatures",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn by_signatures(
        &mut self,
        signatures: &[Signature],
    ) -> Result<Vec<(QuestionId, Signature)>, Self::Error> {
        if signatures.is_empty() {
            return Ok(Vec::new());
        }
        let values: Vec<String> = signatures
            .iter()
            .map(|signature| signature.as_str().to_owned())
            .collect();

        let mut select = Query::select();
        select
            .column((Questions::Table, Questions::Id))
            .expr(signature_expr())
            .from(Questions::Table);
        join_current_version(&mut select, false);
        select
            .cond_where(in_chunks(signature_expr(), &values))
            .order_by_expr(signature_expr(), Order::Asc)
            .order_by((Questions::Table, Questions::Id), Order::Asc);

        let (sql, arguments) = select.build_sqlx(PostgresQueryBuilder);
        let rows: Vec<(i64, String)> = sqlx::query_as_with(&sql, arguments)
            .traced()
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, signature)| (QuestionId::from(id), Signature::from_raw(signature)))
            .collect())
    }

    #[tracing::instrument(
        name = "db.question.entry_ids_for",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn entry_ids_for(
        &mut self,
        ids: &[QuestionId],
    ) -> Result<BTreeSet<EntryId>, Self::Error> {
        if ids.is_empty() {
            return Ok(BTreeSet::new());
        }
        let ids: Vec<i64> = ids.iter().map(|id| id.value()).collect();

        let (sql, arguments) = Query::select()
            .distinct()
            .column(QuestionVersions::QuestionBankEntryId)
            .from(QuestionVersions::Table)
            .cond_where(in_chunks(Expr::col(QuestionVersions::QuestionId), &ids))
            .build_sqlx(PostgresQueryBuilder);

        let rows: Vec<i64> = sqlx::query_scalar_with(&sql, arguments)
            .traced()
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows.into_iter().map(EntryId::from).collect())
    }

    #[tracing::instrument(
        name = "db.question.question_ids_for_entries",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn question_ids_for_entries(
        &mut self,
        entry_ids: &BTreeSet<EntryId>,
    ) -> Result<BTreeSet<QuestionId>, Self::Error> {
        if entry_ids.is_empty() {
            return Ok(BTreeSet::new());
        }
        let entry_ids: Vec<i64> = entry_ids.iter().map(|id| id.value()).collect();

        let (sql, arguments) = Query::select()
            .distinct()
            .column(QuestionVersions::QuestionId)
            .from(QuestionVersions::Table)
            .cond_where(in_chunks(
                Expr::col(QuestionVersions::QuestionBankEntryId),
                &entry_ids,
            ))
            .build_sqlx(PostgresQueryBuilder);

        let rows: Vec<i64> = sqlx::query_scalar_with(&sql, arguments)
            .traced()
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows.into_iter().map(QuestionId::from).collect())
    }

    #[tracing::instrument(
        name = "db.question.top_level_entry_pairs",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn top_level_entry_pairs(
        &mut self,
        ids: &[QuestionId],
    ) -> Result<Vec<(QuestionId, EntryId)>, Self::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = ids.iter().map(|id| id.value()).collect();

        let (sql, arguments) = Query::select()
            .distinct()
            .column((Questions::Table, Questions::Id))
            .column((QuestionVersions::Table, QuestionVersions::QuestionBankEntryId))
            .from(Questions::Table)
            .inner_join(
                QuestionVersions::Table,
                Expr::col((QuestionVersions::Table, QuestionVersions::QuestionId))
                    .equals((Questions::Table, Questions::Id)),
            )
            .cond_where(in_chunks(
                Expr::col((Questions::Table, Questions::Id)),
                &ids,
            ))
            .and_where(Expr::col((Questions::Table, Questions::Parent)).eq(0))
            .order_by((Questions::Table, Questions::Id), Order::Asc)
            .build_sqlx(PostgresQueryBuilder);

        let rows: Vec<(i64, i64)> = sqlx::query_as_with(&sql, arguments)
            .traced()
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(question, entry)| (QuestionId::from(question), EntryId::from(entry)))
            .collect())
    }

    #[tracing::instrument(
        name = "db.question.qtypes_of",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn qtypes_of(&mut self, ids: &[QuestionId]) -> Result<Vec<String>, Self::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = ids.iter().map(|id| id.value()).collect();

        let (sql, arguments) = Query::select()
            .distinct()
            .column(Questions::Qtype)
            .from(Questions::Table)
            .cond_where(in_chunks(Expr::col(Questions::Id), &ids))
            .order_by(Questions::Qtype, Order::Asc)
            .build_sqlx(PostgresQueryBuilder);

        let qtypes: Vec<String> = sqlx::query_scalar_with(&sql, arguments)
            .traced()
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(qtypes)
    }

    #[tracing::instrument(
        name = "db.question.delete_type_options",
        skip_all,
        fields(db.query.text, question.qtype = qtype),
        err,
    )]
    async fn delete_type_options(
        &mut self,
        qtype: &str,
        ids: &[QuestionId],
    ) -> Result<u64, Self::Error> {
        if ids.is_empty() || !is_safe_qtype(qtype) {
            return Ok(0);
        }

        let table = format!("qtype_{qtype}_options");
        if !table_exists(&mut *self.conn, &table).await? {
            return Ok(0);
        }
        let ids: Vec<i64> = ids.iter().map(|id| id.value()).collect();

        let (sql, arguments) = Query::delete()
            .from_table(Alias::new(table))
            .cond_where(in_chunks(Expr::col(Alias::new("questionid")), &ids))
            .build_sqlx(PostgresQueryBuilder);

        let res = sqlx::query_with(&sql, arguments)
            .traced()
            .execute(&mut *self.conn)
            .await?;

        Ok(res.rows_affected())
    }

    #[tracing::instrument(
        name = "db.question.delete_versions",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn delete_versions(&mut self, ids: &[QuestionId]) -> Result<u64, Self::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let ids: Vec<i64> = ids.iter().map(|id| id.value()).collect();

        let (sql, arguments) = Query::delete()
            .from_table(QuestionVersions::Table)
            .cond_where(in_chunks(Expr::col(QuestionVersions::QuestionId), &ids))
            .build_sqlx(PostgresQueryBuilder);

        let res = sqlx::query_with(&sql, arguments)
            .traced()
            .execute(&mut *self.conn)
            .await?;

        Ok(res.rows_affected())
    }

    #[tracing::instrument(
        name = "db.question.delete_dangling_entries",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn delete_dangling_entries(&mut self) -> Result<u64, Self::Error> {
        let (sql, arguments) = Query::delete()
            .from_table(QuestionBankEntries::Table)
            .and_where(
                Expr::exists(
                    Query::select()
                        .expr(Expr::val(1))
                        .from(QuestionVersions::Table)
                        .and_where(
                            Expr::col((
                                QuestionVersions::Table,
                                QuestionVersions::QuestionBankEntryId,
                            ))
                            .equals((QuestionBankEntries::Table, QuestionBankEntries::Id)),
                        )
                        .take(),
                )
                .not(),
            )
            .build_sqlx(PostgresQueryBuilder);

        let res = sqlx::query_with(&sql, arguments)
            .traced()
            .execute(&mut *self.conn)
            .await?;

        Ok(res.rows_affected())
    }

    #[tracing::instrument(
        name = "db.question.delete_questions",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn delete_questions(&mut self, ids: &[QuestionId]) -> Result<u64, Self::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let ids: Vec<i64> = ids.iter().map(|id| id.value()).collect();

        let (sql, arguments) = Query::delete()
            .from_table(Questions::Table)
            .cond_where(in_chunks(Expr::col(Questions::Id), &ids))
            .build_sqlx(PostgresQueryBuilder);

        let res = sqlx::query_with(&sql, arguments)
            .traced()
            .execute(&mut *self.conn)
            .await?;

        Ok(res.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::is_safe_qtype;

    #[test]
    fn qtype_table_name_safety() {
        assert!(is_safe_qtype("multichoice"));
        assert!(is_safe_qtype("ddwtos"));
        assert!(is_safe_qtype("calculated_simple"));

        assert!(!is_safe_qtype(""));
        assert!(!is_safe_qtype("missingtype"));
        assert!(!is_safe_qtype("evil; drop table"));
        assert!(!is_safe_qtype("Upper"));
    }
}
