// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! [`AnswerRepository`] implementation over the answer option table.

use std::collections::BTreeSet;

use async_trait::async_trait;
use qbc_data_model::{Answer, AnswerId, EntryId, QuestionId, UnusedAnswer};
use qbc_storage::AnswerRepository;
use sea_query::{
    Alias, Expr, Func, Order, PostgresQueryBuilder, Query, SelectStatement, SimpleExpr,
};
use sea_query_binder::SqlxBinder;
use sqlx::PgConnection;

use crate::{
    DatabaseError, TracedExecute,
    expr::{in_chunks, join_current_version, not_in_chunks, qv},
    iden::{QuestionAnswers, QuestionVersions, Questions},
};

/// An implementation of [`AnswerRepository`] for a PostgreSQL
/// connection
pub struct PgAnswerRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgAnswerRepository<'c> {
    /// Create a new [`PgAnswerRepository`] from an active connection
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

#[derive(sqlx::FromRow)]
struct AnswerLookup {
    answer_id: i64,
    question_id: i64,
    answer_text: String,
    fraction: f64,
    feedback: String,
}

impl From<AnswerLookup> for Answer {
    fn from(value: AnswerLookup) -> Self {
        Answer {
            id: AnswerId::from(value.answer_id),
            question_id: QuestionId::from(value.question_id),
            answer_text: value.answer_text,
            fraction: value.fraction,
            feedback: value.feedback,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UnusedAnswerLookup {
    #[sqlx(flatten)]
    answer: AnswerLookup,
    question_name: String,
}

/// Select the columns [`AnswerLookup`] maps from. The fraction column
/// is a fixed-point decimal in the store, cast for a clean `f64`
/// decode.
fn answer_columns(select: &mut SelectStatement) {
    select
        .expr_as(
            Expr::col((QuestionAnswers::Table, QuestionAnswers::Id)),
            Alias::new("answer_id"),
        )
        .expr_as(
            Expr::col((QuestionAnswers::Table, QuestionAnswers::Question)),
            Alias::new("question_id"),
        )
        .expr_as(
            Expr::col((QuestionAnswers::Table, QuestionAnswers::Answer)),
            Alias::new("answer_text"),
        )
        .expr_as(
            Expr::col((QuestionAnswers::Table, QuestionAnswers::Fraction))
                .cast_as(Alias::new("double precision")),
            Alias::new("fraction"),
        )
        .expr_as(
            Expr::col((QuestionAnswers::Table, QuestionAnswers::Feedback)),
            Alias::new("feedback"),
        );
}

/// `NOT EXISTS` a question row owning this answer
fn is_orphaned() -> SimpleExpr {
    Expr::exists(
        Query::select()
            .expr(Expr::val(1))
            .from(Questions::Table)
            .and_where(
                Expr::col((Questions::Table, Questions::Id))
                    .equals((QuestionAnswers::Table, QuestionAnswers::Question)),
            )
            .take(),
    )
    .not()
}

/// Join the owning question with its current ready version; answers
/// of questions outside that set don't count as unused
fn join_unused_question(select: &mut SelectStatement, used: &[i64]) {
    select.inner_join(
        Questions::Table,
        Expr::col((Questions::Table, Questions::Id))
            .equals((QuestionAnswers::Table, QuestionAnswers::Question)),
    );
    join_current_version(select, true);
    select.cond_where(not_in_chunks(
        Expr::col((qv(), QuestionVersions::QuestionBankEntryId)),
        used,
    ));
}

#[async_trait]
impl AnswerRepository for PgAnswerRepository<'_> {
    type Error = DatabaseError;

    #[tracing::instrument(
        name = "db.answer.count_orphaned",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn count_orphaned(&mut self) -> Result<usize, Self::Error> {
        let (sql, arguments) = Query::select()
            .expr(Func::count(Expr::col((
                QuestionAnswers::Table,
                QuestionAnswers::Id,
            ))))
            .from(QuestionAnswers::Table)
            .and_where(is_orphaned())
            .build_sqlx(PostgresQueryBuilder);

        let count: i64 = sqlx::query_scalar_with(&sql, arguments)
            .traced()
            .fetch_one(&mut *self.conn)
            .await?;

        count.try_into().map_err(DatabaseError::to_invalid_operation)
    }

    #[tracing::instrument(
        name = "db.answer.list_orphaned",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn list_orphaned(&mut self, cap: usize) -> Result<Vec<Answer>, Self::Error> {
        let mut select = Query::select();
        select.from(QuestionAnswers::Table);
        answer_columns(&mut select);
        select
            .and_where(is_orphaned())
            .order_by((QuestionAnswers::Table, QuestionAnswers::Id), Order::Asc)
            .limit(cap as u64);

        let (sql, arguments) = select.build_sqlx(PostgresQueryBuilder);
        let rows: Vec<AnswerLookup> = sqlx::query_as_with(&sql, arguments)
            .traced()
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows.into_iter().map(Answer::from).collect())
    }

    #[tracing::instrument(
        name = "db.answer.orphaned_ids",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn orphaned_ids(
        &mut self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<AnswerId>, Self::Error> {
        let (sql, arguments) = Query::select()
            .column((QuestionAnswers::Table, QuestionAnswers::Id))
            .from(QuestionAnswers::Table)
            .and_where(is_orphaned())
            .order_by((QuestionAnswers::Table, QuestionAnswers::Id), Order::Asc)
            .offset(offset as u64)
            .limit(limit as u64)
            .build_sqlx(PostgresQueryBuilder);

        let ids: Vec<i64> = sqlx::query_scalar_with(&sql, arguments)
            .traced()
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(ids.into_iter().map(AnswerId::from).collect())
    }

    #[tracing::instrument(
        name = "db.answer.count_unused",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn count_unused(&mut self, used: &BTreeSet<EntryId>) -> Result<usize, Self::Error> {
        let used: Vec<i64> = used.iter().map(|id| id.value()).collect();

        let mut select = Query::select();
        select
            .expr(Func::count_distinct(Expr::col((
                QuestionAnswers::Table,
                QuestionAnswers::Id,
            ))))
            .from(QuestionAnswers::Table);
        join_unused_question(&mut select, &used);

        let (sql, arguments) = select.build_sqlx(PostgresQueryBuilder);
        let count: i64 = sqlx::query_scalar_with(&sql, arguments)
            .traced()
            .fetch_one(&mut *self.conn)
            .await?;

        count.try_into().map_err(DatabaseError::to_invalid_operation)
    }

    #[tracing::instrument(
        name = "db.answer.list_unused",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn list_unused(
        &mut self,
        used: &BTreeSet<EntryId>,
        cap: usize,
    ) -> Result<Vec<UnusedAnswer>, Self::Error> {
        let used: Vec<i64> = used.iter().map(|id| id.value()).collect();

        let mut select = Query::select();
        select.from(QuestionAnswers::Table);
        answer_columns(&mut select);
        select.expr_as(
            Expr::col((Questions::Table, Questions::Name)),
            Alias::new("question_name"),
        );
        join_unused_question(&mut select, &used);
        select
            .order_by((QuestionAnswers::Table, QuestionAnswers::Id), Order::Asc)
            .limit(cap as u64);

        let (sql, arguments) = select.build_sqlx(PostgresQueryBuilder);
        let rows: Vec<UnusedAnswerLookup> = sqlx::query_as_with(&sql, arguments)
            .traced()
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| UnusedAnswer {
                answer: Answer::from(row.answer),
                question_name: row.question_name,
            })
            .collect())
    }

    #[tracing::instrument(
        name = "db.answer.unused_ids",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn unused_ids(
        &mut self,
        used: &BTreeSet<EntryId>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<AnswerId>, Self::Error> {
        let used: Vec<i64> = used.iter().map(|id| id.value()).collect();

        let mut select = Query::select();
        select
            .column((QuestionAnswers::Table, QuestionAnswers::Id))
            .from(QuestionAnswers::Table);
        join_unused_question(&mut select, &used);
        select
            .order_by((QuestionAnswers::Table, QuestionAnswers::Id), Order::Asc)
            .offset(offset as u64)
            .limit(limit as u64);

        let (sql, arguments) = select.build_sqlx(PostgresQueryBuilder);
        let ids: Vec<i64> = sqlx::query_scalar_with(&sql, arguments)
            .traced()
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(ids.into_iter().map(AnswerId::from).collect())
    }

    #[tracing::instrument(
        name = "db.answer.question_ids_for",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn question_ids_for(
        &mut self,
        ids: &[AnswerId],
    ) -> Result<BTreeSet<QuestionId>, Self::Error> {
        if ids.is_empty() {
            return Ok(BTreeSet::new());
        }
        let ids: Vec<i64> = ids.iter().map(|id| id.value()).collect();

        let (sql, arguments) = Query::select()
            .distinct()
            .column(QuestionAnswers::Question)
            .from(QuestionAnswers::Table)
            .cond_where(in_chunks(Expr::col(QuestionAnswers::Id), &ids))
            .build_sqlx(PostgresQueryBuilder);

        let rows: Vec<i64> = sqlx::query_scalar_with(&sql, arguments)
            .traced()
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows.into_iter().map(QuestionId::from).collect())
    }

    #[tracing::instrument(
        name = "db.answer.filter_orphaned",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn filter_orphaned(&mut self, ids: &[AnswerId]) -> Result<Vec<AnswerId>, Self::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = ids.iter().map(|id| id.value()).collect();

        let (sql, arguments) = Query::select()
            .column((QuestionAnswers::Table, QuestionAnswers::Id))
            .from(QuestionAnswers::Table)
            .cond_where(in_chunks(
                Expr::col((QuestionAnswers::Table, QuestionAnswers::Id)),
                &ids,
            ))
            .and_where(is_orphaned())
            .order_by((QuestionAnswers::Table, QuestionAnswers::Id), Order::Asc)
            .build_sqlx(PostgresQueryBuilder);

        let rows: Vec<i64> = sqlx::query_scalar_with(&sql, arguments)
            .traced()
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows.into_iter().map(AnswerId::from).collect())
    }

    #[tracing::instrument(
        name = "db.answer.ids_for_questions",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn ids_for_questions(
        &mut self,
        ids: &[AnswerId],
        questions: &BTreeSet<QuestionId>,
    ) -> Result<Vec<AnswerId>, Self::Error> {
        if ids.is_empty() || questions.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = ids.iter().map(|id| id.value()).collect();
        let questions: Vec<i64> = questions.iter().map(|id| id.value()).collect();

        let (sql, arguments) = Query::select()
            .column((QuestionAnswers::Table, QuestionAnswers::Id))
            .from(QuestionAnswers::Table)
            .cond_where(in_chunks(
                Expr::col((QuestionAnswers::Table, QuestionAnswers::Id)),
                &ids,
            ))
            .cond_where(in_chunks(
                Expr::col((QuestionAnswers::Table, QuestionAnswers::Question)),
                &questions,
            ))
            .order_by((QuestionAnswers::Table, QuestionAnswers::Id), Order::Asc)
            .build_sqlx(PostgresQueryBuilder);

        let rows: Vec<i64> = sqlx::query_scalar_with(&sql, arguments)
            .traced()
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows.into_iter().map(AnswerId::from).collect())
    }

    #[tracing::instrument(
        name = "db.answer.delete_by_ids",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn delete_by_ids(&mut self, ids: &[AnswerId]) -> Result<u64, Self::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let ids: Vec<i64> = ids.iter().map(|id| id.value()).collect();

        let (sql, arguments) = Query::delete()
            .from_table(QuestionAnswers::Table)
            .cond_where(in_chunks(Expr::col(QuestionAnswers::Id), &ids))
            .build_sqlx(PostgresQueryBuilder);

        let res = sqlx::query_with(&sql, arguments)
            .traced()
            .execute(&mut *self.conn)
            .await?;

        Ok(res.rows_affected())
    }

    #[tracing::instrument(
        name = "db.answer.delete_for_questions",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn delete_for_questions(&mut self, ids: &[QuestionId]) -> Result<u64, Self::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let ids: Vec<i64> = ids.iter().map(|id| id.value()).collect();

        let (sql, arguments) = Query::delete()
            .from_table(QuestionAnswers::Table)
            .cond_where(in_chunks(Expr::col(QuestionAnswers::Question), &ids))
            .build_sqlx(PostgresQueryBuilder);

        let res = sqlx::query_with(&sql, arguments)
            .traced()
            .execute(&mut *self.conn)
            .await?;

        Ok(res.rows_affected())
    }
}
