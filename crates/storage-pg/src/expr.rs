// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! Query fragments shared between the repositories.

use qbc_data_model::QuestionVersionStatus;
use sea_query::{
    Alias, Condition, Expr, Func, JoinType, PostgresQueryBuilder, Query,
    SelectStatement, SimpleExpr,
};
use sea_query_binder::SqlxBinder;
use sqlx::PgConnection;

use crate::{
    DatabaseError, TracedExecute,
    iden::{QuestionBankEntries, QuestionCategories, QuestionVersions, Questions},
};

/// Values per `IN` list. Large id sets are split so we never exceed
/// the backend's bind parameter limits.
pub(crate) const IN_CHUNK: usize = 10_000;

/// Alias under which the current version row is joined
pub(crate) fn qv() -> Alias {
    Alias::new("qv")
}

#[derive(sea_query::Iden)]
#[iden = "MD5"]
struct Md5Func;

#[derive(sea_query::Iden)]
#[iden = "CONCAT"]
struct ConcatFunc;

/// The duplicate-group signature of the `question` row:
/// `CONCAT(name, '-', qtype, '-', MD5(questiontext))`
pub(crate) fn signature_expr() -> SimpleExpr {
    Func::cust(ConcatFunc)
        .arg(Expr::col((Questions::Table, Questions::Name)))
        .arg("-")
        .arg(Expr::col((Questions::Table, Questions::Qtype)))
        .arg("-")
        .arg(Func::cust(Md5Func).arg(Expr::col((Questions::Table, Questions::QuestionText))))
        .into()
}

/// `NOT EXISTS` a later non-hidden version of the same bank entry,
/// making the joined `qv` row the current version
pub(crate) fn is_current_version() -> SimpleExpr {
    let newer = Alias::new("newer");
    Expr::exists(
        Query::select()
            .expr(Expr::val(1))
            .from_as(QuestionVersions::Table, newer.clone())
            .and_where(
                Expr::col((newer.clone(), QuestionVersions::QuestionBankEntryId))
                    .equals((qv(), QuestionVersions::QuestionBankEntryId)),
            )
            .and_where(
                Expr::col((newer.clone(), QuestionVersions::Version))
                    .gt(Expr::col((qv(), QuestionVersions::Version))),
            )
            .and_where(
                Expr::col((newer, QuestionVersions::Status))
                    .ne(QuestionVersionStatus::Hidden.as_str()),
            )
            .take(),
    )
    .not()
}

/// Join the current version row of each `question` row as `qv`,
/// restricted to top-level questions. With `ready_only` the current
/// version must be ready, otherwise merely not hidden.
pub(crate) fn join_current_version(select: &mut SelectStatement, ready_only: bool) {
    let status = if ready_only {
        Expr::col((qv(), QuestionVersions::Status)).eq(QuestionVersionStatus::Ready.as_str())
    } else {
        Expr::col((qv(), QuestionVersions::Status)).ne(QuestionVersionStatus::Hidden.as_str())
    };

    select
        .join_as(
            JoinType::InnerJoin,
            QuestionVersions::Table,
            qv(),
            Expr::col((qv(), QuestionVersions::QuestionId))
                .equals((Questions::Table, Questions::Id)),
        )
        .and_where(Expr::col((Questions::Table, Questions::Parent)).eq(0))
        .and_where(status)
        .and_where(is_current_version());
}

/// Join the bank entry and category rows of the already joined `qv`
/// version row
pub(crate) fn join_category(select: &mut SelectStatement) {
    select
        .inner_join(
            QuestionBankEntries::Table,
            Expr::col((QuestionBankEntries::Table, QuestionBankEntries::Id))
                .equals((qv(), QuestionVersions::QuestionBankEntryId)),
        )
        .inner_join(
            QuestionCategories::Table,
            Expr::col((QuestionCategories::Table, QuestionCategories::Id))
                .equals((QuestionBankEntries::Table, QuestionBankEntries::QuestionCategoryId)),
        );
}

/// `expr IN (…)`, split into [`IN_CHUNK`]-sized lists `OR`ed together.
/// An empty value set yields a never-matching condition.
pub(crate) fn in_chunks<V>(expr: impl Into<SimpleExpr>, values: &[V]) -> Condition
where
    V: Into<sea_query::Value> + Clone,
{
    if values.is_empty() {
        return Condition::any().add(SimpleExpr::from(Expr::val(false)));
    }

    let expr = expr.into();
    let mut condition = Condition::any();
    for chunk in values.chunks(IN_CHUNK) {
        condition = condition.add(Expr::expr(expr.clone()).is_in(chunk.iter().cloned()));
    }
    condition
}

/// Whether a table of the given name exists in the connected database
pub(crate) async fn table_exists(
    conn: &mut PgConnection,
    table: &str,
) -> Result<bool, DatabaseError> {
    let (sql, arguments) = Query::select()
        .expr(Expr::exists(
            Query::select()
                .expr(Expr::val(1))
                .from((Alias::new("information_schema"), Alias::new("tables")))
                .and_where(Expr::col(Alias::new("table_name")).eq(table))
                .take(),
        ))
        .build_sqlx(PostgresQueryBuilder);

    let exists: bool = sqlx::query_scalar_with(&sql, arguments)
        .traced()
        .fetch_one(conn)
        .await?;

    Ok(exists)
}

/// `expr NOT IN (…)`, split into [`IN_CHUNK`]-sized lists `AND`ed
/// together. An empty value set yields an always-matching condition.
pub(crate) fn not_in_chunks<V>(expr: impl Into<SimpleExpr>, values: &[V]) -> Condition
where
    V: Into<sea_query::Value> + Clone,
{
    let expr = expr.into();
    let mut condition = Condition::all();
    for chunk in values.chunks(IN_CHUNK) {
        condition = condition.add(Expr::expr(expr.clone()).is_not_in(chunk.iter().cloned()));
    }
    condition
}
