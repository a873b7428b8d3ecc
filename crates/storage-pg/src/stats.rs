// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! [`StatsRepository`] implementation computing the aggregate counts.

use async_trait::async_trait;
use qbc_storage::StatsRepository;
use sea_query::{Alias, Expr, ExprTrait, Func, PostgresQueryBuilder, Query};
use sea_query_binder::SqlxBinder;
use sqlx::PgConnection;

use crate::{
    DatabaseError, TracedExecute,
    expr::{join_current_version, signature_expr, table_exists},
    iden::Questions,
};

/// An implementation of [`StatsRepository`] for a PostgreSQL
/// connection
pub struct PgStatsRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgStatsRepository<'c> {
    /// Create a new [`PgStatsRepository`] from an active connection
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

/// Row counting goes through a dynamically named table, so only plain
/// identifiers are accepted
fn is_safe_table(table: &str) -> bool {
    !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[async_trait]
impl StatsRepository for PgStatsRepository<'_> {
    type Error = DatabaseError;

    #[tracing::instrument(
        name = "db.stats.count_top_level_questions",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn count_top_level_questions(&mut self) -> Result<usize, Self::Error> {
        let mut select = Query::select();
        select
            .expr(Func::count_distinct(Expr::col((
                Questions::Table,
                Questions::Id,
            ))))
            .from(Questions::Table);
        join_current_version(&mut select, true);

        let (sql, arguments) = select.build_sqlx(PostgresQueryBuilder);
        let count: i64 = sqlx::query_scalar_with(&sql, arguments)
            .traced()
            .fetch_one(&mut *self.conn)
            .await?;

        count.try_into().map_err(DatabaseError::to_invalid_operation)
    }

    #[tracing::instrument(
        name = "db.stats.count_duplicated_questions",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn count_duplicated_questions(&mut self) -> Result<usize, Self::Error> {
        // One keeper per group is retained, so the surplus is the
        // group size minus one, summed over all groups
        let mut groups = Query::select();
        groups
            .expr_as(
                Func::count(Expr::col((Questions::Table, Questions::Id))),
                Alias::new("members"),
            )
            .from(Questions::Table);
        join_current_version(&mut groups, false);
        groups.add_group_by([signature_expr()]).and_having(
            Expr::expr(Func::count(Expr::col((Questions::Table, Questions::Id)))).gt(1),
        );

        let (sql, arguments) = Query::select()
            .expr(
                Func::coalesce([
                    Func::sum(Expr::col(Alias::new("members")).sub(1)).into(),
                    Expr::val(0i64).into(),
                ])
                .cast_as(Alias::new("BIGINT")),
            )
            .from_subquery(groups, Alias::new("duplicate_groups"))
            .build_sqlx(PostgresQueryBuilder);

        let count: i64 = sqlx::query_scalar_with(&sql, arguments)
            .traced()
            .fetch_one(&mut *self.conn)
            .await?;

        count.try_into().map_err(DatabaseError::to_invalid_operation)
    }

    #[tracing::instrument(
        name = "db.stats.table_rows",
        skip_all,
        fields(db.query.text, db.table = table),
        err,
    )]
    async fn table_rows(&mut self, table: &str) -> Result<Option<u64>, Self::Error> {
        if !is_safe_table(table) {
            return Ok(None);
        }
        if !table_exists(&mut *self.conn, table).await? {
            return Ok(None);
        }

        let (sql, arguments) = Query::select()
            .expr(Func::count(Expr::val(1)))
            .from(Alias::new(table))
            .build_sqlx(PostgresQueryBuilder);

        let count: i64 = sqlx::query_scalar_with(&sql, arguments)
            .traced()
            .fetch_one(&mut *self.conn)
            .await?;

        let count = count
            .try_into()
            .map_err(DatabaseError::to_invalid_operation)?;
        Ok(Some(count))
    }
}

#[cfg(test)]
mod tests {
    use super::is_safe_table;

    #[test]
    fn table_name_safety() {
        assert!(is_safe_table("question_answers"));
        assert!(is_safe_table("question_bank_entries"));

        assert!(!is_safe_table(""));
        assert!(!is_safe_table("question; drop"));
        assert!(!is_safe_table("Question"));
    }
}
