// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! [`UsageRepository`] implementation reading the quiz slot
//! references.

use std::collections::BTreeSet;

use async_trait::async_trait;
use qbc_data_model::EntryId;
use qbc_storage::UsageRepository;
use sea_query::{Expr, PostgresQueryBuilder, Query};
use sea_query_binder::SqlxBinder;
use sqlx::PgConnection;

use crate::{DatabaseError, TracedExecute, iden::QuestionReferences};

/// The component recorded by the quiz subsystem on its references
const QUIZ_COMPONENT: &str = "mod_quiz";

/// The question area recorded for quiz slots
const AREA_SLOT: &str = "slot";

/// An implementation of [`UsageRepository`] for a PostgreSQL
/// connection
pub struct PgUsageRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgUsageRepository<'c> {
    /// Create a new [`PgUsageRepository`] from an active connection
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl UsageRepository for PgUsageRepository<'_> {
    type Error = DatabaseError;

    #[tracing::instrument(
        name = "db.usage.used_entry_ids",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn used_entry_ids(&mut self) -> Result<BTreeSet<EntryId>, Self::Error> {
        let (sql, arguments) = Query::select()
            .distinct()
            .column(QuestionReferences::QuestionBankEntryId)
            .from(QuestionReferences::Table)
            .and_where(Expr::col(QuestionReferences::Component).eq(QUIZ_COMPONENT))
            .and_where(Expr::col(QuestionReferences::QuestionArea).eq(AREA_SLOT))
            .build_sqlx(PostgresQueryBuilder);

        let ids: Vec<i64> = sqlx::query_scalar_with(&sql, arguments)
            .traced()
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(ids.into_iter().map(EntryId::from).collect())
    }
}
