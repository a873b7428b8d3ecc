// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use std::ops::{Deref, DerefMut};

use async_trait::async_trait;
use futures_util::{FutureExt, TryFutureExt, future::BoxFuture};
use qbc_storage::{
    AnswerRepository, BoxRepository, BoxRepositoryFactory, MapErr, QuestionRepository,
    RepositoryAccess, RepositoryError, RepositoryFactory, RepositoryTransaction, StatsRepository,
    UsageRepository,
};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::Instrument;

use crate::{
    DatabaseError, answer::PgAnswerRepository, question::PgQuestionRepository,
    stats::PgStatsRepository, usage::PgUsageRepository,
};

/// An implementation of the [`RepositoryFactory`] trait backed by a
/// PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgRepositoryFactory {
    pool: PgPool,
}

impl PgRepositoryFactory {
    /// Create a new [`PgRepositoryFactory`] from a PostgreSQL
    /// connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Box the factory
    #[must_use]
    pub fn boxed(self) -> BoxRepositoryFactory {
        Box::new(self)
    }

    /// Get the underlying PostgreSQL connection pool
    #[must_use]
    pub fn pool(&self) -> PgPool {
        self.pool.clone()
    }
}

#[async_trait]
impl RepositoryFactory for PgRepositoryFactory {
    async fn create(&self) -> Result<BoxRepository, RepositoryError> {
        let repo = PgRepository::from_pool(&self.pool)
            .await
            .map_err(RepositoryError::from_error)?
            .boxed();

        Ok(repo)
    }
}

/// An implementation of the [`Repository`] trait backed by a
/// PostgreSQL transaction.
pub struct PgRepository<C = Transaction<'static, Postgres>> {
    conn: C,
}

impl PgRepository {
    /// Create a new [`PgRepository`] from a PostgreSQL connection
    /// pool, starting a transaction.
    ///
    /// # Errors
    ///
    /// Returns a [`DatabaseError`] if the transaction could not be
    /// started.
    pub async fn from_pool(pool: &PgPool) -> Result<Self, DatabaseError> {
        let txn = pool.begin().await?;
        Ok(Self::from_conn(txn))
    }

    /// Transform the repository into a type-erased [`BoxRepository`]
    #[must_use]
    pub fn boxed(self) -> BoxRepository {
        Box::new(MapErr::new(self, RepositoryError::from_error))
    }
}

impl<C> PgRepository<C> {
    /// Create a new [`PgRepository`] from an existing PostgreSQL
    /// connection with a transaction
    pub fn from_conn(conn: C) -> Self {
        PgRepository { conn }
    }

    /// Consume this [`PgRepository`], returning the underlying
    /// connection.
    pub fn into_inner(self) -> C {
        self.conn
    }
}

impl<C> AsRef<C> for PgRepository<C> {
    fn as_ref(&self) -> &C {
        &self.conn
    }
}

impl<C> AsMut<C> for PgRepository<C> {
    fn as_mut(&mut self) -> &mut C {
        &mut self.conn
    }
}

impl<C> Deref for PgRepository<C> {
    type Target = C;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl<C> DerefMut for PgRepository<C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

impl RepositoryTransaction for PgRepository {
    type Error = DatabaseError;

    fn save(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>> {
        let span = tracing::info_span!("db.save");
        self.conn
            .commit()
            .map_err(DatabaseError::from)
            .instrument(span)
            .boxed()
    }

    fn cancel(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>> {
        let span = tracing::info_span!("db.cancel");
        self.conn
            .rollback()
            .map_err(DatabaseError::from)
            .instrument(span)
            .boxed()
    }
}

impl<C> RepositoryAccess for PgRepository<C>
where
    C: AsMut<PgConnection> + Send,
{
    type Error = DatabaseError;

    fn usage<'c>(&'c mut self) -> Box<dyn UsageRepository<Error = Self::Error> + 'c> {
        Box::new(PgUsageRepository::new(self.conn.as_mut()))
    }

    fn question<'c>(&'c mut self) -> Box<dyn QuestionRepository<Error = Self::Error> + 'c> {
        Box::new(PgQuestionRepository::new(self.conn.as_mut()))
    }

    fn answer<'c>(&'c mut self) -> Box<dyn AnswerRepository<Error = Self::Error> + 'c> {
        Box::new(PgAnswerRepository::new(self.conn.as_mut()))
    }

    fn stats<'c>(&'c mut self) -> Box<dyn StatsRepository<Error = Self::Error> + 'c> {
        Box::new(PgStatsRepository::new(self.conn.as_mut()))
    }
}

/// Records the SQL text of a statement on the current span before the
/// statement runs.
///
/// Every query in this crate executes under a `db.*` span declaring an
/// empty `db.query.text` field; calling
/// [`traced()`][`TracedExecute::traced`] right before execution fills
/// it in.
pub trait TracedExecute<'q, DB: sqlx::Database>: sqlx::Execute<'q, DB> + Sized {
    /// Record this statement's SQL on the current tracing span
    fn traced(self) -> Self {
        tracing::Span::current().record("db.query.text", self.sql());
        self
    }
}

impl<'q, DB, T> TracedExecute<'q, DB> for T
where
    DB: sqlx::Database,
    T: sqlx::Execute<'q, DB>,
{
}
