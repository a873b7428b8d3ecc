// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use async_trait::async_trait;
use futures_util::{TryFutureExt, future::BoxFuture};
use thiserror::Error;

use crate::{
    answer::AnswerRepository, question::QuestionRepository, stats::StatsRepository,
    usage::UsageRepository,
};

/// The error type used by the [`BoxRepository`], hiding the
/// backend-specific error type
#[derive(Debug, Error)]
#[error(transparent)]
pub struct RepositoryError {
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl RepositoryError {
    /// Construct a [`RepositoryError`] out of another error
    pub fn from_error<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            source: Box::new(source),
        }
    }
}

/// Access the various repositories the backend implements.
pub trait RepositoryAccess: Send {
    /// The backend-specific error type used by each repository.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Get an [`UsageRepository`]
    fn usage<'c>(&'c mut self) -> Box<dyn UsageRepository<Error = Self::Error> + 'c>;

    /// Get a [`QuestionRepository`]
    fn question<'c>(&'c mut self) -> Box<dyn QuestionRepository<Error = Self::Error> + 'c>;

    /// Get an [`AnswerRepository`]
    fn answer<'c>(&'c mut self) -> Box<dyn AnswerRepository<Error = Self::Error> + 'c>;

    /// Get a [`StatsRepository`]
    fn stats<'c>(&'c mut self) -> Box<dyn StatsRepository<Error = Self::Error> + 'c>;
}

/// A unit-of-work boundary over a set of repository operations
pub trait RepositoryTransaction {
    /// The error type returned when the transaction fails to commit
    /// or roll back
    type Error;

    /// Commit the unit of work
    fn save(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>>;

    /// Roll the unit of work back
    fn cancel(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>>;
}

/// A complete repository: access to all the sub-repositories plus the
/// unit-of-work boundary
pub trait Repository<E>:
    RepositoryAccess<Error = E> + RepositoryTransaction<Error = E> + Send
{
}

impl<T, E> Repository<E> for T where
    T: RepositoryAccess<Error = E> + RepositoryTransaction<Error = E> + Send
{
}

/// A type-erased [`Repository`]
pub type BoxRepository = Box<dyn Repository<RepositoryError>>;

/// A factory which can create new [`BoxRepository`] instances, one
/// per unit of work
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Create a new repository instance
    async fn create(&self) -> Result<BoxRepository, RepositoryError>;
}

/// A type-erased [`RepositoryFactory`]
pub type BoxRepositoryFactory = Box<dyn RepositoryFactory>;

/// Wraps a repository and converts every error it returns through a
/// mapping function.
///
/// This is what erases the backend: a backend wraps itself with
/// [`RepositoryError::from_error`] as the mapper before boxing itself
/// into a [`BoxRepository`].
pub struct MapErr<R, F> {
    pub(crate) inner: R,
    pub(crate) mapper: F,
}

impl<R, F> MapErr<R, F> {
    /// Wrap `inner`, passing each error through `mapper`
    pub fn new(inner: R, mapper: F) -> Self {
        Self { inner, mapper }
    }
}

impl<R, F, E> RepositoryAccess for MapErr<R, F>
where
    R: RepositoryAccess,
    F: FnMut(R::Error) -> E + Send + Sync,
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    fn usage<'c>(&'c mut self) -> Box<dyn UsageRepository<Error = Self::Error> + 'c> {
        Box::new(MapErr::new(self.inner.usage(), &mut self.mapper))
    }

    fn question<'c>(&'c mut self) -> Box<dyn QuestionRepository<Error = Self::Error> + 'c> {
        Box::new(MapErr::new(self.inner.question(), &mut self.mapper))
    }

    fn answer<'c>(&'c mut self) -> Box<dyn AnswerRepository<Error = Self::Error> + 'c> {
        Box::new(MapErr::new(self.inner.answer(), &mut self.mapper))
    }

    fn stats<'c>(&'c mut self) -> Box<dyn StatsRepository<Error = Self::Error> + 'c> {
        Box::new(MapErr::new(self.inner.stats(), &mut self.mapper))
    }
}

impl<R, F, E> RepositoryTransaction for MapErr<R, F>
where
    R: RepositoryTransaction + 'static,
    F: FnMut(R::Error) -> E + Send + 'static,
{
    type Error = E;

    fn save(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>> {
        let MapErr {
            inner, mut mapper, ..
        } = *self;
        Box::pin(Box::new(inner).save().map_err(move |e| mapper(e)))
    }

    fn cancel(self: Box<Self>) -> BoxFuture<'static, Result<(), Self::Error>> {
        let MapErr {
            inner, mut mapper, ..
        } = *self;
        Box::pin(Box::new(inner).cancel().map_err(move |e| mapper(e)))
    }
}

/// Implements one of this crate's repository traits for `Box<R>` and
/// for the [`MapErr`] wrapper, which is what lets a repository be used
/// through the type-erased [`BoxRepository`].
///
/// Each trait invokes this with its method list, with the `&mut self`
/// receiver and the `Result` wrapping left implicit:
///
/// ```ignore
/// forward_repository!(UsageRepository {
///     fn used_entry_ids() -> BTreeSet<EntryId>;
/// });
/// ```
macro_rules! forward_repository {
    ($repo_trait:ident { $(fn $method:ident($($arg:ident: $ty:ty),* $(,)?) -> $ok:ty;)+ }) => {
        #[::async_trait::async_trait]
        impl<R> $repo_trait for ::std::boxed::Box<R>
        where
            R: $repo_trait + ?Sized,
        {
            type Error = <R as $repo_trait>::Error;

            $(
                async fn $method(
                    &mut self,
                    $($arg: $ty),*
                ) -> ::std::result::Result<$ok, Self::Error> {
                    (**self).$method($($arg),*).await
                }
            )+
        }

        #[::async_trait::async_trait]
        impl<R, F, E> $repo_trait for $crate::MapErr<R, F>
        where
            R: $repo_trait,
            F: FnMut(<R as $repo_trait>::Error) -> E + Send + Sync,
        {
            type Error = E;

            $(
                async fn $method(
                    &mut self,
                    $($arg: $ty),*
                ) -> ::std::result::Result<$ok, Self::Error> {
                    self.inner.$method($($arg),*).await.map_err(&mut self.mapper)
                }
            )+
        }
    };
}
pub(crate) use forward_repository;
