// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! Interactions with the storage backend
//!
//! This crate provides a set of traits that can be implemented to
//! interact with the relational store holding the question bank.
//! Those traits are called repositories and are grouped by the type
//! of data they manage.
//!
//! Each repository can be accessed via the [`RepositoryAccess`]
//! trait, which can be wrapped in a [`BoxRepository`] to hide the
//! underlying backend and its error type. A repository instance is
//! one unit of work: [`Repository::save`] commits it, dropping or
//! cancelling it rolls it back. The deletion engine opens one unit of
//! work per chunk, which is what gives chunk-level failure isolation.
//!
//! The store itself is externally owned: the cleaner reads question,
//! version, bank entry, reference and answer rows, and deletes rows
//! once they are verified unused. Nothing here creates or mutates
//! them.
//!
//! Two small collaborator traits also live here: [`SessionStore`]
//! (the per-actor stop flags driving cooperative cancellation) and
//! [`StatisticsCache`] (the cached statistics snapshot), both with
//! in-memory implementations.

#![deny(clippy::future_not_send, missing_docs)]

pub mod answer;
pub mod cache;
pub mod question;
pub(crate) mod repository;
pub mod session;
pub mod stats;
pub mod usage;

pub use self::{
    answer::AnswerRepository,
    cache::{InMemoryStatisticsCache, StatisticsCache},
    question::{QuestionRepository, QuestionScope},
    repository::{
        BoxRepository, BoxRepositoryFactory, MapErr, Repository, RepositoryAccess,
        RepositoryError, RepositoryFactory, RepositoryTransaction,
    },
    session::{InMemorySessionStore, SessionStore},
    stats::StatsRepository,
    usage::UsageRepository,
};
