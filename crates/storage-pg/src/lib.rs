// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! An implementation of the [`qbc-storage`] repository traits backed
//! by a PostgreSQL database.
//!
//! Queries are built at runtime with [`sea_query`] and executed with
//! [`sqlx`]; each repository instance wraps one transaction, which is
//! the unit-of-work boundary the deletion engine relies on.
//!
//! [`qbc-storage`]: qbc_storage

#![deny(clippy::future_not_send, missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod answer;
mod errors;
pub(crate) mod expr;
pub(crate) mod filter;
pub mod iden;
pub mod question;
mod repository;
pub mod stats;
pub mod usage;

pub use self::{
    errors::DatabaseError,
    repository::{PgRepository, PgRepositoryFactory, TracedExecute},
};
