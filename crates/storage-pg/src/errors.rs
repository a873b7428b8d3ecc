// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use thiserror::Error;

/// Generic error when interacting with the database
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum DatabaseError {
    /// An error which came from the database itself
    #[error(transparent)]
    Driver {
        #[from]
        source: sqlx::Error,
    },

    /// The database returned a value we could not represent, e.g. a
    /// negative count
    #[error("invalid database operation")]
    InvalidOperation,
}

impl DatabaseError {
    pub(crate) fn to_invalid_operation<T>(_: T) -> Self {
        Self::InvalidOperation
    }
}
