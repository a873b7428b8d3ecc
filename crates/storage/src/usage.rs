// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! Repository reading the quiz subsystem's question references, the
//! sole authority for "used" status.

use std::collections::BTreeSet;

use async_trait::async_trait;
use qbc_data_model::EntryId;

use crate::repository::forward_repository;

/// An [`UsageRepository`] reads the cross-reference records binding
/// quiz slots to question bank entries
#[async_trait]
pub trait UsageRepository: Send + Sync {
    /// The error type returned by the repository
    type Error;

    /// Get the distinct set of bank entry ids that have at least one
    /// reference from a quiz slot.
    ///
    /// This is a single scan of the reference table, not a
    /// per-question lookup; it dominates the cost of classification
    /// on large installs. It performs no caching: the verifier relies
    /// on every call returning a fresh snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn used_entry_ids(&mut self) -> Result<BTreeSet<EntryId>, Self::Error>;
}

forward_repository!(UsageRepository {
    fn used_entry_ids() -> BTreeSet<EntryId>;
});
