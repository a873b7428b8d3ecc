// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! Snapshot of which bank entries are referenced by quiz slots.

use std::collections::BTreeSet;

use qbc_data_model::EntryId;
use qbc_storage::{BoxRepository, RepositoryError};

/// The set of bank entries referenced by at least one quiz slot, as of
/// one point in time.
///
/// An index is only as fresh as the moment it was loaded; the deletion
/// path always loads a new one immediately before deleting.
#[derive(Debug, Clone, Default)]
pub struct UsageIndex {
    entries: BTreeSet<EntryId>,
}

impl UsageIndex {
    /// Load a fresh index from the reference table
    pub async fn load(repo: &mut BoxRepository) -> Result<Self, RepositoryError> {
        let entries = repo.usage().used_entry_ids().await?;
        Ok(Self { entries })
    }

    /// Whether the given bank entry is referenced
    #[must_use]
    pub fn is_used(&self, entry: EntryId) -> bool {
        self.entries.contains(&entry)
    }

    /// The referenced entry ids
    #[must_use]
    pub fn entries(&self) -> &BTreeSet<EntryId> {
        &self.entries
    }

    /// Number of referenced entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry is referenced at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
