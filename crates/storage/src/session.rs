// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! Per-actor stop flags driving cooperative cancellation.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;

/// A [`SessionStore`] keeps one stop flag per actor. Starting a run
/// clears the actor's flag, a stop request raises it, and the engine
/// checks it at the top of every batch.
///
/// Flags are keyed by actor so two operators running cleanups at the
/// same time cannot cancel each other.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Clear the actor's stop flag
    async fn clear_stop(&self, actor: &str);

    /// Raise the actor's stop flag
    async fn request_stop(&self, actor: &str);

    /// Whether the actor's stop flag is raised
    async fn is_stop_requested(&self, actor: &str) -> bool;
}

/// An in-process [`SessionStore`] backed by a [`HashMap`]
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    flags: Arc<RwLock<HashMap<String, bool>>>,
}

impl InMemorySessionStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn clear_stop(&self, actor: &str) {
        // Lock is never poisoned: no code panics while holding it
        let mut flags = self.flags.write().unwrap();
        flags.insert(actor.to_owned(), false);
    }

    async fn request_stop(&self, actor: &str) {
        let mut flags = self.flags.write().unwrap();
        flags.insert(actor.to_owned(), true);
    }

    async fn is_stop_requested(&self, actor: &str) -> bool {
        let flags = self.flags.read().unwrap();
        flags.get(actor).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stop_flags_are_per_actor() {
        let store = InMemorySessionStore::new();

        assert!(!store.is_stop_requested("alice").await);

        store.request_stop("alice").await;
        assert!(store.is_stop_requested("alice").await);
        assert!(!store.is_stop_requested("bob").await);

        store.clear_stop("alice").await;
        assert!(!store.is_stop_requested("alice").await);
    }
}
