// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! Cached statistics snapshot.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use qbc_data_model::StatisticsSnapshot;

/// A [`StatisticsCache`] holds the last computed statistics snapshot
/// so repeated dashboard loads don't re-run the aggregate queries.
/// Deletion runs invalidate it.
#[async_trait]
pub trait StatisticsCache: Send + Sync {
    /// Get the cached snapshot, if any
    async fn get(&self) -> Option<StatisticsSnapshot>;

    /// Replace the cached snapshot
    async fn set(&self, snapshot: StatisticsSnapshot);

    /// Drop the cached snapshot
    async fn clear(&self);
}

/// An in-process [`StatisticsCache`]
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatisticsCache {
    inner: Arc<RwLock<Option<StatisticsSnapshot>>>,
}

impl InMemoryStatisticsCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatisticsCache for InMemoryStatisticsCache {
    async fn get(&self) -> Option<StatisticsSnapshot> {
        self.inner.read().unwrap().clone()
    }

    async fn set(&self, snapshot: StatisticsSnapshot) {
        *self.inner.write().unwrap() = Some(snapshot);
    }

    async fn clear(&self) {
        *self.inner.write().unwrap() = None;
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use qbc_data_model::Statistics;

    use super::*;

    #[tokio::test]
    async fn test_set_get_clear() {
        let cache = InMemoryStatisticsCache::new();
        assert!(cache.get().await.is_none());

        let snapshot = StatisticsSnapshot {
            statistics: Statistics::default(),
            taken_at: Utc.with_ymd_and_hms(2022, 1, 16, 14, 40, 0).unwrap(),
        };
        cache.set(snapshot.clone()).await;
        assert_eq!(cache.get().await, Some(snapshot));

        cache.clear().await;
        assert!(cache.get().await.is_none());
    }
}
