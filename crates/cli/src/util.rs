// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use qbc_cleaner::{Cleaner, CleanerOptions};
use qbc_config::{AppConfig, DatabaseConfig};
use qbc_data_model::SystemClock;
use qbc_storage::{InMemorySessionStore, InMemoryStatisticsCache};
use qbc_storage_pg::PgRepositoryFactory;
use sqlx::{PgPool, postgres::PgPoolOptions};

/// Create a database connection pool from the configuration
pub async fn database_pool_from_config(config: &DatabaseConfig) -> Result<PgPool, anyhow::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections.get())
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout))
        .connect(&config.uri)
        .await
        .context("could not connect to the database")
}

/// Assemble the cleanup engine from the configuration and a database
/// pool
pub fn cleaner_from_config(config: &AppConfig, pool: PgPool) -> Cleaner {
    Cleaner::new(
        Arc::new(PgRepositoryFactory::new(pool)),
        Arc::new(SystemClock::default()),
        Arc::new(InMemorySessionStore::new()),
        Arc::new(InMemoryStatisticsCache::new()),
        CleanerOptions {
            batch_size: config.cleanup.batch_size,
            throttle: config.cleanup.throttle(),
            statistics_max_age: config.cache.statistics_max_age(),
        },
    )
}
