// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use std::process::ExitCode;

use clap::Parser;
use qbc_config::AppConfig;
use qbc_tasks::CleanupTask;
use tracing::{info, info_span, warn};

use crate::util::{cleaner_from_config, database_pool_from_config};

#[derive(Parser, Debug)]
pub(super) struct Options {
    /// Run the pass even if automatic cleanup is disabled in the
    /// configuration
    #[arg(long)]
    force: bool,
}

impl Options {
    pub async fn run(self, config: AppConfig) -> anyhow::Result<ExitCode> {
        let _span = info_span!("cli.cleanup").entered();

        let pool = database_pool_from_config(&config.database).await?;
        let cleaner = cleaner_from_config(&config, pool);

        let mut cleanup_config = config.cleanup.clone();
        if self.force {
            cleanup_config.auto_cleanup = true;
        }

        let task = CleanupTask::new(cleaner, cleanup_config);
        let report = task.run().await?;

        for error in &report.errors {
            warn!("Cleanup error: {error}");
        }

        info!(
            deleted = report.deleted,
            failed = report.failed,
            "Cleanup pass finished"
        );

        Ok(ExitCode::SUCCESS)
    }
}
