// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use qbc_config::AppConfig;
use tokio::io::AsyncWriteExt;
use tracing::info_span;

use crate::util::{cleaner_from_config, database_pool_from_config};

#[derive(Parser, Debug)]
pub(super) struct Options {
    /// Recompute the statistics instead of serving a cached snapshot
    #[arg(long)]
    refresh: bool,

    /// Show per-table row counts instead of the overview
    #[arg(long)]
    detailed: bool,
}

impl Options {
    pub async fn run(self, config: AppConfig) -> anyhow::Result<ExitCode> {
        let span = info_span!("cli.stats").entered();

        let pool = database_pool_from_config(&config.database).await?;
        let cleaner = cleaner_from_config(&config, pool);

        span.exit();

        let output = if self.detailed {
            let tables = cleaner.detailed_statistics().await?;
            serde_json::to_string_pretty(&tables)?
        } else {
            let snapshot = cleaner.statistics(self.refresh).await?;
            serde_json::to_string_pretty(&snapshot)?
        };

        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(output.as_bytes())
            .await
            .context("could not write to stdout")?;
        stdout.write_all(b"\n").await?;

        Ok(ExitCode::SUCCESS)
    }
}
