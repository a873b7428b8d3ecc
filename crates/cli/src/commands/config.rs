// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use std::process::ExitCode;

use clap::Parser;
use qbc_config::AppConfig;
use tracing::{info, info_span};

#[derive(Parser, Debug)]
enum Subcommand {
    /// Check the validity of the configuration file
    Check,
}

#[derive(Parser, Debug)]
pub(super) struct Options {
    #[command(subcommand)]
    subcommand: Subcommand,
}

impl Options {
    #[allow(clippy::unused_async)]
    pub async fn run(self, _config: AppConfig) -> anyhow::Result<ExitCode> {
        use Subcommand as SC;
        match self.subcommand {
            SC::Check => {
                let _span = info_span!("cli.config.check").entered();

                // Loading the configuration already validated it
                info!("Configuration file looks good");
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}
