// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use qbc_config::AppConfig;

mod cleanup;
mod config;
mod server;
mod stats;

#[derive(Parser, Debug)]
enum Subcommand {
    /// Run the HTTP server
    Server(self::server::Options),

    /// Run one unattended cleanup pass
    Cleanup(self::cleanup::Options),

    /// Show question bank statistics
    Stats(self::stats::Options),

    /// Configuration-related commands
    Config(self::config::Options),
}

#[derive(Parser, Debug)]
pub struct Options {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "config.yaml")]
    config: Utf8PathBuf,

    #[command(subcommand)]
    subcommand: Option<Subcommand>,
}

impl Options {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        use Subcommand as S;
        let config = AppConfig::load(&self.config)?;
        match self.subcommand {
            Some(S::Server(c)) => c.run(config).await,
            Some(S::Cleanup(c)) => c.run(config).await,
            Some(S::Stats(c)) => c.run(config).await,
            Some(S::Config(c)) => c.run(config).await,
            None => self::server::Options::default().run(config).await,
        }
    }
}
