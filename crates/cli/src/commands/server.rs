// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use qbc_config::AppConfig;
use tracing::{info, info_span};

use crate::util::{cleaner_from_config, database_pool_from_config};

#[derive(Parser, Debug, Default)]
pub(super) struct Options {}

impl Options {
    pub async fn run(self, config: AppConfig) -> anyhow::Result<ExitCode> {
        let span = info_span!("cli.server.init").entered();

        let pool = database_pool_from_config(&config.database).await?;
        let cleaner = cleaner_from_config(&config, pool);
        let router = qbc_handlers::router(cleaner);

        let listener = tokio::net::TcpListener::bind(config.http.listen)
            .await
            .context("could not bind the HTTP listener")?;
        let address = listener
            .local_addr()
            .context("could not get the listener address")?;
        info!(%address, "Listening");

        span.exit();

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("could not run the HTTP server")?;

        Ok(ExitCode::SUCCESS)
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            error = &error as &dyn std::error::Error,
            "Failed to listen for the interrupt signal"
        );
        return;
    }

    info!("Shutting down");
}
