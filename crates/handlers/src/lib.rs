// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

#![deny(missing_docs)]

//! The HTTP API of the cleanup service.
//!
//! All routes live under `/api/v1` except `/health`. The caller's
//! identity is taken from the `X-Actor` header; authentication itself
//! is a reverse-proxy concern. Engine-level deletion failures are part
//! of the report payload, not HTTP errors: the only 4xx responses are
//! malformed requests, and 5xx means the storage backend was
//! unreachable.

use axum::{
    Router,
    routing::{get, post},
};
use qbc_cleaner::Cleaner;

mod actor;
mod cleanup;
mod errors;
mod health;
mod response;
mod statistics;
#[cfg(test)]
mod test_utils;

pub use self::{actor::Actor, errors::RouteError, response::ApiResponse};

/// Assemble the API router over the shared engine
#[must_use]
pub fn router(cleaner: Cleaner) -> Router {
    Router::new()
        .route("/health", get(health::get))
        .route("/api/v1/cleanup/start", post(cleanup::start))
        .route("/api/v1/cleanup/process", post(cleanup::process))
        .route("/api/v1/cleanup/stop", post(cleanup::stop))
        .route("/api/v1/cleanup/status", get(cleanup::status))
        .route("/api/v1/statistics", get(statistics::get))
        .route("/api/v1/statistics/detailed", get(statistics::detailed))
        .route("/api/v1/statistics/invalidate", post(statistics::invalidate))
        .with_state(cleaner)
}
