// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use axum::{Json, http::StatusCode, response::IntoResponse};
use qbc_cleaner::CleanerError;
use qbc_data_model::UnknownCleanupType;
use serde::Serialize;

/// Error returned by the API routes
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// The engine could not reach the storage backend
    #[error(transparent)]
    Engine(#[from] CleanerError),

    /// The request named a cleanup type that does not exist
    #[error(transparent)]
    InvalidCleanupType(#[from] UnknownCleanupType),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for RouteError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            Self::Engine(_) => {
                tracing::error!(
                    error = &self as &dyn std::error::Error,
                    "request failed",
                );
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::InvalidCleanupType(_) => StatusCode::BAD_REQUEST,
        };
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
