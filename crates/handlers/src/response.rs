// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use serde::Serialize;

/// The JSON envelope every endpoint replies with
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Whether the request itself was carried out; per-chunk deletion
    /// failures live inside the payload instead
    pub success: bool,

    /// The endpoint-specific payload, flattened into the envelope
    #[serde(flatten)]
    pub payload: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// A successful response around the given payload
    pub fn ok(payload: T) -> axum::Json<Self> {
        axum::Json(Self {
            success: true,
            payload,
        })
    }
}

/// Payload for endpoints that have nothing to report beyond success
#[derive(Debug, Serialize)]
pub struct Empty {}
