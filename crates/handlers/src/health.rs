// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use axum::{extract::State, response::IntoResponse};
use qbc_cleaner::Cleaner;

use crate::RouteError;

pub async fn get(State(cleaner): State<Cleaner>) -> Result<impl IntoResponse, RouteError> {
    cleaner.ping().await?;

    Ok("ok")
}

#[cfg(test)]
mod tests {
    use axum::http::{Request, StatusCode};
    use qbc_cleaner::mock::MockData;

    use crate::test_utils::{RequestBuilderExt, TestState};

    #[tokio::test]
    async fn health_checks_the_store() {
        let state = TestState::new(MockData::new());

        let (status, body) = state.request(Request::get("/health").empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }
}
