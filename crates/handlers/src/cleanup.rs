// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! The batch-driven cleanup session endpoints.
//!
//! The driver loop is the caller's: `start` sizes the work, then the
//! caller posts `process` once per batch until `done` comes back true,
//! checking `stopped` in between. Unknown cleanup types are a 400; a
//! batch whose chunks failed is still a 200 with the failures inside
//! the report.

use axum::{Json, extract::State};
use qbc_cleaner::{BatchReport, Cleaner, SessionStatus, StartReport};
use qbc_data_model::CleanupType;
use serde::Deserialize;

use crate::{Actor, ApiResponse, RouteError};

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    cleanup_type: String,
    batch_size: Option<usize>,
    num_batches: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    cleanup_type: String,
    batch_size: Option<usize>,
    batch_number: usize,
}

#[tracing::instrument(name = "handler.cleanup.start", skip(cleaner, actor))]
pub async fn start(
    State(cleaner): State<Cleaner>,
    actor: Actor,
    Json(body): Json<StartRequest>,
) -> Result<Json<ApiResponse<StartReport>>, RouteError> {
    let kind: CleanupType = body.cleanup_type.parse()?;
    let report = cleaner
        .start_session(actor.as_str(), kind, body.batch_size, body.num_batches)
        .await?;

    Ok(ApiResponse::ok(report))
}

#[tracing::instrument(name = "handler.cleanup.process", skip(cleaner, actor))]
pub async fn process(
    State(cleaner): State<Cleaner>,
    actor: Actor,
    Json(body): Json<ProcessRequest>,
) -> Result<Json<ApiResponse<BatchReport>>, RouteError> {
    let kind: CleanupType = body.cleanup_type.parse()?;
    let report = cleaner
        .process_batch(actor.as_str(), kind, body.batch_size, body.batch_number)
        .await?;

    Ok(ApiResponse::ok(report))
}

#[tracing::instrument(name = "handler.cleanup.stop", skip_all)]
pub async fn stop(
    State(cleaner): State<Cleaner>,
    actor: Actor,
) -> Json<ApiResponse<SessionStatus>> {
    cleaner.stop_session(actor.as_str()).await;
    let status = cleaner.session_status(actor.as_str()).await;

    ApiResponse::ok(status)
}

#[tracing::instrument(name = "handler.cleanup.status", skip_all)]
pub async fn status(
    State(cleaner): State<Cleaner>,
    actor: Actor,
) -> Json<ApiResponse<SessionStatus>> {
    let status = cleaner.session_status(actor.as_str()).await;

    ApiResponse::ok(status)
}

#[cfg(test)]
mod tests {
    use axum::http::{Request, StatusCode};
    use qbc_cleaner::mock::MockData;
    use serde_json::json;

    use crate::test_utils::{RequestBuilderExt, TestState};

    fn duplicate_bank() -> MockData {
        let mut data = MockData::new();
        for id in [10, 11, 12, 13, 14] {
            data.add_question(id, "Q1", "truefalse", "body");
        }
        data
    }

    #[tokio::test]
    async fn full_session_over_http() {
        let state = TestState::new(duplicate_bank());

        let (status, body) = state
            .request_json(
                Request::post("/api/v1/cleanup/start")
                    .header("X-Actor", "alice")
                    .json(json!({ "cleanup_type": "duplicate_questions", "batch_size": 2 })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["total"], json!(4));
        assert_eq!(body["total_batches"], json!(2));

        for (batch_number, remaining) in [(1, 2), (2, 0)] {
            let (status, body) = state
                .request_json(
                    Request::post("/api/v1/cleanup/process")
                        .header("X-Actor", "alice")
                        .json(json!({
                            "cleanup_type": "duplicate_questions",
                            "batch_size": 2,
                            "batch_number": batch_number,
                        })),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["deleted"], json!(2));
            assert_eq!(body["remaining"], json!(remaining));
            assert_eq!(body["done"], json!(remaining == 0));
        }

        let questions: Vec<i64> = state.factory.snapshot().questions.keys().copied().collect();
        assert_eq!(questions, vec![10]);
    }

    #[tokio::test]
    async fn unknown_cleanup_type_is_a_bad_request() {
        let state = TestState::new(MockData::new());

        let (status, body) = state
            .request_json(
                Request::post("/api/v1/cleanup/start")
                    .json(json!({ "cleanup_type": "everything" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn stop_flags_are_scoped_to_the_header_actor() {
        let state = TestState::new(MockData::new());

        let (status, body) = state
            .request_json(
                Request::post("/api/v1/cleanup/stop")
                    .header("X-Actor", "alice")
                    .empty(),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stop_requested"], json!(true));

        let (_, body) = state
            .request_json(
                Request::get("/api/v1/cleanup/status")
                    .header("X-Actor", "alice")
                    .empty(),
            )
            .await;
        assert_eq!(body["stop_requested"], json!(true));

        // No header means the shared anonymous actor, which is
        // unaffected
        let (_, body) = state
            .request_json(Request::get("/api/v1/cleanup/status").empty())
            .await;
        assert_eq!(body["stop_requested"], json!(false));
    }

    #[tokio::test]
    async fn stopped_session_skips_processing() {
        let state = TestState::new(duplicate_bank());

        state
            .request_json(
                Request::post("/api/v1/cleanup/start")
                    .json(json!({ "cleanup_type": "duplicate_questions" })),
            )
            .await;
        state
            .request_json(Request::post("/api/v1/cleanup/stop").empty())
            .await;

        let (status, body) = state
            .request_json(
                Request::post("/api/v1/cleanup/process").json(json!({
                    "cleanup_type": "duplicate_questions",
                    "batch_number": 1,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stopped"], json!(true));
        assert_eq!(body["deleted"], json!(0));
        assert_eq!(state.factory.snapshot().questions.len(), 5);
    }
}
