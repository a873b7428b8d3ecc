// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use axum::{
    Json,
    extract::{Query, State},
};
use qbc_cleaner::Cleaner;
use qbc_data_model::{StatisticsSnapshot, TableStats};
use serde::{Deserialize, Serialize};

use crate::{ApiResponse, RouteError, response::Empty};

#[derive(Debug, Deserialize)]
pub struct StatisticsQuery {
    /// Recompute even when a fresh cached snapshot exists
    #[serde(default)]
    refresh: bool,
}

#[derive(Debug, Serialize)]
pub struct DetailedStatistics {
    tables: Vec<TableStats>,
}

#[tracing::instrument(name = "handler.statistics.get", skip(cleaner))]
pub async fn get(
    State(cleaner): State<Cleaner>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<ApiResponse<StatisticsSnapshot>>, RouteError> {
    let snapshot = cleaner.statistics(query.refresh).await?;

    Ok(ApiResponse::ok(snapshot))
}

#[tracing::instrument(name = "handler.statistics.detailed", skip_all)]
pub async fn detailed(
    State(cleaner): State<Cleaner>,
) -> Result<Json<ApiResponse<DetailedStatistics>>, RouteError> {
    let tables = cleaner.detailed_statistics().await?;

    Ok(ApiResponse::ok(DetailedStatistics { tables }))
}

#[tracing::instrument(name = "handler.statistics.invalidate", skip_all)]
pub async fn invalidate(State(cleaner): State<Cleaner>) -> Json<ApiResponse<Empty>> {
    cleaner.invalidate_statistics().await;

    ApiResponse::ok(Empty {})
}

#[cfg(test)]
mod tests {
    use axum::http::{Request, StatusCode};
    use qbc_cleaner::mock::MockData;
    use serde_json::json;

    use crate::test_utils::{RequestBuilderExt, TestState};

    fn bank() -> MockData {
        let mut data = MockData::new();
        data.add_question(1, "Q1", "truefalse", "x");
        data.add_question(2, "Q2", "truefalse", "y");
        data.add_quiz_reference(1);
        data.add_answer(10, 2, "True");
        data
    }

    #[tokio::test]
    async fn overview_counts() {
        let state = TestState::new(bank());

        let (status, body) = state
            .request_json(Request::get("/api/v1/statistics").empty())
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["statistics"]["total_questions"], json!(2));
        assert_eq!(body["statistics"]["unused_questions"], json!(1));
        assert_eq!(body["statistics"]["unused_question_answers"], json!(1));
    }

    #[tokio::test]
    async fn refresh_bypasses_the_cache() {
        let state = TestState::new(bank());

        state
            .request_json(Request::get("/api/v1/statistics").empty())
            .await;
        state
            .factory
            .mutate(|data| data.add_question(3, "Q3", "truefalse", "z"));

        // Still cached
        let (_, body) = state
            .request_json(Request::get("/api/v1/statistics").empty())
            .await;
        assert_eq!(body["statistics"]["total_questions"], json!(2));

        let (_, body) = state
            .request_json(Request::get("/api/v1/statistics?refresh=true").empty())
            .await;
        assert_eq!(body["statistics"]["total_questions"], json!(3));
    }

    #[tokio::test]
    async fn invalidation_forces_a_recompute() {
        let state = TestState::new(bank());

        state
            .request_json(Request::get("/api/v1/statistics").empty())
            .await;
        state
            .factory
            .mutate(|data| data.add_question(3, "Q3", "truefalse", "z"));

        let (status, body) = state
            .request_json(Request::post("/api/v1/statistics/invalidate").empty())
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));

        let (_, body) = state
            .request_json(Request::get("/api/v1/statistics").empty())
            .await;
        assert_eq!(body["statistics"]["total_questions"], json!(3));
    }

    #[tokio::test]
    async fn detailed_table_counts() {
        let state = TestState::new(bank());

        let (status, body) = state
            .request_json(Request::get("/api/v1/statistics/detailed").empty())
            .await;
        assert_eq!(status, StatusCode::OK);

        let tables = body["tables"].as_array().unwrap();
        let questions = tables
            .iter()
            .find(|t| t["table"] == json!("question"))
            .unwrap();
        assert_eq!(questions["rows"], json!(2));
        assert_eq!(questions["label"], json!("Questions"));
    }
}
