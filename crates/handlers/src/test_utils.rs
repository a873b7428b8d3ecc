// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, request::Builder},
};
use http_body_util::BodyExt;
use qbc_cleaner::{
    Cleaner, CleanerOptions,
    mock::{MockData, MockRepositoryFactory},
};
use qbc_data_model::MockClock;
use qbc_storage::{InMemorySessionStore, InMemoryStatisticsCache};
use tower::ServiceExt;

/// A router over a mock store, with the factory kept around for
/// seeding and assertions
pub(crate) struct TestState {
    router: Router,
    pub(crate) factory: MockRepositoryFactory,
}

impl TestState {
    pub(crate) fn new(data: MockData) -> Self {
        let factory = MockRepositoryFactory::new(data);
        let cleaner = Cleaner::new(
            Arc::new(factory.clone()),
            Arc::new(MockClock::default()),
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemoryStatisticsCache::new()),
            CleanerOptions {
                throttle: std::time::Duration::ZERO,
                ..CleanerOptions::default()
            },
        );

        Self {
            router: crate::router(cleaner),
            factory,
        }
    }

    pub(crate) async fn request(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    pub(crate) async fn request_json(
        &self,
        request: Request<Body>,
    ) -> (StatusCode, serde_json::Value) {
        let (status, body) = self.request(request).await;
        let json = serde_json::from_str(&body).unwrap();
        (status, json)
    }
}

/// Shorthands for building requests in tests
pub(crate) trait RequestBuilderExt {
    /// Finish the request with a JSON body
    fn json(self, body: serde_json::Value) -> Request<Body>;

    /// Finish the request with an empty body
    fn empty(self) -> Request<Body>;
}

impl RequestBuilderExt for Builder {
    fn json(self, body: serde_json::Value) -> Request<Body> {
        self.header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty(self) -> Request<Body> {
        self.body(Body::empty()).unwrap()
    }
}
