// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

/// Name of the header carrying the caller identity
pub const ACTOR_HEADER: &str = "X-Actor";

/// The caller identity a cleanup session is scoped to.
///
/// Read from the `X-Actor` header; requests without one share the
/// anonymous actor.
#[derive(Debug, Clone)]
pub struct Actor(pub String);

impl Actor {
    /// The actor id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .unwrap_or("anonymous");
        Ok(Self(actor.to_owned()))
    }
}
