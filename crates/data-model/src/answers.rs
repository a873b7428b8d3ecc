// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use serde::Serialize;

use crate::ids::{AnswerId, QuestionId};

/// An answer row, owned by exactly one question.
///
/// An answer is *orphaned* when its parent question row no longer
/// exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    /// Row id
    pub id: AnswerId,

    /// The owning question id. For an orphaned answer this points at
    /// a row that is gone.
    pub question_id: QuestionId,

    /// Answer text
    pub answer_text: String,

    /// Grade fraction awarded for this answer
    pub fraction: f64,

    /// Feedback shown when this answer is picked
    pub feedback: String,
}

/// An answer joined with its (still existing, but unused) parent
/// question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnusedAnswer {
    /// The answer row
    pub answer: Answer,

    /// Parent question display name
    pub question_name: String,
}
