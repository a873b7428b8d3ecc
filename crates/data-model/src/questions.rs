// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{EntryId, QuestionId};

/// Status of a question version row.
///
/// The *current* version of a bank entry is the highest-numbered
/// version whose status is not [`Hidden`]; a question whose entry has
/// no versions at all, or only hidden ones, is logically gone and is
/// excluded from every classification.
///
/// [`Hidden`]: QuestionVersionStatus::Hidden
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionVersionStatus {
    /// The version is published and usable in quizzes
    Ready,

    /// The version is still being authored
    Draft,

    /// The version is hidden, the store's deleted-marker
    Hidden,
}

impl QuestionVersionStatus {
    /// The value stored in the `status` column
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Draft => "draft",
            Self::Hidden => "hidden",
        }
    }
}

/// Error returned when parsing an unknown version status
#[derive(Debug, Error)]
#[error("unknown question version status {0:?}")]
pub struct UnknownVersionStatus(pub String);

impl std::str::FromStr for QuestionVersionStatus {
    type Err = UnknownVersionStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ready" => Ok(Self::Ready),
            "draft" => Ok(Self::Draft),
            "hidden" => Ok(Self::Hidden),
            other => Err(UnknownVersionStatus(other.to_owned())),
        }
    }
}

/// A question row, joined with its category and current version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    /// Row id
    pub id: QuestionId,

    /// Display name
    pub name: String,

    /// Question type tag, e.g. `truefalse` or `multichoice`
    pub qtype: String,

    /// Body text
    pub question_text: String,

    /// Parent question id; `0` means top-level. Sub-questions are
    /// excluded from every cleanup path.
    pub parent: i64,

    /// Category row id
    pub category_id: i64,

    /// Category display name
    pub category_name: String,

    /// Version number of the current version
    pub version: i64,

    /// The bank entry grouping all versions of this logical question
    pub entry_id: EntryId,
}

impl Question {
    /// Whether this is a top-level (standalone) question
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.parent == 0
    }

    /// The duplicate-group signature of this question
    #[must_use]
    pub fn signature(&self) -> Signature {
        Signature::new(&self.name, &self.qtype, &self.question_text)
    }
}

/// Duplicate-group key: `(name, type, content hash)`.
///
/// The signature deliberately ignores answer content, so two questions
/// with identical stems and types but different correct answers fall
/// in the same group. That matches the upstream product behavior and
/// is kept as-is; see DESIGN.md.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    /// Compute the signature of a question. The rendered form is
    /// `name-qtype-md5(text)`, byte-identical to what the store
    /// computes with `CONCAT(name, '-', qtype, '-', MD5(questiontext))`.
    #[must_use]
    pub fn new(name: &str, qtype: &str, question_text: &str) -> Self {
        let digest = Md5::digest(question_text.as_bytes());
        Self(format!("{name}-{qtype}-{}", hex::encode(digest)))
    }

    /// Wrap a signature string already rendered by the store
    #[must_use]
    pub fn from_raw(raw: String) -> Self {
        Self(raw)
    }

    /// The rendered signature string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A group of top-level questions sharing one signature.
///
/// Derived at classification time, never persisted. The lowest-id
/// (oldest) member is always retained; the others are deletion
/// candidates unless their bank entry is in use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// The shared signature
    pub signature: Signature,

    /// Group members, sorted by ascending id
    pub members: Vec<Question>,
}

impl DuplicateGroup {
    /// Build a group from members sharing a signature. Returns `None`
    /// unless there are at least two members.
    #[must_use]
    pub fn new(signature: Signature, mut members: Vec<Question>) -> Option<Self> {
        if members.len() < 2 {
            return None;
        }

        members.sort_by_key(|question| question.id);
        Some(Self { signature, members })
    }

    /// The member that is always retained, i.e. the one with the
    /// lowest id
    #[must_use]
    pub fn keeper(&self) -> &Question {
        // `new` guarantees members is non-empty and sorted
        &self.members[0]
    }

    /// The deletion candidates: every member but the keeper
    pub fn deletable(&self) -> impl Iterator<Item = &Question> {
        self.members.iter().skip(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: i64, name: &str, text: &str) -> Question {
        Question {
            id: QuestionId(id),
            name: name.to_owned(),
            qtype: "truefalse".to_owned(),
            question_text: text.to_owned(),
            parent: 0,
            category_id: 1,
            category_name: "Default".to_owned(),
            version: 1,
            entry_id: EntryId(id),
        }
    }

    #[test]
    fn signature_matches_store_rendering() {
        // MD5("x") = 9dd4e461268c8034f5c8564e155c67a6
        let sig = Signature::new("Q1", "truefalse", "x");
        assert_eq!(
            sig.as_str(),
            "Q1-truefalse-9dd4e461268c8034f5c8564e155c67a6"
        );
    }

    #[test]
    fn same_stem_different_answers_share_a_signature() {
        let a = question(1, "Q1", "Is the sky blue?");
        let b = question(2, "Q1", "Is the sky blue?");
        assert_eq!(a.signature(), b.signature());
    }

    #[test]
    fn group_keeps_lowest_id() {
        let sig = Signature::new("Q1", "truefalse", "body");
        let group = DuplicateGroup::new(
            sig,
            vec![
                question(14, "Q1", "body"),
                question(10, "Q1", "body"),
                question(12, "Q1", "body"),
            ],
        )
        .unwrap();

        assert_eq!(group.keeper().id, QuestionId(10));
        let deletable: Vec<_> = group.deletable().map(|q| q.id).collect();
        assert_eq!(deletable, vec![QuestionId(12), QuestionId(14)]);
    }

    #[test]
    fn singleton_is_not_a_group() {
        let sig = Signature::new("Q1", "truefalse", "body");
        assert!(DuplicateGroup::new(sig, vec![question(1, "Q1", "body")]).is_none());
    }

    #[test]
    fn status_round_trips() {
        for status in [
            QuestionVersionStatus::Ready,
            QuestionVersionStatus::Draft,
            QuestionVersionStatus::Hidden,
        ] {
            assert_eq!(status.as_str().parse::<QuestionVersionStatus>().unwrap(), status);
        }
        assert!("gone".parse::<QuestionVersionStatus>().is_err());
    }
}
