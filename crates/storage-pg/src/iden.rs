// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! Table and column identifiers used by [`sea_query`].
//!
//! The store's column names are lowercased without separators
//! (`questionbankentryid`), so most variants carry an explicit
//! `#[iden]` override.

#![allow(missing_docs)]

#[derive(sea_query::Iden)]
#[iden = "question"]
pub enum Questions {
    Table,
    Id,
    Name,
    Qtype,
    #[iden = "questiontext"]
    QuestionText,
    Parent,
}

#[derive(sea_query::Iden)]
pub enum QuestionVersions {
    Table,
    Id,
    #[iden = "questionid"]
    QuestionId,
    #[iden = "questionbankentryid"]
    QuestionBankEntryId,
    Version,
    Status,
}

#[derive(sea_query::Iden)]
pub enum QuestionBankEntries {
    Table,
    Id,
    #[iden = "questioncategoryid"]
    QuestionCategoryId,
}

#[derive(sea_query::Iden)]
pub enum QuestionCategories {
    Table,
    Id,
    Name,
    #[iden = "contextid"]
    ContextId,
}

#[derive(sea_query::Iden)]
pub enum QuestionReferences {
    Table,
    #[iden = "questionbankentryid"]
    QuestionBankEntryId,
    Component,
    #[iden = "questionarea"]
    QuestionArea,
}

#[derive(sea_query::Iden)]
pub enum QuestionAnswers {
    Table,
    Id,
    Question,
    Answer,
    Fraction,
    Feedback,
}
