// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use qbc_storage::QuestionScope;
use sea_query::Expr;

use crate::iden::QuestionCategories;

/// A filter which can be applied to a query
pub(crate) trait Filter {
    /// Generate a condition for the filter
    fn generate_condition(&self) -> impl sea_query::IntoCondition;
}

pub(crate) trait StatementExt {
    /// Apply the filter to the query
    fn apply_filter<F: Filter>(&mut self, filter: F) -> &mut Self;
}

impl StatementExt for sea_query::SelectStatement {
    fn apply_filter<F: Filter>(&mut self, filter: F) -> &mut Self {
        let condition = filter.generate_condition();
        self.cond_where(condition)
    }
}

impl StatementExt for sea_query::DeleteStatement {
    fn apply_filter<F: Filter>(&mut self, filter: F) -> &mut Self {
        let condition = filter.generate_condition();
        self.cond_where(condition)
    }
}

impl Filter for QuestionScope {
    fn generate_condition(&self) -> impl sea_query::IntoCondition {
        sea_query::Condition::all().add_option(self.context().map(|context| {
            Expr::col((QuestionCategories::Table, QuestionCategories::ContextId))
                .eq(context.value())
        }))
    }
}
