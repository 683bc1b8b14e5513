//! Default-visibility policy for publishable record queries.
//!
//! # Responsibility
//! - Install the named `published` scope that hides drafts by default.
//! - Provide explicit opt-outs (`with_drafts`, `only_drafts`).
//! - Resolve the publish column reference for a given query.
//!
//! # Invariants
//! - The default scope is a named global scope, removable by name.
//! - Every predicate compares against `Operand::Now`, so visibility follows
//!   the clock reading at render time.
//! - Default, with-drafts and only-drafts partition records the same way as
//!   `Draftable::is_published` / `Draftable::is_draft`.

use crate::model::publication::{ColumnQualification, HasPublicationState, PublicationConfig};
use crate::query::{Clause, ColumnRef, CompareOp, Operand, Predicate, SelectQuery};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Name of the default-visibility global scope.
pub const PUBLISHED_SCOPE: &str = "published";

/// Which records a read should see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Only records published at query time.
    #[default]
    Published,
    /// Published records and drafts.
    WithDrafts,
    /// Only drafts, including scheduled records.
    OnlyDrafts,
}

impl Visibility {
    /// Applies this visibility to a query that carries the default scope.
    pub fn apply(self, query: SelectQuery, config: PublicationConfig) -> SelectQuery {
        match self {
            Self::Published => install_default_visibility(query, config),
            Self::WithDrafts => with_drafts(query),
            Self::OnlyDrafts => only_drafts(query, config),
        }
    }
}

/// Starts a query over `T` with the default-visibility scope installed.
pub fn query_for<T: HasPublicationState>() -> SelectQuery {
    let config = T::publication_config();
    install_default_visibility(SelectQuery::new(config.table), config)
}

/// Picks the bare or table-qualified publish column for `query`.
pub fn resolve_published_at_column(config: &PublicationConfig, query: &SelectQuery) -> ColumnRef {
    match config.qualification {
        ColumnQualification::Always => config.qualified_column(),
        ColumnQualification::WhenJoined if query.has_joins() => config.qualified_column(),
        ColumnQualification::WhenJoined => config.bare_column(),
    }
}

/// `column IS NOT NULL AND column <= now`
pub fn published_predicate(column: ColumnRef) -> Predicate {
    Predicate::is_not_null(column.clone()).and(Predicate::compare(
        column,
        CompareOp::LtEq,
        Operand::Now,
    ))
}

/// `column IS NULL OR column > now`
pub fn draft_predicate(column: ColumnRef) -> Predicate {
    Predicate::is_null(column.clone()).or(Predicate::compare(column, CompareOp::Gt, Operand::Now))
}

/// Adds (or re-adds) the `published` scope to `query`.
///
/// The column is resolved when the query renders, so joins added afterwards
/// still switch a `WhenJoined` config to the qualified name.
pub fn install_default_visibility(query: SelectQuery, config: PublicationConfig) -> SelectQuery {
    query.add_global_scope(
        PUBLISHED_SCOPE,
        Clause::Deferred(Rc::new(move |query: &SelectQuery| {
            published_predicate(resolve_published_at_column(&config, query))
        })),
    )
}

/// Removes the `published` scope; drafts and published records are visible.
pub fn with_drafts(query: SelectQuery) -> SelectQuery {
    query.without_global_scope(PUBLISHED_SCOPE)
}

/// Removes the `published` scope and keeps only drafts.
pub fn only_drafts(query: SelectQuery, config: PublicationConfig) -> SelectQuery {
    with_drafts(query)
        .filter_deferred(move |query| draft_predicate(resolve_published_at_column(&config, query)))
}
