//! Query-construction capability consumed by the publication policy.
//!
//! # Responsibility
//! - Compose boolean predicates and render them with bound parameters.
//! - Keep a registry of named global scopes that can be removed per query.
//!
//! # Invariants
//! - Rendering never executes SQL; repositories own statement execution.

pub mod builder;
pub mod predicate;

pub use builder::{Clause, Join, JoinKind, RenderedQuery, SelectQuery, SortDirection};
pub use predicate::{ColumnRef, CompareOp, Operand, Predicate};
