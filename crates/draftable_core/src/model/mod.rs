//! Domain model for publishable records.
//!
//! # Responsibility
//! - Define the publication capability that record types opt into.
//! - Provide the article/author records persisted by this crate.
//!
//! # Invariants
//! - Draft vs. published is derived from `published_at` and a clock reading,
//!   never stored as a separate flag.

pub mod article;
pub mod publication;
