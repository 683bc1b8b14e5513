//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the `save()` capability the publication policy persists through.
//! - Isolate SQLite statement execution from policy and service code.
//!
//! # Invariants
//! - Repository writes validate records before persistence.
//! - Reads apply a `Visibility` explicitly; there is no unscoped read path.
//!
//! # See also
//! - crate::policy

pub mod article_repo;

pub use article_repo::{
    ArticleListQuery, ArticleRepository, RepoError, RepoResult, SqliteArticleRepository,
};

/// Durable storage for the current in-memory state of a record.
pub trait Persist<T> {
    /// Stores `record` exactly once; errors propagate to the caller unchanged.
    fn save(&self, record: &T) -> RepoResult<()>;
}

impl<T, P: Persist<T> + ?Sized> Persist<T> for &P {
    fn save(&self, record: &T) -> RepoResult<()> {
        (**self).save(record)
    }
}
