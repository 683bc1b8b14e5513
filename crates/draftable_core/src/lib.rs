//! Draft/published visibility for persisted records.
//!
//! Records opt in by implementing [`HasPublicationState`]; the policy then
//! hides unpublished and future-dated rows from default queries, offers
//! explicit `with_drafts` / `only_drafts` opt-outs, and provides publish
//! mutators that persist through a [`Persist`] implementation.

pub mod clock;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod policy;
pub mod query;
pub mod repo;
pub mod service;
pub mod timestamp;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{PublicationError, PublicationResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::article::{Article, ArticleId, ArticleValidationError, Author, AuthorId};
pub use model::publication::{
    ColumnQualification, Draftable, HasPublicationState, PublicationConfig, PublicationState,
    DEFAULT_PUBLISHED_AT_COLUMN,
};
pub use policy::{only_drafts, query_for, with_drafts, Visibility, PUBLISHED_SCOPE};
pub use repo::{
    ArticleListQuery, ArticleRepository, Persist, RepoError, RepoResult, SqliteArticleRepository,
};
pub use service::publication_service::PublicationService;
pub use timestamp::{parse_timestamp, PublishedAtInput, Timestamp, TimestampParseError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
