//! Article and author records.
//!
//! # Responsibility
//! - Define the publishable `Article` record and its optional `Author`.
//! - Provide validation used by repository write and read paths.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another record.
//! - New articles start as drafts (`published_at = None`).
//! - `title` must contain at least one non-whitespace character.

use crate::model::publication::HasPublicationState;
use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ArticleId = Uuid;
pub type AuthorId = Uuid;

/// Person credited on articles. Not publishable itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub uuid: AuthorId,
    pub name: String,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ArticleValidationError> {
        if self.name.trim().is_empty() {
            return Err(ArticleValidationError::EmptyAuthorName);
        }
        Ok(())
    }
}

/// Publishable article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub uuid: ArticleId,
    pub author_uuid: Option<AuthorId>,
    pub title: String,
    pub body: String,
    /// `None` for drafts; a future value schedules publication.
    pub published_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleValidationError {
    EmptyTitle,
    EmptyAuthorName,
}

impl Display for ArticleValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "article title cannot be empty"),
            Self::EmptyAuthorName => write!(f, "author name cannot be empty"),
        }
    }
}

impl Error for ArticleValidationError {}

impl Article {
    /// Creates a draft article with a generated ID.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title, body)
    }

    /// Creates a draft article with a caller-provided stable ID.
    pub fn with_id(uuid: ArticleId, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            uuid,
            author_uuid: None,
            title: title.into(),
            body: body.into(),
            published_at: None,
        }
    }

    pub fn by(mut self, author: &Author) -> Self {
        self.author_uuid = Some(author.uuid);
        self
    }

    pub fn validate(&self) -> Result<(), ArticleValidationError> {
        if self.title.trim().is_empty() {
            return Err(ArticleValidationError::EmptyTitle);
        }
        Ok(())
    }
}

impl HasPublicationState for Article {
    const TABLE_NAME: &'static str = "articles";

    fn published_at(&self) -> Option<Timestamp> {
        self.published_at
    }

    fn published_at_mut(&mut self) -> &mut Option<Timestamp> {
        &mut self.published_at
    }
}
