//! Publication use-case service.
//!
//! # Responsibility
//! - Bind a repository and a clock so callers do not thread `now` by hand.
//! - Expose persist-immediately publish operations and visibility-aware reads.
//!
//! # Invariants
//! - Each publish/draft call performs exactly one repository save.
//! - Reads evaluate visibility against a fresh clock reading per call.

use crate::clock::Clock;
use crate::error::PublicationResult;
use crate::model::article::{Article, ArticleId, Author, AuthorId};
use crate::model::publication::{Draftable, HasPublicationState, PublicationState};
use crate::policy::Visibility;
use crate::repo::{ArticleListQuery, ArticleRepository, Persist, RepoResult};
use crate::timestamp::PublishedAtInput;

/// Use-case wrapper around an article repository and a clock.
pub struct PublicationService<R, C> {
    repo: R,
    clock: C,
}

impl<R, C> PublicationService<R, C>
where
    R: ArticleRepository,
    C: Clock,
{
    pub fn new(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    pub fn create_author(&self, name: impl Into<String>) -> RepoResult<Author> {
        let author = Author::new(name);
        self.repo.create_author(&author)?;
        Ok(author)
    }

    /// Creates and stores a draft article.
    pub fn create_draft(
        &self,
        title: impl Into<String>,
        body: impl Into<String>,
        author: Option<&Author>,
    ) -> RepoResult<Article> {
        let mut article = Article::new(title, body);
        article.author_uuid = author.map(|author| author.uuid);
        self.repo.create_article(&article)?;
        Ok(article)
    }

    pub fn state_of<T: HasPublicationState>(&self, record: &T) -> PublicationState {
        record.publication_state(&self.clock)
    }

    /// Sets the publish timestamp (or clears it) and saves the record.
    pub fn publish_at<T, D>(&self, record: &mut T, date: D) -> PublicationResult<()>
    where
        T: HasPublicationState,
        D: Into<PublishedAtInput>,
        R: Persist<T>,
    {
        record.publish_at(date, &self.repo, &self.clock)?;
        Ok(())
    }

    /// Publishes now unless already published, then saves the record.
    pub fn publish<T>(&self, record: &mut T) -> PublicationResult<()>
    where
        T: HasPublicationState,
        R: Persist<T>,
    {
        record.publish(true, &self.repo, &self.clock)?;
        Ok(())
    }

    /// Clears the publish timestamp and saves the record.
    pub fn draft<T>(&self, record: &mut T) -> PublicationResult<()>
    where
        T: HasPublicationState,
        R: Persist<T>,
    {
        record.draft(&self.repo, &self.clock)?;
        Ok(())
    }

    pub fn get_article(&self, id: ArticleId, visibility: Visibility) -> RepoResult<Option<Article>> {
        self.repo.get_article(id, visibility, self.clock.now())
    }

    /// Lists articles visible by default (published at call time).
    pub fn list_published(&self) -> RepoResult<Vec<Article>> {
        self.list_articles(&ArticleListQuery::default())
    }

    pub fn list_with_drafts(&self) -> RepoResult<Vec<Article>> {
        self.list_articles(&ArticleListQuery {
            visibility: Visibility::WithDrafts,
            ..ArticleListQuery::default()
        })
    }

    pub fn list_only_drafts(&self) -> RepoResult<Vec<Article>> {
        self.list_articles(&ArticleListQuery {
            visibility: Visibility::OnlyDrafts,
            ..ArticleListQuery::default()
        })
    }

    pub fn list_articles(&self, query: &ArticleListQuery) -> RepoResult<Vec<Article>> {
        self.repo.list_articles(query, self.clock.now())
    }

    pub fn list_by_author(
        &self,
        author_uuid: AuthorId,
        visibility: Visibility,
    ) -> RepoResult<Vec<Article>> {
        self.list_articles(&ArticleListQuery {
            visibility,
            author_uuid: Some(author_uuid),
            ..ArticleListQuery::default()
        })
    }

    pub fn list_by_author_name(
        &self,
        name: &str,
        visibility: Visibility,
    ) -> RepoResult<Vec<Article>> {
        self.repo
            .list_articles_by_author_name(name, visibility, self.clock.now())
    }
}
