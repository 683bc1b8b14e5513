//! Article repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/save/read APIs over `articles` and `authors` storage.
//! - Route every read through the publication policy's visibility scopes.
//!
//! # Invariants
//! - Write paths call `validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - `published_at` is stored as INTEGER epoch milliseconds or NULL.

use crate::db::DbError;
use crate::model::article::{Article, ArticleId, ArticleValidationError, Author, AuthorId};
use crate::model::publication::HasPublicationState;
use crate::policy::{query_for, Visibility};
use crate::query::{ColumnRef, Predicate, SelectQuery, SortDirection};
use crate::repo::Persist;
use crate::timestamp::{from_epoch_ms, to_epoch_ms, Timestamp};
use log::debug;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ARTICLES: &str = "articles";
const AUTHORS: &str = "authors";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for article persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ArticleValidationError),
    Db(DbError),
    NotFound(Uuid),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ArticleValidationError> for RepoError {
    fn from(value: ArticleValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing articles.
#[derive(Debug, Clone, Default)]
pub struct ArticleListQuery {
    pub visibility: Visibility,
    pub author_uuid: Option<AuthorId>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for articles and their authors.
///
/// Reads take `now` explicitly so callers decide which clock reading the
/// visibility scopes are evaluated against.
pub trait ArticleRepository {
    fn create_author(&self, author: &Author) -> RepoResult<AuthorId>;
    fn create_article(&self, article: &Article) -> RepoResult<ArticleId>;
    fn save_article(&self, article: &Article) -> RepoResult<()>;
    fn get_article(
        &self,
        id: ArticleId,
        visibility: Visibility,
        now: Timestamp,
    ) -> RepoResult<Option<Article>>;
    fn list_articles(&self, query: &ArticleListQuery, now: Timestamp) -> RepoResult<Vec<Article>>;
    fn list_articles_by_author_name(
        &self,
        author_name: &str,
        visibility: Visibility,
        now: Timestamp,
    ) -> RepoResult<Vec<Article>>;
}

/// SQLite-backed article repository.
pub struct SqliteArticleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteArticleRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn scoped_query(visibility: Visibility) -> SelectQuery {
        visibility
            .apply(query_for::<Article>(), Article::publication_config())
            .order_by(
                ColumnRef::qualified(ARTICLES, Article::PUBLISHED_AT_COLUMN),
                SortDirection::Desc,
            )
            .order_by(ColumnRef::qualified(ARTICLES, "uuid"), SortDirection::Asc)
    }

    fn fetch(&self, query: &SelectQuery, now: Timestamp) -> RepoResult<Vec<Article>> {
        let rendered = query.render(now);
        let mut stmt = self.conn.prepare(&rendered.sql)?;
        let mut rows = stmt.query(params_from_iter(rendered.binds.iter()))?;
        let mut articles = Vec::new();

        while let Some(row) = rows.next()? {
            articles.push(parse_article_row(row)?);
        }

        debug!(
            "event=articles_fetch module=repo status=ok joins={} rows={}",
            query.has_joins(),
            articles.len()
        );
        Ok(articles)
    }
}

impl ArticleRepository for SqliteArticleRepository<'_> {
    fn create_author(&self, author: &Author) -> RepoResult<AuthorId> {
        author.validate()?;

        self.conn.execute(
            "INSERT INTO authors (uuid, name) VALUES (?1, ?2);",
            params![author.uuid.to_string(), author.name.as_str()],
        )?;

        Ok(author.uuid)
    }

    fn create_article(&self, article: &Article) -> RepoResult<ArticleId> {
        article.validate()?;

        self.conn.execute(
            "INSERT INTO articles (
                uuid,
                author_uuid,
                title,
                body,
                published_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                article.uuid.to_string(),
                article.author_uuid.map(|id| id.to_string()),
                article.title.as_str(),
                article.body.as_str(),
                article.published_at.map(to_epoch_ms),
            ],
        )?;

        Ok(article.uuid)
    }

    fn save_article(&self, article: &Article) -> RepoResult<()> {
        article.validate()?;

        let changed = self.conn.execute(
            "UPDATE articles
             SET
                author_uuid = ?1,
                title = ?2,
                body = ?3,
                published_at = ?4,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?5;",
            params![
                article.author_uuid.map(|id| id.to_string()),
                article.title.as_str(),
                article.body.as_str(),
                article.published_at.map(to_epoch_ms),
                article.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(article.uuid));
        }

        Ok(())
    }

    fn get_article(
        &self,
        id: ArticleId,
        visibility: Visibility,
        now: Timestamp,
    ) -> RepoResult<Option<Article>> {
        let query = Self::scoped_query(visibility).filter(Predicate::eq(
            ColumnRef::qualified(ARTICLES, "uuid"),
            id.to_string(),
        ));

        Ok(self.fetch(&query, now)?.into_iter().next())
    }

    fn list_articles(&self, query: &ArticleListQuery, now: Timestamp) -> RepoResult<Vec<Article>> {
        let mut select = Self::scoped_query(query.visibility);

        if let Some(author_uuid) = query.author_uuid {
            select = select.filter(Predicate::eq(
                ColumnRef::qualified(ARTICLES, "author_uuid"),
                author_uuid.to_string(),
            ));
        }
        if let Some(limit) = query.limit {
            select = select.limit(limit);
        }
        if query.offset > 0 {
            select = select.offset(query.offset);
        }

        self.fetch(&select, now)
    }

    fn list_articles_by_author_name(
        &self,
        author_name: &str,
        visibility: Visibility,
        now: Timestamp,
    ) -> RepoResult<Vec<Article>> {
        let query = Self::scoped_query(visibility)
            .inner_join(
                AUTHORS,
                ColumnRef::qualified(AUTHORS, "uuid"),
                ColumnRef::qualified(ARTICLES, "author_uuid"),
            )
            .filter(Predicate::eq(ColumnRef::qualified(AUTHORS, "name"), author_name));

        self.fetch(&query, now)
    }
}

impl Persist<Article> for SqliteArticleRepository<'_> {
    fn save(&self, record: &Article) -> RepoResult<()> {
        self.save_article(record)
    }
}

fn parse_article_row(row: &Row<'_>) -> RepoResult<Article> {
    let uuid = parse_uuid(row.get("uuid")?, "articles.uuid")?;
    let author_uuid = match row.get::<_, Option<String>>("author_uuid")? {
        Some(value) => Some(parse_uuid(value, "articles.author_uuid")?),
        None => None,
    };

    let published_at = match row.get::<_, Option<i64>>("published_at")? {
        Some(ms) => Some(from_epoch_ms(ms).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid timestamp `{ms}` in articles.published_at"
            ))
        })?),
        None => None,
    };

    let article = Article {
        uuid,
        author_uuid,
        title: row.get("title")?,
        body: row.get("body")?,
        published_at,
    };
    article.validate()?;
    Ok(article)
}

fn parse_uuid(value: String, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(&value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}
