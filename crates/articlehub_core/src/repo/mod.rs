//! Article data-source abstraction and implementations.
//!
//! # Responsibility
//! - Define the `ArticleSource` contract shared by the remote backend and the
//!   local demo store.
//! - Define the repository error taxonomy surfaced to callers.
//!
//! # Invariants
//! - Every read and write is scoped to the session's owning identity.
//! - Updates and deletes that match no owned record return `NotFound`, never
//!   a silent success.
//! - A source is chosen once at startup; callers never branch on mode.

use crate::db::DbError;
use crate::model::article::{Article, ArticleId, ArticlePatch, ArticleValidationError, NewArticle};
use crate::model::session::Session;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod local_source;
pub mod remote_source;

pub use local_source::LocalArticleSource;
pub use remote_source::RemoteArticleSource;

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors surfaced by article sources and the article store.
#[derive(Debug)]
pub enum RepoError {
    /// Record-level invariant violated.
    Validation(ArticleValidationError),
    /// No identity is signed in.
    AuthenticationRequired,
    /// Backend is unconfigured or unreachable.
    BackendUnavailable(String),
    /// Backend answered but rejected the call.
    RemoteOperationFailed {
        status: Option<u16>,
        message: String,
    },
    /// No record with this id is owned by the caller.
    NotFound(ArticleId),
    /// Local store failure.
    Db(DbError),
    /// Persisted data could not be decoded.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::AuthenticationRequired => write!(f, "user not authenticated"),
            Self::BackendUnavailable(details) => write!(f, "database not configured: {details}"),
            Self::RemoteOperationFailed {
                status: Some(status),
                message,
            } => write!(f, "backend rejected request ({status}): {message}"),
            Self::RemoteOperationFailed {
                status: None,
                message,
            } => write!(f, "backend rejected request: {message}"),
            Self::NotFound(id) => write!(f, "article not found: {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted article data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
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

/// Which collaborator backs a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Demo,
    Remote,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Demo => "demo",
            Self::Remote => "remote",
        }
    }
}

/// Row-oriented article persistence scoped by owner.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Owner's articles, newest `created_at` first.
    async fn fetch_articles(&self, session: &Session) -> RepoResult<Vec<Article>>;

    /// Persists a new article and returns the stored record.
    async fn insert_article(&self, session: &Session, article: NewArticle) -> RepoResult<Article>;

    /// Applies `patch` to an owned record and returns the stored record.
    async fn update_article(
        &self,
        session: &Session,
        id: &ArticleId,
        patch: &ArticlePatch,
    ) -> RepoResult<Article>;

    /// Deletes an owned record.
    async fn delete_article(&self, session: &Session, id: &ArticleId) -> RepoResult<()>;
}
