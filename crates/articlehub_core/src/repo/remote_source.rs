//! Article source backed by a hosted row-oriented REST backend.
//!
//! # Responsibility
//! - Map article operations onto the `articles` table endpoint.
//! - Translate transport and backend failures into `RepoError`.
//!
//! # Invariants
//! - Every request filters on `user_id=eq.<owner>`; mutations add `id=eq.<id>`.
//! - Mutations ask for the affected rows back; an empty answer is `NotFound`.
//! - The backend assigns ids; client-side ids in `NewArticle` are ignored.
//! - Updates never write an `updated_at` earlier than the stored `created_at`.
//! - Rows whose `updated_at` precedes `created_at` fail with a validation error.

use crate::config::BackendEndpoint;
use crate::content::markup::derive_excerpt;
use crate::http::{build_client, error_message, is_unavailable};
use crate::model::article::{dedupe_tags, Article, ArticleId, ArticlePatch, NewArticle};
use crate::model::session::Session;
use crate::repo::{ArticleSource, RepoError, RepoResult, SourceKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const ARTICLES_PATH: &str = "rest/v1/articles";

/// Row shape of the backend `articles` table.
#[derive(Debug, Clone, Deserialize)]
struct ArticleRow {
    id: String,
    title: String,
    content: String,
    excerpt: Option<String>,
    cover_image: Option<String>,
    author: String,
    published: bool,
    tags: Option<Vec<String>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ArticleRow> for Article {
    type Error = RepoError;

    fn try_from(row: ArticleRow) -> RepoResult<Self> {
        let article = Self {
            id: ArticleId::new(row.id),
            title: row.title,
            excerpt: row.excerpt.unwrap_or_default(),
            content: row.content,
            cover_image: row.cover_image.filter(|value| !value.is_empty()),
            author: row.author,
            published: row.published,
            tags: row.tags.unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        article.validate_timestamps()?;
        Ok(article)
    }
}

/// Projection used to read an owned row's creation time before updating it.
#[derive(Debug, Deserialize)]
struct CreatedAtRow {
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct ArticleInsertRow<'a> {
    title: &'a str,
    content: &'a str,
    excerpt: String,
    cover_image: Option<&'a str>,
    author: &'a str,
    published: bool,
    tags: Vec<String>,
    user_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct ArticleUpdateRow<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cover_image: Option<Option<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<Vec<String>>,
    updated_at: DateTime<Utc>,
}

impl<'a> ArticleUpdateRow<'a> {
    fn from_patch(patch: &'a ArticlePatch, now: DateTime<Utc>) -> Self {
        Self {
            title: patch.title.as_deref(),
            content: patch.content.as_deref(),
            excerpt: patch.content.as_deref().map(derive_excerpt),
            cover_image: patch.cover_image.as_ref().map(|value| value.as_deref()),
            author: patch.author.as_deref(),
            published: patch.published,
            tags: patch.tags.clone().map(dedupe_tags),
            updated_at: now,
        }
    }
}

/// REST-backed article source.
pub struct RemoteArticleSource {
    client: Client,
    endpoint: BackendEndpoint,
}

impl RemoteArticleSource {
    pub fn try_new(endpoint: BackendEndpoint) -> RepoResult<Self> {
        let client = build_client().map_err(|err| {
            RepoError::BackendUnavailable(format!("http client setup failed: {err}"))
        })?;
        Ok(Self { client, endpoint })
    }

    fn articles_url(&self) -> RepoResult<Url> {
        self.endpoint
            .join(ARTICLES_PATH)
            .map_err(|err| RepoError::BackendUnavailable(format!("invalid articles url: {err}")))
    }

    fn authorized(&self, builder: RequestBuilder, session: &Session) -> RepoResult<RequestBuilder> {
        let token = session
            .access_token
            .as_deref()
            .ok_or(RepoError::AuthenticationRequired)?;
        Ok(builder
            .header("apikey", self.endpoint.access_key())
            .bearer_auth(token))
    }

    async fn send_for_rows<R: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> RepoResult<Vec<R>> {
        let started_at = Instant::now();
        let response = request.send().await.map_err(|err| {
            error!(
                "event=remote_{operation} module=repo status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            if is_unavailable(&err) {
                RepoError::BackendUnavailable(err.to_string())
            } else {
                RepoError::RemoteOperationFailed {
                    status: None,
                    message: err.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body);
            error!(
                "event=remote_{operation} module=repo status=error http_status={} duration_ms={} error={}",
                status.as_u16(),
                started_at.elapsed().as_millis(),
                message
            );
            return Err(RepoError::RemoteOperationFailed {
                status: Some(status.as_u16()),
                message,
            });
        }

        let rows = response.json::<Vec<R>>().await.map_err(|err| {
            RepoError::InvalidData(format!("{operation} response could not be decoded: {err}"))
        })?;
        debug!(
            "event=remote_{operation} module=repo status=ok rows={} duration_ms={}",
            rows.len(),
            started_at.elapsed().as_millis()
        );
        Ok(rows)
    }

    /// Creation time of an owned row; `NotFound` when the caller owns no such row.
    async fn stored_created_at(
        &self,
        session: &Session,
        id: &ArticleId,
    ) -> RepoResult<DateTime<Utc>> {
        let request = self.client.get(self.articles_url()?).query(&[
            ("select", "created_at".to_string()),
            id_filter(id),
            owner_filter(session),
        ]);
        let rows: Vec<CreatedAtRow> = self
            .send_for_rows("lookup", self.authorized(request, session)?)
            .await?;
        rows.into_iter()
            .next()
            .map(|row| row.created_at)
            .ok_or_else(|| RepoError::NotFound(id.clone()))
    }

    fn single_row(rows: Vec<ArticleRow>, id: Option<&ArticleId>) -> RepoResult<Article> {
        match (rows.into_iter().next(), id) {
            (Some(row), _) => Article::try_from(row),
            (None, Some(id)) => Err(RepoError::NotFound(id.clone())),
            (None, None) => Err(RepoError::InvalidData(
                "insert returned no row".to_string(),
            )),
        }
    }
}

fn owner_filter(session: &Session) -> (&'static str, String) {
    ("user_id", format!("eq.{}", session.user_id()))
}

fn id_filter(id: &ArticleId) -> (&'static str, String) {
    ("id", format!("eq.{id}"))
}

#[async_trait]
impl ArticleSource for RemoteArticleSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Remote
    }

    async fn fetch_articles(&self, session: &Session) -> RepoResult<Vec<Article>> {
        let request = self.client.get(self.articles_url()?).query(&[
            ("select", "*".to_string()),
            owner_filter(session),
            ("order", "created_at.desc".to_string()),
        ]);
        let rows: Vec<ArticleRow> = self
            .send_for_rows("fetch", self.authorized(request, session)?)
            .await?;
        rows.into_iter().map(Article::try_from).collect()
    }

    async fn insert_article(&self, session: &Session, article: NewArticle) -> RepoResult<Article> {
        let body = ArticleInsertRow {
            title: &article.title,
            content: &article.content,
            excerpt: derive_excerpt(&article.content),
            cover_image: article.cover_image.as_deref(),
            author: &article.author,
            published: article.published,
            tags: dedupe_tags(article.tags.clone()),
            user_id: session.user_id(),
            created_at: article.created_at,
        };
        let request = self
            .client
            .post(self.articles_url()?)
            .header("Prefer", "return=representation")
            .json(&body);
        let rows: Vec<ArticleRow> = self
            .send_for_rows("insert", self.authorized(request, session)?)
            .await?;
        Self::single_row(rows, None)
    }

    async fn update_article(
        &self,
        session: &Session,
        id: &ArticleId,
        patch: &ArticlePatch,
    ) -> RepoResult<Article> {
        let created_at = self.stored_created_at(session, id).await?;
        let body = ArticleUpdateRow::from_patch(patch, Utc::now().max(created_at));
        let request = self
            .client
            .patch(self.articles_url()?)
            .query(&[id_filter(id), owner_filter(session)])
            .header("Prefer", "return=representation")
            .json(&body);
        let rows: Vec<ArticleRow> = self
            .send_for_rows("update", self.authorized(request, session)?)
            .await?;
        Self::single_row(rows, Some(id))
    }

    async fn delete_article(&self, session: &Session, id: &ArticleId) -> RepoResult<()> {
        let request = self
            .client
            .delete(self.articles_url()?)
            .query(&[id_filter(id), owner_filter(session)])
            .header("Prefer", "return=representation");
        let rows: Vec<ArticleRow> = self
            .send_for_rows("delete", self.authorized(request, session)?)
            .await?;
        if rows.is_empty() {
            return Err(RepoError::NotFound(id.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ArticleUpdateRow;
    use crate::model::article::ArticlePatch;
    use chrono::{TimeZone, Utc};

    #[test]
    fn update_row_only_serializes_present_fields() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let patch = ArticlePatch::title("X");
        let json = serde_json::to_value(ArticleUpdateRow::from_patch(&patch, now)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"title": "X", "updated_at": "2024-03-01T12:00:00Z"})
        );
    }

    #[test]
    fn update_row_clears_cover_and_rederives_excerpt() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let patch = ArticlePatch {
            content: Some("<p>Body</p>".to_string()),
            cover_image: Some(None),
            ..ArticlePatch::default()
        };
        let json = serde_json::to_value(ArticleUpdateRow::from_patch(&patch, now)).unwrap();
        assert_eq!(json["excerpt"], "Body...");
        assert!(json["cover_image"].is_null());
        assert!(json.as_object().unwrap().contains_key("cover_image"));
    }
}
