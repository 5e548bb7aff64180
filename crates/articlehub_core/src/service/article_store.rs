//! Article store: the owner of the in-memory article collection.
//!
//! # Responsibility
//! - Load the current identity's articles from the selected `ArticleSource`.
//! - Route create/update/delete through the source and mirror successful
//!   results into the local collection.
//! - Reset the collection when the signed-in identity changes or signs out.
//!
//! # Invariants
//! - Local state changes only after the source confirms the write.
//! - A failed write leaves the collection untouched and is returned unchanged.
//! - Writes without a signed-in identity fail with `AuthenticationRequired`.
//! - An expired session counts as signed out until it is renewed.
//! - Reads reload only on first use or after an identity change.

use crate::model::article::{Article, ArticleId, ArticlePatch, NewArticle};
use crate::model::session::Session;
use crate::repo::{ArticleSource, RepoError, RepoResult, SourceKind};
use crate::service::session_provider::SessionWatch;
use chrono::Utc;
use log::{error, info};
use std::sync::Arc;

pub struct ArticleStore {
    source: Arc<dyn ArticleSource>,
    session: SessionWatch,
    articles: Vec<Article>,
    loaded: bool,
    loaded_for: Option<String>,
    last_error: Option<String>,
}

impl ArticleStore {
    pub fn new(source: Arc<dyn ArticleSource>, session: SessionWatch) -> Self {
        Self {
            source,
            session,
            articles: Vec::new(),
            loaded: false,
            loaded_for: None,
            last_error: None,
        }
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source.kind()
    }

    /// Collection as last loaded or written, without reloading.
    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn get(&self, id: &ArticleId) -> Option<&Article> {
        self.articles.iter().find(|article| &article.id == id)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Message of the most recent failed load or write.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Current identity's articles, newest first.
    ///
    /// Signed out yields an empty collection, not an error.
    pub async fn list(&mut self) -> RepoResult<&[Article]> {
        if self.needs_reload() {
            self.refresh().await?;
        }
        Ok(&self.articles)
    }

    /// Re-reads the collection from the source.
    pub async fn refresh(&mut self) -> RepoResult<()> {
        let Some(session) = self.live_session() else {
            self.articles.clear();
            self.loaded = true;
            self.loaded_for = None;
            self.last_error = None;
            info!("event=article_list module=store status=ok signed_in=false count=0");
            return Ok(());
        };

        match self.source.fetch_articles(&session).await {
            Ok(articles) => {
                info!(
                    "event=article_list module=store status=ok source={} count={}",
                    self.source.kind().as_str(),
                    articles.len()
                );
                self.articles = articles;
                self.loaded = true;
                self.loaded_for = Some(session.user_id().to_string());
                self.last_error = None;
                Ok(())
            }
            Err(err) => {
                if self.loaded_for.as_deref() != Some(session.user_id()) {
                    self.articles.clear();
                    self.loaded_for = None;
                }
                Err(self.record_failure("list", err))
            }
        }
    }

    /// Persists a new article and prepends it to the collection.
    pub async fn create(&mut self, draft: NewArticle) -> RepoResult<Article> {
        let session = self.writer_session("create").await?;
        match self.source.insert_article(&session, draft).await {
            Ok(article) => {
                info!(
                    "event=article_create module=store status=ok source={} article_id={}",
                    self.source.kind().as_str(),
                    article.id
                );
                self.articles.insert(0, article.clone());
                Ok(article)
            }
            Err(err) => Err(self.record_failure("create", err)),
        }
    }

    /// Applies `patch` to an owned article and replaces the local copy.
    pub async fn update(&mut self, id: &ArticleId, patch: ArticlePatch) -> RepoResult<Article> {
        let session = self.writer_session("update").await?;
        match self.source.update_article(&session, id, &patch).await {
            Ok(article) => {
                info!(
                    "event=article_update module=store status=ok source={} article_id={}",
                    self.source.kind().as_str(),
                    id
                );
                if let Some(slot) = self.articles.iter_mut().find(|item| &item.id == id) {
                    *slot = article.clone();
                }
                Ok(article)
            }
            Err(err) => Err(self.record_failure("update", err)),
        }
    }

    /// Deletes an owned article and drops it from the collection.
    pub async fn delete(&mut self, id: &ArticleId) -> RepoResult<()> {
        let session = self.writer_session("delete").await?;
        match self.source.delete_article(&session, id).await {
            Ok(()) => {
                info!(
                    "event=article_delete module=store status=ok source={} article_id={}",
                    self.source.kind().as_str(),
                    id
                );
                self.articles.retain(|article| &article.id != id);
                Ok(())
            }
            Err(err) => Err(self.record_failure("delete", err)),
        }
    }

    fn needs_reload(&self) -> bool {
        let current = self
            .live_session()
            .map(|session| session.user_id().to_string());
        !self.loaded || current != self.loaded_for
    }

    /// Current session, or `None` when signed out or past its expiry.
    fn live_session(&self) -> Option<Session> {
        self.session
            .borrow()
            .clone()
            .filter(|session| !session.is_expired_at(Utc::now()))
    }

    async fn writer_session(&mut self, operation: &'static str) -> RepoResult<Session> {
        let Some(session) = self.live_session() else {
            return Err(self.record_failure(operation, RepoError::AuthenticationRequired));
        };
        if self.needs_reload() {
            self.refresh().await?;
        }
        Ok(session)
    }

    fn record_failure(&mut self, operation: &'static str, err: RepoError) -> RepoError {
        error!(
            "event=article_{operation} module=store status=error source={} error={}",
            self.source.kind().as_str(),
            err
        );
        self.last_error = Some(err.to_string());
        err
    }
}
