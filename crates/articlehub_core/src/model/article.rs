//! Article domain model.
//!
//! # Responsibility
//! - Define the canonical article record shared by list, detail and editor views.
//! - Define the create (`NewArticle`) and partial update (`ArticlePatch`) payloads
//!   accepted by article sources.
//!
//! # Invariants
//! - `id` is opaque and never changes after creation.
//! - `updated_at >= created_at`.
//! - `excerpt` is always derived from `content`; payloads never carry one.
//! - Tags keep insertion order and suppress exact (case-sensitive) duplicates.

use crate::content::markup::derive_excerpt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque article identifier.
///
/// Remote backends assign their own ids; the local demo store generates UUIDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(String);

impl ArticleId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a fresh client-side id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ArticleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArticleId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Validation errors for article records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleValidationError {
    EmptyTitle,
    EmptyContent,
    EmptyAuthor,
    TimestampOrder {
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    },
}

impl Display for ArticleValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "article title must not be blank"),
            Self::EmptyContent => write!(f, "article content must not be blank"),
            Self::EmptyAuthor => write!(f, "article author must not be blank"),
            Self::TimestampOrder {
                created_at,
                updated_at,
            } => write!(
                f,
                "updated_at ({}) must be >= created_at ({})",
                updated_at.to_rfc3339(),
                created_at.to_rfc3339()
            ),
        }
    }
}

impl Error for ArticleValidationError {}

/// Canonical article record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    /// Rich text serialized as HTML markup.
    pub content: String,
    /// Plain-text summary derived from `content`.
    pub excerpt: String,
    /// URL or `data:` URL of the cover image.
    pub cover_image: Option<String>,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published: bool,
    pub tags: Vec<String>,
}

impl Article {
    /// Checks record-level invariants.
    ///
    /// # Errors
    /// - Blank `title`, `content` or `author`.
    /// - `updated_at` earlier than `created_at`.
    pub fn validate(&self) -> Result<(), ArticleValidationError> {
        if self.title.trim().is_empty() {
            return Err(ArticleValidationError::EmptyTitle);
        }
        if self.content.trim().is_empty() {
            return Err(ArticleValidationError::EmptyContent);
        }
        if self.author.trim().is_empty() {
            return Err(ArticleValidationError::EmptyAuthor);
        }
        self.validate_timestamps()
    }

    /// Checks only the timestamp ordering invariant.
    pub fn validate_timestamps(&self) -> Result<(), ArticleValidationError> {
        if self.updated_at < self.created_at {
            return Err(ArticleValidationError::TimestampOrder {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }

    /// Draft means "not yet published".
    pub fn is_draft(&self) -> bool {
        !self.published
    }
}

/// Create payload handed to an article source.
///
/// `id` and `created_at` are optional: sources assign them when absent.
/// Remote sources always let the backend assign the id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewArticle {
    pub id: Option<ArticleId>,
    pub title: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub author: String,
    pub published: bool,
    pub tags: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl NewArticle {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            author: author.into(),
            ..Self::default()
        }
    }

    /// Materializes a full record with the given id and creation time.
    pub fn into_article(self, id: ArticleId, created_at: DateTime<Utc>) -> Article {
        let excerpt = derive_excerpt(&self.content);
        Article {
            id,
            title: self.title,
            content: self.content,
            excerpt,
            cover_image: self.cover_image,
            author: self.author,
            created_at,
            updated_at: created_at,
            published: self.published,
            tags: dedupe_tags(self.tags),
        }
    }
}

impl From<Article> for NewArticle {
    fn from(article: Article) -> Self {
        Self {
            id: Some(article.id),
            title: article.title,
            content: article.content,
            cover_image: article.cover_image,
            author: article.author,
            published: article.published,
            tags: article.tags,
            created_at: Some(article.created_at),
        }
    }
}

/// Partial update payload. `None` leaves the field untouched.
///
/// `cover_image` is doubly optional: `Some(None)` clears the cover.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub cover_image: Option<Option<String>>,
    pub author: Option<String>,
    pub published: Option<bool>,
    pub tags: Option<Vec<String>>,
}

impl ArticlePatch {
    /// Patch replacing every editable field with the values of `article`.
    pub fn replace_all(article: &Article) -> Self {
        Self {
            title: Some(article.title.clone()),
            content: Some(article.content.clone()),
            cover_image: Some(article.cover_image.clone()),
            author: Some(article.author.clone()),
            published: Some(article.published),
            tags: Some(article.tags.clone()),
        }
    }

    pub fn title(value: impl Into<String>) -> Self {
        Self {
            title: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.cover_image.is_none()
            && self.author.is_none()
            && self.published.is_none()
            && self.tags.is_none()
    }

    /// Applies the patch in place and refreshes `updated_at`.
    ///
    /// `excerpt` is re-derived when content changes. `updated_at` never moves
    /// before `created_at`, even with a skewed clock.
    pub fn apply_to(&self, article: &mut Article, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            article.title = title.clone();
        }
        if let Some(content) = &self.content {
            article.content = content.clone();
            article.excerpt = derive_excerpt(content);
        }
        if let Some(cover_image) = &self.cover_image {
            article.cover_image = cover_image.clone();
        }
        if let Some(author) = &self.author {
            article.author = author.clone();
        }
        if let Some(published) = self.published {
            article.published = published;
        }
        if let Some(tags) = &self.tags {
            article.tags = dedupe_tags(tags.clone());
        }
        article.updated_at = now.max(article.created_at);
    }
}

/// Drops exact repeats, keeping first-seen order; tags are not re-normalized.
pub fn dedupe_tags(tags: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !unique.contains(&tag) {
            unique.push(tag);
        }
    }
    unique
}
