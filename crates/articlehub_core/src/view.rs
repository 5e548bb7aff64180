//! View-models for the list, detail and editor-preview screens.
//!
//! # Responsibility
//! - Turn articles and editor drafts into display-ready values.
//! - Hold the user-facing prompt and failure texts.
//!
//! Rendering itself belongs to the front end; nothing here mutates state.

use crate::model::article::{Article, ArticleId};
use crate::service::editor::ArticleEditor;
use chrono::{DateTime, Utc};

pub const DELETE_CONFIRMATION: &str = "Are you sure you want to delete this article?";
pub const EMPTY_LIST_TITLE: &str = "No articles yet";
pub const EMPTY_LIST_HINT: &str = "Start creating amazing content by writing your first article.";
pub const PREVIEW_PLACEHOLDER: &str = "<p>Start writing your article...</p>";

/// Tag chips shown on a list card before the overflow counter.
pub const CARD_TAG_LIMIT: usize = 3;

pub fn save_failure_message() -> &'static str {
    "Failed to save article. Please try again."
}

pub fn delete_failure_message() -> &'static str {
    "Failed to delete article. Please try again."
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBadge {
    Published,
    Draft,
}

impl StatusBadge {
    pub fn for_article(article: &Article) -> Self {
        if article.published {
            Self::Published
        } else {
            Self::Draft
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Published => "Published",
            Self::Draft => "Draft",
        }
    }
}

/// `Jan 5, 2024`
pub fn format_short_date(at: DateTime<Utc>) -> String {
    at.format("%b %-d, %Y").to_string()
}

/// `January 5, 2024`
pub fn format_long_date(at: DateTime<Utc>) -> String {
    at.format("%B %-d, %Y").to_string()
}

/// Summary tile in the article grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleCard {
    pub id: ArticleId,
    pub title: String,
    pub excerpt: String,
    pub status: StatusBadge,
    pub tags: Vec<String>,
    pub hidden_tags: usize,
    pub author: String,
    pub date: String,
    pub cover_image: Option<String>,
}

impl ArticleCard {
    pub fn from_article(article: &Article) -> Self {
        let shown = article.tags.len().min(CARD_TAG_LIMIT);
        Self {
            id: article.id.clone(),
            title: article.title.clone(),
            excerpt: article.excerpt.clone(),
            status: StatusBadge::for_article(article),
            tags: article.tags[..shown].to_vec(),
            hidden_tags: article.tags.len() - shown,
            author: article.author.clone(),
            date: format_short_date(article.created_at),
            cover_image: article.cover_image.clone(),
        }
    }

    /// `+N` chip for tags beyond the card limit.
    pub fn overflow_label(&self) -> Option<String> {
        (self.hidden_tags > 0).then(|| format!("+{}", self.hidden_tags))
    }
}

pub fn article_cards(articles: &[Article]) -> Vec<ArticleCard> {
    articles.iter().map(ArticleCard::from_article).collect()
}

/// Read-only rendering of one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleDetail {
    pub id: ArticleId,
    pub title: String,
    pub status: StatusBadge,
    pub byline: String,
    pub published_line: String,
    /// Present only when the article changed after creation.
    pub updated_line: Option<String>,
    pub tags: Vec<String>,
    pub cover_image: Option<String>,
    pub content: String,
}

impl ArticleDetail {
    pub fn from_article(article: &Article) -> Self {
        let updated_line = (article.updated_at != article.created_at)
            .then(|| format!("Updated {}", format_long_date(article.updated_at)));
        Self {
            id: article.id.clone(),
            title: article.title.clone(),
            status: StatusBadge::for_article(article),
            byline: format!("By {}", article.author),
            published_line: format!("Published on {}", format_long_date(article.created_at)),
            updated_line,
            tags: article.tags.clone(),
            cover_image: article.cover_image.clone(),
            content: article.content.clone(),
        }
    }
}

/// Preview pane of the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorPreview {
    pub title: String,
    pub byline: String,
    pub date: String,
    pub tags: Vec<String>,
    pub cover_image: Option<String>,
    pub content: String,
}

impl EditorPreview {
    pub fn from_editor(editor: &ArticleEditor, today: DateTime<Utc>) -> Self {
        let title = non_blank(editor.title()).unwrap_or("Untitled");
        let author = non_blank(editor.author()).unwrap_or("Unknown Author");
        let content = if editor.content().is_empty() {
            PREVIEW_PLACEHOLDER
        } else {
            editor.content()
        };
        Self {
            title: title.to_string(),
            byline: format!("By {author}"),
            date: today.format("%-m/%-d/%Y").to_string(),
            tags: editor.tags().to_vec(),
            cover_image: editor.cover_image().map(str::to_string),
            content: content.to_string(),
        }
    }
}

fn non_blank(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}
