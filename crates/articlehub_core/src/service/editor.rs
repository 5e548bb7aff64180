//! Editor working copy for a single article.
//!
//! # Responsibility
//! - Hold the draft being authored: metadata, tags, rich content, preview toggle.
//! - Route formatting and image insertion through the document model.
//! - Validate and finalize the draft, then hand it to the `ArticleStore`.
//!
//! # Invariants
//! - Validation failures never reach the store.
//! - Editing keeps the original id and `created_at`; creating assigns fresh ones.
//! - The excerpt is always derived from content, never edited directly.

use crate::content::document::{DocumentError, InlineFormat, RichDocument, Selection};
use crate::content::image::{
    accept_picked, acquire_image, ImageError, ImageInput, PickOrigin, PickedFile,
};
use crate::content::markup::{derive_excerpt, derive_preview};
use crate::model::article::{Article, ArticleId, ArticlePatch, NewArticle};
use crate::repo::RepoError;
use crate::service::article_store::ArticleStore;
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type EditorResult<T> = Result<T, EditorError>;

/// Whether the draft will be created or replaces an existing article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit {
        id: ArticleId,
        created_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Title,
    Content,
    Author,
}

impl RequiredField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Content => "content",
            Self::Author => "author",
        }
    }
}

#[derive(Debug)]
pub enum EditorError {
    /// Required fields are blank; nothing was sent to the store.
    Validation(Vec<RequiredField>),
    InvalidSelection(DocumentError),
    Image(ImageError),
    Repo(RepoError),
}

impl Display for EditorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(fields) => {
                let names: Vec<&str> = fields.iter().map(|field| field.as_str()).collect();
                write!(
                    f,
                    "please fill in all required fields (title, content, author); missing: {}",
                    names.join(", ")
                )
            }
            Self::InvalidSelection(err) => write!(f, "invalid selection: {err}"),
            Self::Image(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EditorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(_) => None,
            Self::InvalidSelection(err) => Some(err),
            Self::Image(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<DocumentError> for EditorError {
    fn from(value: DocumentError) -> Self {
        Self::InvalidSelection(value)
    }
}

impl From<ImageError> for EditorError {
    fn from(value: ImageError) -> Self {
        Self::Image(value)
    }
}

impl From<RepoError> for EditorError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleEditor {
    mode: EditorMode,
    title: String,
    author: String,
    cover_image: String,
    tags: Vec<String>,
    published: bool,
    document: RichDocument,
    previewing: bool,
}

impl Default for ArticleEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl ArticleEditor {
    /// Empty draft for a new article.
    pub fn new() -> Self {
        Self {
            mode: EditorMode::Create,
            title: String::new(),
            author: String::new(),
            cover_image: String::new(),
            tags: Vec::new(),
            published: false,
            document: RichDocument::new(),
            previewing: false,
        }
    }

    /// Draft pre-populated from `article`; content is loaded verbatim.
    pub fn for_article(article: &Article) -> Self {
        Self {
            mode: EditorMode::Edit {
                id: article.id.clone(),
                created_at: article.created_at,
            },
            title: article.title.clone(),
            author: article.author.clone(),
            cover_image: article.cover_image.clone().unwrap_or_default(),
            tags: article.tags.clone(),
            published: article.published,
            document: RichDocument::from_markup(article.content.clone()),
            previewing: false,
        }
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, EditorMode::Edit { .. })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.author = author.into();
    }

    /// Cover image reference, `None` when blank.
    pub fn cover_image(&self) -> Option<&str> {
        let trimmed = self.cover_image.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    pub fn set_cover_image(&mut self, cover_image: impl Into<String>) {
        self.cover_image = cover_image.into();
    }

    pub fn published(&self) -> bool {
        self.published
    }

    pub fn set_published(&mut self, published: bool) {
        self.published = published;
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Appends a trimmed tag. Returns `false` for blank or exact-duplicate input.
    pub fn add_tag(&mut self, text: &str) -> bool {
        let tag = text.trim();
        if tag.is_empty() || self.tags.iter().any(|existing| existing == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// Removes the first exact match. Returns whether a tag was removed.
    pub fn remove_tag(&mut self, text: &str) -> bool {
        match self.tags.iter().position(|existing| existing == text) {
            Some(index) => {
                self.tags.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn document(&self) -> &RichDocument {
        &self.document
    }

    pub fn content(&self) -> &str {
        self.document.markup()
    }

    /// Replaces the whole content, as after a direct edit of the surface.
    pub fn set_content(&mut self, markup: impl Into<String>) {
        self.document.replace_markup(markup);
    }

    pub fn select(&mut self, anchor: usize, focus: usize) -> EditorResult<()> {
        self.document.select(Selection::new(anchor, focus))?;
        Ok(())
    }

    pub fn place_caret(&mut self, offset: usize) -> EditorResult<()> {
        self.document.place_caret(offset)?;
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.document.clear_selection();
    }

    /// Types text at the selection, or at the end without one.
    pub fn insert_text(&mut self, text: &str) {
        self.document.insert_text(text);
    }

    /// Applies bold/italic to the selection. Returns `false` without a selection.
    pub fn apply_format(&mut self, format: InlineFormat) -> bool {
        self.document.apply_format(format)
    }

    /// Inserts an image at the selection start, or appends it.
    ///
    /// Rejected inputs leave the content unchanged.
    pub fn insert_image(&mut self, input: ImageInput) -> EditorResult<()> {
        let src = acquire_image(input).map_err(|err| {
            warn!("event=editor_image module=editor status=error error={err}");
            err
        })?;
        self.document.insert_image(&src);
        Ok(())
    }

    /// Dropped or browsed files share the same validation as `insert_image`.
    pub fn insert_picked_image(
        &mut self,
        files: Vec<PickedFile>,
        origin: PickOrigin,
    ) -> EditorResult<()> {
        let src = accept_picked(files, origin).map_err(|err| {
            warn!("event=editor_image module=editor status=error error={err}");
            err
        })?;
        self.document.insert_image(&src);
        Ok(())
    }

    pub fn is_previewing(&self) -> bool {
        self.previewing
    }

    /// Flips between edit and preview; returns the new state.
    pub fn toggle_preview(&mut self) -> bool {
        self.previewing = !self.previewing;
        self.previewing
    }

    /// Excerpt the finalized article will carry.
    pub fn excerpt(&self) -> String {
        derive_excerpt(self.content())
    }

    /// Display-only plain-text preview; never persisted.
    pub fn preview_text(&self) -> String {
        derive_preview(self.content())
    }

    pub fn validate(&self) -> EditorResult<()> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push(RequiredField::Title);
        }
        if self.document.is_blank() {
            missing.push(RequiredField::Content);
        }
        if self.author.trim().is_empty() {
            missing.push(RequiredField::Author);
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(EditorError::Validation(missing))
        }
    }

    pub fn finalize(&self) -> EditorResult<Article> {
        self.finalize_at(Utc::now())
    }

    /// Builds the article record as of `now`.
    pub fn finalize_at(&self, now: DateTime<Utc>) -> EditorResult<Article> {
        self.validate()?;
        let (id, created_at) = match &self.mode {
            EditorMode::Create => (ArticleId::generate(), now),
            EditorMode::Edit { id, created_at } => (id.clone(), *created_at),
        };
        Ok(Article {
            id,
            title: self.title.trim().to_string(),
            content: self.content().to_string(),
            excerpt: self.excerpt(),
            cover_image: self.cover_image().map(str::to_string),
            author: self.author.trim().to_string(),
            created_at,
            updated_at: now.max(created_at),
            published: self.published,
            tags: self.tags.clone(),
        })
    }

    /// Validates, finalizes and persists through `store`.
    pub async fn save(&self, store: &mut ArticleStore) -> EditorResult<Article> {
        let article = self.finalize().map_err(|err| {
            warn!("event=editor_save module=editor status=error error={err}");
            err
        })?;
        let saved = match &self.mode {
            EditorMode::Create => store.create(NewArticle::from(article)).await?,
            EditorMode::Edit { id, .. } => {
                store.update(id, ArticlePatch::replace_all(&article)).await?
            }
        };
        info!(
            "event=editor_save module=editor status=ok article_id={} editing={}",
            saved.id,
            self.is_editing()
        );
        Ok(saved)
    }
}
