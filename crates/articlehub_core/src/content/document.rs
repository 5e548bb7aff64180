//! Rich-text document model with a tracked selection.
//!
//! # Responsibility
//! - Hold article markup verbatim, as loaded or last edited.
//! - Apply formatting and node insertion at an explicit selection instead of
//!   a rendering surface cursor.
//!
//! # Invariants
//! - Selection offsets are byte offsets into `markup`.
//! - A stored selection always lies on char boundaries and outside any tag.
//! - Every edit leaves the selection valid for the new markup (or clears it).

use crate::content::markup::{escape_attribute, escape_text};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Inline formatting commands offered by the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineFormat {
    Bold,
    Italic,
}

impl InlineFormat {
    fn tag(self) -> &'static str {
        match self {
            Self::Bold => "strong",
            Self::Italic => "em",
        }
    }
}

/// Half-open byte range `[start, end)` in the markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    start: usize,
    end: usize,
}

impl Selection {
    /// Builds a selection; endpoints are reordered when reversed.
    pub fn new(anchor: usize, focus: usize) -> Self {
        Self {
            start: anchor.min(focus),
            end: anchor.max(focus),
        }
    }

    pub fn caret(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    OutOfBounds { offset: usize, len: usize },
    NotCharBoundary(usize),
    InsideTag(usize),
    CrossesTags { start: usize, end: usize },
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfBounds { offset, len } => {
                write!(f, "selection offset {offset} exceeds markup length {len}")
            }
            Self::NotCharBoundary(offset) => {
                write!(f, "selection offset {offset} is not on a char boundary")
            }
            Self::InsideTag(offset) => write!(f, "selection offset {offset} falls inside a tag"),
            Self::CrossesTags { start, end } => {
                write!(f, "selection {start}..{end} spans an element boundary")
            }
        }
    }
}

impl Error for DocumentError {}

/// Editable article body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichDocument {
    markup: String,
    selection: Option<Selection>,
}

impl RichDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads existing markup verbatim with no selection.
    pub fn from_markup(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            selection: None,
        }
    }

    pub fn markup(&self) -> &str {
        self.markup.as_str()
    }

    pub fn is_blank(&self) -> bool {
        self.markup.trim().is_empty()
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Tracks a new selection after checking both endpoints.
    ///
    /// The range must stay within one text run so formatting and
    /// replacement keep the markup well nested.
    pub fn select(&mut self, selection: Selection) -> Result<(), DocumentError> {
        self.check_offset(selection.start)?;
        self.check_offset(selection.end)?;
        if self.markup[selection.start..selection.end].contains('<') {
            return Err(DocumentError::CrossesTags {
                start: selection.start,
                end: selection.end,
            });
        }
        self.selection = Some(selection);
        Ok(())
    }

    pub fn place_caret(&mut self, offset: usize) -> Result<(), DocumentError> {
        self.select(Selection::caret(offset))
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Replaces the whole body, as when the user edits markup directly.
    pub fn replace_markup(&mut self, markup: impl Into<String>) {
        self.markup = markup.into();
        self.selection = None;
    }

    /// Types `text` over the selection, or appends it when nothing is selected.
    pub fn insert_text(&mut self, text: &str) {
        let escaped = escape_text(text);
        match self.selection {
            Some(selection) => {
                self.markup
                    .replace_range(selection.start..selection.end, &escaped);
                self.selection = Some(Selection::caret(selection.start + escaped.len()));
            }
            None => self.markup.push_str(&escaped),
        }
    }

    /// Wraps the selection in the format's tag pair.
    ///
    /// A collapsed selection inserts an empty pair with the caret inside it.
    /// Returns `false` and changes nothing when there is no selection.
    pub fn apply_format(&mut self, format: InlineFormat) -> bool {
        let Some(selection) = self.selection else {
            return false;
        };

        let open = format!("<{}>", format.tag());
        let close = format!("</{}>", format.tag());
        self.markup.insert_str(selection.end, &close);
        self.markup.insert_str(selection.start, &open);
        self.selection = Some(Selection::new(
            selection.start + open.len(),
            selection.end + open.len(),
        ));
        true
    }

    /// Inserts an image node referencing `src` (URL or data URL).
    ///
    /// The node goes at the selection start and the caret moves after it.
    /// Without a selection the node is appended at the end.
    pub fn insert_image(&mut self, src: &str) {
        let node = image_node(src);
        match self.selection {
            Some(selection) => {
                self.markup.insert_str(selection.start, &node);
                self.selection = Some(Selection::caret(selection.start + node.len()));
            }
            None => self.markup.push_str(&node),
        }
    }

    fn check_offset(&self, offset: usize) -> Result<(), DocumentError> {
        if offset > self.markup.len() {
            return Err(DocumentError::OutOfBounds {
                offset,
                len: self.markup.len(),
            });
        }
        if !self.markup.is_char_boundary(offset) {
            return Err(DocumentError::NotCharBoundary(offset));
        }

        let before = &self.markup[..offset];
        let inside_tag = match (before.rfind('<'), before.rfind('>')) {
            (Some(open), Some(close)) => open > close,
            (Some(_), None) => true,
            _ => false,
        };
        if inside_tag {
            return Err(DocumentError::InsideTag(offset));
        }
        Ok(())
    }
}

fn image_node(src: &str) -> String {
    format!(r#"<img src="{}" alt="" />"#, escape_attribute(src))
}
