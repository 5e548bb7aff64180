//! Rich content handling for the article editor.
//!
//! # Responsibility
//! - Markup stripping and excerpt/preview derivation (`markup`).
//! - Explicit document model with a tracked selection (`document`).
//! - Image acquisition and validation (`image`).

pub mod document;
pub mod image;
pub mod markup;
