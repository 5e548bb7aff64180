//! Domain model for articles and sessions.
//!
//! # Responsibility
//! - Define canonical data structures used by the repository, editor and views.
//!
//! # Invariants
//! - Every article is identified by a stable `ArticleId`.
//! - Article excerpts are derived, never edited independently.

pub mod article;
pub mod session;
