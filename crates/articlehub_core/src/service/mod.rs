//! Use-case services on top of the auth and article collaborators.
//!
//! # Responsibility
//! - Track the signed-in session (`session_provider`).
//! - Own the in-memory article collection (`article_store`).
//! - Hold the editor working copy and save it (`editor`).

pub mod article_store;
pub mod editor;
pub mod session_provider;
