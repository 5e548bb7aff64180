//! Core domain logic for ArticleHub.
//! This crate is the single source of truth for article, session and editor invariants.

pub mod app;
pub mod auth;
pub mod config;
pub mod content;
pub mod db;
mod http;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod view;

pub use app::{AppContext, AppError};
pub use auth::{AuthBackend, AuthError, AuthResult, DemoAuth, RemoteAuth};
pub use config::{AppConfig, BackendEndpoint, BackendMode, ConfigError};
pub use content::document::{DocumentError, InlineFormat, RichDocument, Selection};
pub use content::image::{ImageError, ImageInput, PickOrigin, PickedFile, MAX_IMAGE_BYTES};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::article::{Article, ArticleId, ArticlePatch, ArticleValidationError, NewArticle};
pub use model::session::{AuthEvent, Identity, Session};
pub use repo::{
    ArticleSource, LocalArticleSource, RemoteArticleSource, RepoError, RepoResult, SourceKind,
};
pub use service::article_store::ArticleStore;
pub use service::editor::{ArticleEditor, EditorError, EditorMode, EditorResult, RequiredField};
pub use service::session_provider::{SessionProvider, SessionWatch};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
