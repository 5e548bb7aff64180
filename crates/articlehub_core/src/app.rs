//! Application context wiring.
//!
//! # Responsibility
//! - Select demo or remote collaborators once, from `AppConfig`.
//! - Build the session provider and the article store on top of them.
//!
//! # Invariants
//! - The store observes the provider's session; there is no global state.

use crate::auth::{AuthBackend, AuthError, DemoAuth, RemoteAuth};
use crate::config::{AppConfig, BackendMode, ConfigError};
use crate::repo::{ArticleSource, LocalArticleSource, RemoteArticleSource, RepoError, SourceKind};
use crate::service::article_store::ArticleStore;
use crate::service::session_provider::SessionProvider;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Repo(RepoError),
    Auth(AuthError),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Auth(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Auth(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<RepoError> for AppError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<AuthError> for AppError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

/// Session provider and article store for one application scope.
pub struct AppContext {
    pub session: SessionProvider,
    pub articles: ArticleStore,
}

impl AppContext {
    pub async fn bootstrap(config: &AppConfig) -> Result<Self, AppError> {
        let (source, auth): (Arc<dyn ArticleSource>, Arc<dyn AuthBackend>) = match &config.backend
        {
            BackendMode::Demo => {
                let local = match &config.demo_db_path {
                    Some(path) => LocalArticleSource::open(path)?,
                    None => LocalArticleSource::in_memory()?,
                };
                local.seed_demo()?;
                (Arc::new(local), Arc::new(DemoAuth::new()))
            }
            BackendMode::Remote(endpoint) => (
                Arc::new(RemoteArticleSource::try_new(endpoint.clone())?),
                Arc::new(RemoteAuth::try_new(endpoint.clone())?),
            ),
        };
        Ok(Self::with_collaborators(source, auth).await)
    }

    /// Wires explicit collaborators, bypassing configuration.
    pub async fn with_collaborators(
        source: Arc<dyn ArticleSource>,
        auth: Arc<dyn AuthBackend>,
    ) -> Self {
        let session = SessionProvider::start(auth).await;
        let articles = ArticleStore::new(source, session.subscribe());
        info!(
            "event=app_bootstrap module=app status=ok source={} signed_in={}",
            articles.source_kind().as_str(),
            session.is_signed_in()
        );
        Self { session, articles }
    }

    pub fn source_kind(&self) -> SourceKind {
        self.articles.source_kind()
    }
}
