//! Authentication collaborator contract and implementations.
//!
//! # Responsibility
//! - Define how the session provider talks to an auth service.
//! - Broadcast session changes (sign-in, sign-out, token refresh) to subscribers.
//!
//! # Invariants
//! - Every successful sign-in, sign-out or refresh emits exactly one `AuthEvent`.
//! - Passwords are passed through and never stored or logged.

use crate::model::session::{AuthEvent, Session};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use tokio::sync::broadcast;

pub mod demo;
pub mod remote;

pub use demo::DemoAuth;
pub use remote::RemoteAuth;

/// Capacity of the auth event channel.
pub(crate) const AUTH_EVENT_CAPACITY: usize = 16;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Form input rejected before contacting the collaborator.
    InvalidInput(&'static str),
    /// Auth service is unconfigured or unreachable.
    BackendUnavailable(String),
    /// Wrong email/password or expired refresh token.
    InvalidCredentials(String),
    /// Auth service rejected the call for another reason.
    RemoteOperationFailed {
        status: Option<u16>,
        message: String,
    },
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(field) => write!(f, "{field} must not be blank"),
            Self::BackendUnavailable(details) => write!(f, "auth service not configured: {details}"),
            Self::InvalidCredentials(message) => write!(f, "invalid credentials: {message}"),
            Self::RemoteOperationFailed {
                status: Some(status),
                message,
            } => write!(f, "auth service rejected request ({status}): {message}"),
            Self::RemoteOperationFailed {
                status: None,
                message,
            } => write!(f, "auth service rejected request: {message}"),
        }
    }
}

impl Error for AuthError {}

/// External authentication service.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Session that already exists when the app starts, if any.
    async fn restore_session(&self) -> AuthResult<Option<Session>>;

    /// Registers an account. Returns a session when the service signs the
    /// user in immediately, `None` when confirmation is pending.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> AuthResult<Option<Session>>;

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Session>;

    async fn sign_out(&self, session: Option<&Session>) -> AuthResult<()>;

    /// Exchanges the refresh token for a new session.
    async fn refresh_session(&self, session: &Session) -> AuthResult<Session>;

    /// Subscribes to session change notifications.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// Sends an event; having no subscribers is not an error.
pub(crate) fn emit(events: &broadcast::Sender<AuthEvent>, event: AuthEvent) {
    log::debug!(
        "event=auth_notify module=auth kind={} subscribers={}",
        event.name(),
        events.receiver_count()
    );
    let _ = events.send(event);
}
