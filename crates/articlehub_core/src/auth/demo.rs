//! In-process auth collaborator for demo mode.
//!
//! Every call succeeds with the fixed demo identity; sign-out clears it.

use crate::auth::{emit, AuthBackend, AuthResult, AUTH_EVENT_CAPACITY};
use crate::model::session::{AuthEvent, Session};
use async_trait::async_trait;
use tokio::sync::broadcast;

pub struct DemoAuth {
    events: broadcast::Sender<AuthEvent>,
}

impl DemoAuth {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self { events }
    }
}

impl Default for DemoAuth {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthBackend for DemoAuth {
    async fn restore_session(&self) -> AuthResult<Option<Session>> {
        Ok(Some(Session::demo()))
    }

    async fn sign_up(
        &self,
        _email: &str,
        _password: &str,
        _display_name: &str,
    ) -> AuthResult<Option<Session>> {
        let session = Session::demo();
        emit(&self.events, AuthEvent::SignedIn(session.clone()));
        Ok(Some(session))
    }

    async fn sign_in(&self, _email: &str, _password: &str) -> AuthResult<Session> {
        let session = Session::demo();
        emit(&self.events, AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self, _session: Option<&Session>) -> AuthResult<()> {
        emit(&self.events, AuthEvent::SignedOut);
        Ok(())
    }

    async fn refresh_session(&self, session: &Session) -> AuthResult<Session> {
        let refreshed = session.clone();
        emit(&self.events, AuthEvent::TokenRefreshed(refreshed.clone()));
        Ok(refreshed)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
