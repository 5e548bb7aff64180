//! Session provider.
//!
//! # Responsibility
//! - Track the current session and publish it through a `watch` channel.
//! - Expose sign-up, sign-in and sign-out on top of an `AuthBackend`.
//! - Mirror the collaborator's change notifications into local state.
//! - Renew a session once it reaches its expiry.
//!
//! # Invariants
//! - Local state follows collaborator events, applied in order.
//! - An expired session whose refresh is rejected becomes "signed out".
//! - A completed `sign_in`/`sign_out` call has already been reflected locally.
//! - Dropping the provider stops the notification listener.

use crate::auth::{AuthBackend, AuthError, AuthResult};
use crate::model::session::{AuthEvent, Identity, Session};
use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

/// Delay before renewing again after a transport failure.
const RENEW_RETRY_SECS: i64 = 30;

/// Current session, shared with article stores.
pub type SessionWatch = watch::Receiver<Option<Session>>;

pub struct SessionProvider {
    auth: Arc<dyn AuthBackend>,
    state: watch::Receiver<Option<Session>>,
    listener: JoinHandle<()>,
}

impl SessionProvider {
    /// Restores any existing session and starts listening for changes.
    ///
    /// A failing restore is logged and treated as "signed out". An expired
    /// restored session is renewed before the provider is returned.
    pub async fn start(auth: Arc<dyn AuthBackend>) -> Self {
        let events = auth.subscribe();
        let mut initial = match auth.restore_session().await {
            Ok(session) => session,
            Err(err) => {
                warn!("event=session_restore module=session status=error error={err}");
                None
            }
        };
        let mut retry_at = None;
        let expired = initial
            .clone()
            .filter(|session| session.is_expired_at(Utc::now()));
        if let Some(session) = expired {
            match renew(auth.as_ref(), &session).await {
                Renewal::Renewed(next) => initial = next,
                Renewal::RetryLater => retry_at = Some(retry_deadline()),
            }
        }
        info!(
            "event=session_restore module=session status=ok signed_in={}",
            initial.is_some()
        );

        let (sender, state) = watch::channel(initial);
        let listener = tokio::spawn(mirror_events(auth.clone(), events, sender, retry_at));
        Self {
            auth,
            state,
            listener,
        }
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state
            .borrow()
            .as_ref()
            .map(|session| session.identity.clone())
    }

    pub fn session(&self) -> Option<Session> {
        self.state.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Receiver that observes every session change.
    pub fn subscribe(&self) -> SessionWatch {
        self.state.clone()
    }

    pub async fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> AuthResult<Option<Session>> {
        let email = required(email, "email")?;
        let password = required_raw(password, "password")?;
        let display_name = required(display_name, "display name")?;

        let session = self.auth.sign_up(email, password, display_name).await?;
        if let Some(session) = &session {
            self.wait_for_identity(Some(session.user_id())).await;
        }
        Ok(session)
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> AuthResult<Session> {
        let email = required(email, "email")?;
        let password = required_raw(password, "password")?;

        let session = self.auth.sign_in(email, password).await?;
        self.wait_for_identity(Some(session.user_id())).await;
        Ok(session)
    }

    pub async fn sign_out(&mut self) -> AuthResult<()> {
        let current = self.session();
        self.auth.sign_out(current.as_ref()).await?;
        self.wait_for_identity(None).await;
        Ok(())
    }

    /// Refreshes the current session's tokens; no-op when signed out.
    pub async fn refresh(&mut self) -> AuthResult<Option<Session>> {
        let Some(current) = self.session() else {
            return Ok(None);
        };
        match self.auth.refresh_session(&current).await {
            Ok(refreshed) => {
                self.wait_for_identity(Some(refreshed.user_id())).await;
                Ok(Some(refreshed))
            }
            Err(err @ AuthError::InvalidCredentials(_)) => {
                self.wait_for_identity(None).await;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    async fn wait_for_identity(&mut self, user_id: Option<&str>) {
        let reached = self
            .state
            .wait_for(|session| session.as_ref().map(Session::user_id) == user_id)
            .await
            .is_ok();
        if !reached {
            warn!("event=session_wait module=session status=error reason=listener_stopped");
        }
    }
}

impl Drop for SessionProvider {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

async fn mirror_events(
    auth: Arc<dyn AuthBackend>,
    mut events: broadcast::Receiver<AuthEvent>,
    state: watch::Sender<Option<Session>>,
    mut retry_at: Option<DateTime<Utc>>,
) {
    loop {
        let expires_at = state.borrow().as_ref().and_then(|session| session.expires_at);
        let deadline = match (expires_at, retry_at) {
            (Some(expires_at), Some(retry_at)) => Some(expires_at.max(retry_at)),
            (expires_at, _) => expires_at,
        };
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    info!(
                        "event=session_change module=session status=ok kind={}",
                        event.name()
                    );
                    retry_at = None;
                    replace_session(&state, event.into_session());
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("event=session_change module=session status=lagged skipped={skipped}");
                }
                Err(RecvError::Closed) => break,
            },
            () = sleep_until(deadline) => {
                let current = state.borrow().clone();
                let Some(session) = current else { continue };
                match renew(auth.as_ref(), &session).await {
                    Renewal::Renewed(next) => {
                        let still_expired = next
                            .as_ref()
                            .is_some_and(|session| session.is_expired_at(Utc::now()));
                        retry_at = still_expired.then(retry_deadline);
                        replace_session(&state, next);
                    }
                    Renewal::RetryLater => retry_at = Some(retry_deadline()),
                }
            }
        }
    }
}

enum Renewal {
    /// Session state after the collaborator answered; `None` when rejected.
    Renewed(Option<Session>),
    /// The collaborator was unreachable; the expired session is kept.
    RetryLater,
}

async fn renew(auth: &dyn AuthBackend, session: &Session) -> Renewal {
    info!("event=session_expire module=session status=start");
    match auth.refresh_session(session).await {
        Ok(refreshed) => {
            info!("event=session_expire module=session status=ok renewed=true");
            Renewal::Renewed(Some(refreshed))
        }
        Err(err @ AuthError::InvalidCredentials(_)) => {
            info!("event=session_expire module=session status=ok renewed=false reason={err}");
            Renewal::Renewed(None)
        }
        Err(err) => {
            warn!("event=session_expire module=session status=error error={err}");
            Renewal::RetryLater
        }
    }
}

fn retry_deadline() -> DateTime<Utc> {
    Utc::now() + Duration::seconds(RENEW_RETRY_SECS)
}

async fn sleep_until(deadline: Option<DateTime<Utc>>) {
    match deadline {
        Some(deadline) => {
            let wait = (deadline - Utc::now()).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;
        }
        None => std::future::pending().await,
    }
}

fn replace_session(state: &watch::Sender<Option<Session>>, next: Option<Session>) {
    state.send_if_modified(|current| {
        if *current == next {
            return false;
        }
        *current = next;
        true
    });
}

fn required<'a>(value: &'a str, field: &'static str) -> AuthResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AuthError::InvalidInput(field));
    }
    Ok(trimmed)
}

fn required_raw<'a>(value: &'a str, field: &'static str) -> AuthResult<&'a str> {
    if value.trim().is_empty() {
        return Err(AuthError::InvalidInput(field));
    }
    Ok(value)
}
