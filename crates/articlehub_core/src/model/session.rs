//! Authenticated identity and session model.
//!
//! # Invariants
//! - Access and refresh tokens never appear in `Debug` output.
//! - A demo session carries no tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};

pub const DEMO_USER_ID: &str = "demo-user";
pub const DEMO_USER_EMAIL: &str = "demo@example.com";
pub const DEMO_USER_NAME: &str = "Demo User";

/// Owning identity for articles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub display_name: String,
}

impl Identity {
    /// Fixed identity used by demo mode.
    pub fn demo() -> Self {
        Self {
            id: DEMO_USER_ID.to_string(),
            email: DEMO_USER_EMAIL.to_string(),
            display_name: DEMO_USER_NAME.to_string(),
        }
    }
}

/// Active session issued by the auth collaborator.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: Identity,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn demo() -> Self {
        Self::without_tokens(Identity::demo())
    }

    pub fn without_tokens(identity: Identity) -> Self {
        Self {
            identity,
            access_token: None,
            refresh_token: None,
            expires_at: None,
        }
    }

    pub fn user_id(&self) -> &str {
        self.identity.id.as_str()
    }

    /// Whether the session reached its expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Session change notification emitted by an auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
}

impl AuthEvent {
    /// Session state after this event.
    pub fn into_session(self) -> Option<Session> {
        match self {
            Self::SignedIn(session) | Self::TokenRefreshed(session) => Some(session),
            Self::SignedOut => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SignedIn(_) => "signed_in",
            Self::TokenRefreshed(_) => "token_refreshed",
            Self::SignedOut => "signed_out",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Session;

    #[test]
    fn debug_output_redacts_tokens() {
        let mut session = Session::demo();
        session.access_token = Some("secret-access".to_string());
        session.refresh_token = Some("secret-refresh".to_string());
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("secret-access"));
        assert!(!rendered.contains("secret-refresh"));
        assert!(rendered.contains("<redacted>"));
    }
}
