//! Auth collaborator for a hosted token-based auth service.
//!
//! # Responsibility
//! - Password sign-up/sign-in, sign-out and refresh-token exchange over REST.
//! - Emit `AuthEvent`s mirroring the service's session transitions.
//!
//! # Invariants
//! - A failed refresh is treated as session expiry and emits `SignedOut`.
//! - Sign-out with an already-rejected token still ends the local session.

use crate::auth::{emit, AuthBackend, AuthError, AuthResult, AUTH_EVENT_CAPACITY};
use crate::config::BackendEndpoint;
use crate::http::{build_client, error_message, is_unavailable};
use crate::model::session::{AuthEvent, Identity, Session};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::{info, warn};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;

const SIGNUP_PATH: &str = "auth/v1/signup";
const TOKEN_PATH: &str = "auth/v1/token";
const LOGOUT_PATH: &str = "auth/v1/logout";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    user: UserRecord,
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    full_name: Option<String>,
}

impl From<TokenResponse> for Session {
    fn from(response: TokenResponse) -> Self {
        let email = response.user.email.unwrap_or_default();
        let display_name = response
            .user
            .user_metadata
            .full_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| email.clone());
        Self {
            identity: Identity {
                id: response.user.id,
                email,
                display_name,
            },
            access_token: Some(response.access_token),
            refresh_token: response.refresh_token,
            expires_at: response
                .expires_in
                .map(|seconds| Utc::now() + Duration::seconds(seconds)),
        }
    }
}

pub struct RemoteAuth {
    client: Client,
    endpoint: BackendEndpoint,
    events: broadcast::Sender<AuthEvent>,
}

impl RemoteAuth {
    pub fn try_new(endpoint: BackendEndpoint) -> AuthResult<Self> {
        let client = build_client().map_err(|err| {
            AuthError::BackendUnavailable(format!("http client setup failed: {err}"))
        })?;
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Ok(Self {
            client,
            endpoint,
            events,
        })
    }

    fn url(&self, path: &str) -> AuthResult<Url> {
        self.endpoint
            .join(path)
            .map_err(|err| AuthError::BackendUnavailable(err.to_string()))
    }

    fn post(&self, path: &str) -> AuthResult<RequestBuilder> {
        Ok(self
            .client
            .post(self.url(path)?)
            .header("apikey", self.endpoint.access_key()))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> AuthResult<T> {
        let response = request.send().await.map_err(|err| transport_error(operation, &err))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(operation, status, &body));
        }
        response.json::<T>().await.map_err(|err| AuthError::RemoteOperationFailed {
            status: Some(status.as_u16()),
            message: format!("{operation} response could not be decoded: {err}"),
        })
    }
}

fn transport_error(operation: &'static str, err: &reqwest::Error) -> AuthError {
    warn!("event=auth_{operation} module=auth status=error error={err}");
    if is_unavailable(err) {
        AuthError::BackendUnavailable(err.to_string())
    } else {
        AuthError::RemoteOperationFailed {
            status: None,
            message: err.to_string(),
        }
    }
}

fn status_error(operation: &'static str, status: StatusCode, body: &str) -> AuthError {
    let message = error_message(body);
    warn!(
        "event=auth_{operation} module=auth status=error http_status={} error={}",
        status.as_u16(),
        message
    );
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => AuthError::InvalidCredentials(message),
        other => AuthError::RemoteOperationFailed {
            status: Some(other.as_u16()),
            message,
        },
    }
}

#[async_trait]
impl AuthBackend for RemoteAuth {
    async fn restore_session(&self) -> AuthResult<Option<Session>> {
        Ok(None)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> AuthResult<Option<Session>> {
        let request = self.post(SIGNUP_PATH)?.json(&json!({
            "email": email,
            "password": password,
            "data": { "full_name": display_name },
        }));
        let body: Value = self.send_json("sign_up", request).await?;
        if body.get("access_token").is_none() {
            info!("event=auth_sign_up module=auth status=ok session=pending_confirmation");
            return Ok(None);
        }

        let session: Session = serde_json::from_value::<TokenResponse>(body)
            .map_err(|err| AuthError::RemoteOperationFailed {
                status: None,
                message: format!("sign_up response could not be decoded: {err}"),
            })?
            .into();
        info!(
            "event=auth_sign_up module=auth status=ok user_id={}",
            session.user_id()
        );
        emit(&self.events, AuthEvent::SignedIn(session.clone()));
        Ok(Some(session))
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Session> {
        let request = self
            .post(TOKEN_PATH)?
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        let session: Session = self
            .send_json::<TokenResponse>("sign_in", request)
            .await?
            .into();
        info!(
            "event=auth_sign_in module=auth status=ok user_id={}",
            session.user_id()
        );
        emit(&self.events, AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self, session: Option<&Session>) -> AuthResult<()> {
        if let Some(token) = session.and_then(|session| session.access_token.as_deref()) {
            let response = self
                .post(LOGOUT_PATH)?
                .bearer_auth(token)
                .send()
                .await
                .map_err(|err| transport_error("sign_out", &err))?;
            let status = response.status();
            let token_rejected =
                status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN;
            if !status.is_success() && !token_rejected {
                let body = response.text().await.unwrap_or_default();
                return Err(status_error("sign_out", status, &body));
            }
        }

        info!("event=auth_sign_out module=auth status=ok");
        emit(&self.events, AuthEvent::SignedOut);
        Ok(())
    }

    async fn refresh_session(&self, session: &Session) -> AuthResult<Session> {
        let Some(refresh_token) = session.refresh_token.as_deref() else {
            emit(&self.events, AuthEvent::SignedOut);
            return Err(AuthError::InvalidCredentials(
                "session has no refresh token".to_string(),
            ));
        };

        let request = self
            .post(TOKEN_PATH)?
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token }));
        match self.send_json::<TokenResponse>("refresh", request).await {
            Ok(response) => {
                let refreshed: Session = response.into();
                emit(&self.events, AuthEvent::TokenRefreshed(refreshed.clone()));
                Ok(refreshed)
            }
            Err(err @ AuthError::InvalidCredentials(_)) => {
                emit(&self.events, AuthEvent::SignedOut);
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
