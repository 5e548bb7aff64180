//! Shared HTTP plumbing for the remote data and auth collaborators.

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ERROR_MESSAGE_CHARS: usize = 300;

pub(crate) fn build_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("articlehub/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Transport failures that mean the backend cannot be reached at all.
pub(crate) fn is_unavailable(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout() || err.is_builder()
}

/// Extracts the human-readable message from a backend error body.
///
/// Data endpoints answer `{"message": ...}`; auth endpoints answer
/// `{"error_description": ...}`, `{"msg": ...}` or `{"error": ...}`.
pub(crate) fn error_message(body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        ["message", "error_description", "msg", "error"]
            .iter()
            .find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_string))
    });
    let message = from_json.unwrap_or_else(|| body.trim().to_string());
    if message.is_empty() {
        return "empty response body".to_string();
    }
    crate::content::markup::truncate_chars(&message, MAX_ERROR_MESSAGE_CHARS).to_string()
}

#[cfg(test)]
mod tests {
    use super::error_message;

    #[test]
    fn error_message_prefers_known_json_keys() {
        assert_eq!(
            error_message(r#"{"code":"42501","message":"permission denied"}"#),
            "permission denied"
        );
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(error_message("  upstream timeout "), "upstream timeout");
        assert_eq!(error_message(""), "empty response body");
    }
}
