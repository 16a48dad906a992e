//! Snapshot endpoint client.
//!
//! The endpoint drives a headless browser: `GET <endpoint>?url=<target>`
//! answers with a nested accessibility snapshot, or `{"error": "..."}` with a
//! non-2xx status when the page could not be captured.

use std::time::Duration;

use axtree_snapshot::{Snapshot, SnapshotError};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Endpoint used when neither the CLI nor the environment names one.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/accessibility";

/// Environment variable overriding [`DEFAULT_ENDPOINT`].
pub const ENDPOINT_ENV: &str = "AXTREE_ENDPOINT";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Every way a snapshot fetch can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("snapshot request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("cannot decode snapshot: {0}")]
    Decode(String),
}

impl FetchError {
    /// The underlying message without the category prefix.
    pub fn message(&self) -> String {
        match self {
            FetchError::InvalidEndpoint(msg)
            | FetchError::Transport(msg)
            | FetchError::Decode(msg) => msg.clone(),
            FetchError::Timeout(after) => format!("timed out after {after:?}"),
            FetchError::Status { message, .. } => message.clone(),
        }
    }

    /// Worth retrying with the same request.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport(_) | FetchError::Timeout(_) => true,
            FetchError::Status { status, .. } => *status >= 500,
            FetchError::InvalidEndpoint(_) | FetchError::Decode(_) => false,
        }
    }
}

impl From<SnapshotError> for FetchError {
    fn from(err: SnapshotError) -> Self {
        FetchError::Decode(err.to_string())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Turn an endpoint response into a snapshot.
///
/// Kept free of I/O so the status and body handling can be tested without a
/// server.
pub fn parse_snapshot_response(status: u16, body: &str) -> Result<Snapshot, FetchError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|b| b.error)
            .unwrap_or_else(|_| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    "no response body".to_string()
                } else {
                    trimmed.to_string()
                }
            });
        return Err(FetchError::Status { status, message });
    }
    Ok(Snapshot::from_json(body)?)
}

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Clone)]
pub struct SnapshotClient {
    endpoint: Url,
    http: reqwest::Client,
    timeout: Duration,
}

impl SnapshotClient {
    pub fn new(endpoint: &str) -> Result<Self, FetchError> {
        let endpoint =
            Url::parse(endpoint).map_err(|e| FetchError::InvalidEndpoint(e.to_string()))?;
        Ok(Self {
            endpoint,
            http: reqwest::Client::new(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Full request URL for a target page.
    pub fn request_url(&self, target: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("url", target);
        url
    }

    /// Capture the accessibility snapshot of `target`.
    pub async fn fetch(&self, target: &str) -> Result<Snapshot, FetchError> {
        let url = self.request_url(target);
        debug!(%url, "requesting snapshot");

        let response = self
            .http
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.classify(e))?;
        let snapshot = parse_snapshot_response(status, &body)?;

        info!(target, status, bytes = body.len(), "snapshot fetched");
        Ok(snapshot)
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn success_body_decodes_as_snapshot() {
        let snapshot =
            parse_snapshot_response(200, r#"{"role":"WebArea","name":"Home","children":[]}"#)
                .unwrap();
        assert!(!snapshot.is_flat());
    }

    #[test]
    fn error_body_message_is_surfaced() {
        let err = parse_snapshot_response(400, r#"{"error":"Missing ?url="}"#).unwrap_err();
        assert_eq!(
            err,
            FetchError::Status {
                status: 400,
                message: "Missing ?url=".into()
            }
        );
        assert_eq!(err.message(), "Missing ?url=");
        assert!(!err.is_transient());
    }

    #[test]
    fn plain_text_error_body_is_kept() {
        let err = parse_snapshot_response(502, "Bad Gateway\n").unwrap_err();
        assert_eq!(err.message(), "Bad Gateway");
        assert!(err.is_transient());

        let err = parse_snapshot_response(500, "").unwrap_err();
        assert_eq!(err.message(), "no response body");
    }

    #[test]
    fn undecodable_success_body_is_decode_error() {
        let err = parse_snapshot_response(200, "<html>").unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));

        let err = parse_snapshot_response(200, "null").unwrap_err();
        assert!(err.message().starts_with("empty snapshot"));
    }

    #[test]
    fn request_url_encodes_target() {
        let client = SnapshotClient::new(DEFAULT_ENDPOINT).unwrap();
        let url = client.request_url("https://example.com/a?b=c&d");
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/api/accessibility?url=https%3A%2F%2Fexample.com%2Fa%3Fb%3Dc%26d"
        );
    }

    #[test]
    fn bad_endpoint_is_rejected() {
        let err = SnapshotClient::new("not a url").err().unwrap();
        assert!(matches!(err, FetchError::InvalidEndpoint(_)));
    }

    #[test]
    fn timeout_message() {
        let err = FetchError::Timeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "snapshot request timed out after 5s");
        assert!(err.is_transient());
    }
}
