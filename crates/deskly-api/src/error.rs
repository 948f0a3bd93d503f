use std::collections::BTreeMap;

use thiserror::Error;

/// Top-level error type for the `deskly-api` crate.
///
/// Covers every failure mode of the REST surface: transport, auth,
/// missing resources, validation, and wire-format problems.
/// `deskly-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The backend rejected the bearer token with its
    /// "Invalid or expired token" signature. The registered
    /// session-expiry handler has already been invoked.
    #[error("Session expired -- sign in again")]
    SessionExpired,

    /// Any other 401. The stored token has been cleared.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// The token could not be encoded as a header value.
    #[error("Invalid bearer token: {0}")]
    InvalidToken(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Request ─────────────────────────────────────────────────────
    /// The caller built a request the backend can never accept
    /// (page 0, limit 0, unusable base URL).
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Reading a local file for upload failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ── Backend responses ───────────────────────────────────────────
    /// The id or slug does not exist (HTTP 404).
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// The backend rejected a payload (HTTP 400 / 409 / 422).
    #[error("Validation failed (HTTP {status}): {message}")]
    Validation {
        status: u16,
        message: String,
        /// Per-field messages, keyed by field name, when the backend supplied them.
        fields: BTreeMap<String, String>,
    },

    /// Any other non-success status, or a `{ success: false }` body.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the caller must re-authenticate.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::Unauthorized { .. })
    }

    /// Returns `true` for network-level failures (timeouts included).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    /// Per-field validation messages, if any.
    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Validation { fields, .. } if !fields.is_empty() => Some(fields),
            _ => None,
        }
    }

    /// HTTP status carried by the error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::SessionExpired | Self::Unauthorized { .. } => Some(401),
            Self::NotFound { .. } => Some(404),
            Self::Validation { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_only_for_non_empty_validation() {
        let empty = Error::Validation {
            status: 400,
            message: "bad".into(),
            fields: BTreeMap::new(),
        };
        assert!(empty.field_errors().is_none());

        let mut fields = BTreeMap::new();
        fields.insert("title".to_owned(), "title should not be empty".to_owned());
        let err = Error::Validation {
            status: 400,
            message: "bad".into(),
            fields,
        };
        assert_eq!(err.field_errors().map(BTreeMap::len), Some(1));
    }

    #[test]
    fn classification_helpers() {
        assert!(Error::SessionExpired.is_auth());
        assert!(Error::Timeout { timeout_secs: 30 }.is_transient());
        assert!(
            Error::NotFound {
                path: "/blogs/1".into()
            }
            .is_not_found()
        );
        assert_eq!(
            Error::Api {
                status: 500,
                message: "boom".into()
            }
            .status(),
            Some(500)
        );
    }
}
