// ── Core error types ──
//
// User-facing errors from deskly-core. Consumers never see reqwest errors
// or JSON parse failures directly; `From<deskly_api::Error>` translates
// transport-layer errors into domain variants.

use std::collections::BTreeMap;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Network ──────────────────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Backend request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Auth ─────────────────────────────────────────────────────────
    #[error("Session expired -- sign in again")]
    SessionExpired,

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    // ── Data ─────────────────────────────────────────────────────────
    #[error("{entity} not found: {identifier}")]
    NotFound { entity: String, identifier: String },

    #[error("Validation failed: {message}")]
    ValidationFailed {
        message: String,
        fields: BTreeMap<String, String>,
    },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Timeouts and connection failures share one user-facing path.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. } | Self::Timeout { .. })
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::Unauthorized { .. })
    }

    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::ValidationFailed { fields, .. } if !fields.is_empty() => Some(fields),
            _ => None,
        }
    }

    /// Attach the entity name to a `NotFound` raised without one.
    pub(crate) fn for_entity(self, entity: &str, identifier: &str) -> Self {
        match self {
            Self::NotFound { .. } => Self::NotFound {
                entity: entity.to_owned(),
                identifier: identifier.to_owned(),
            },
            other => other,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<deskly_api::Error> for CoreError {
    fn from(err: deskly_api::Error) -> Self {
        match err {
            deskly_api::Error::SessionExpired => Self::SessionExpired,
            deskly_api::Error::Unauthorized { message } => Self::Unauthorized { message },
            deskly_api::Error::InvalidToken(reason) => Self::Config {
                message: format!("invalid bearer token: {reason}"),
            },
            deskly_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    Self::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    Self::ConnectionFailed {
                        url: e.url().map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    Self::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            deskly_api::Error::InvalidUrl(e) => Self::Config {
                message: format!("Invalid URL: {e}"),
            },
            deskly_api::Error::Timeout { timeout_secs } => Self::Timeout { timeout_secs },
            deskly_api::Error::Tls(msg) => Self::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            deskly_api::Error::InvalidRequest { message } => Self::Internal(message),
            deskly_api::Error::Io(e) => Self::Internal(format!("IO error: {e}")),
            deskly_api::Error::NotFound { path } => Self::NotFound {
                entity: "resource".into(),
                identifier: path,
            },
            deskly_api::Error::Validation {
                message, fields, ..
            } => Self::ValidationFailed { message, fields },
            deskly_api::Error::Api { status, message } => Self::Api {
                message,
                status: Some(status),
            },
            deskly_api::Error::Deserialization { message, body: _ } => {
                Self::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
