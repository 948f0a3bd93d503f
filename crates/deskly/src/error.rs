//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use std::collections::BTreeMap;

use miette::Diagnostic;
use thiserror::Error;

use deskly_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to backend at {url}")]
    #[diagnostic(
        code(deskly::connection_failed),
        help(
            "Check that the backend is running and reachable.\n\
             {reason}\n\
             Set the URL with --api-url or: deskly config set api_url <URL>"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(deskly::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Session expired")]
    #[diagnostic(
        code(deskly::session_expired),
        help(
            "The stored token was rejected as invalid or expired.\n\
             Store a fresh one with: deskly config set-token --profile {profile}"
        )
    )]
    SessionExpired { profile: String },

    #[error("Not authorized: {message}")]
    #[diagnostic(
        code(deskly::unauthorized),
        help(
            "Provide a token with --token, DESKLY_TOKEN, or:\n\
             deskly config set-token --profile {profile}"
        )
    )]
    Unauthorized { message: String, profile: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(deskly::not_found),
        help("Run: deskly {list_command} to see available records")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Rejected by backend: {message}")]
    #[diagnostic(code(deskly::rejected), help("{hint}"))]
    Rejected { message: String, hint: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error(
        "API error ({}): {message}",
        .status.map_or_else(|| "no status".to_owned(), |s| s.to_string())
    )]
    #[diagnostic(code(deskly::api_error))]
    ApiError { status: Option<u16>, message: String },

    #[error("Deleted {deleted} of {requested}; stopped at '{failed_id}'")]
    #[diagnostic(
        code(deskly::partial_delete),
        help("{reason}\nNot attempted: {skipped}")
    )]
    PartialDelete {
        deleted: usize,
        requested: usize,
        failed_id: String,
        reason: String,
        skipped: String,
    },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(deskly::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(deskly::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: deskly config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(deskly::config))]
    Config(#[from] deskly_config::ConfigError),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(deskly::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(deskly::json), help("Check the JSON payload and try again."))]
    Json(#[from] serde_json::Error),

    #[error("YAML rendering failed: {0}")]
    #[diagnostic(code(deskly::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(deskly::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::SessionExpired { .. } | Self::Unauthorized { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Translate a core error raised while working on `entity` under `profile`.
    pub fn from_core(err: CoreError, entity: &str, profile: &str) -> Self {
        match err {
            CoreError::SessionExpired => Self::SessionExpired {
                profile: profile.into(),
            },
            CoreError::Unauthorized { message } => Self::Unauthorized {
                message,
                profile: profile.into(),
            },
            CoreError::NotFound {
                entity: resource_type,
                identifier,
            } => Self::NotFound {
                resource_type,
                identifier,
                list_command: format!("{entity} list"),
            },
            other => other.into(),
        }
    }
}

fn format_fields(fields: &BTreeMap<String, String>) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("  {k}: {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },

            CoreError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },

            CoreError::SessionExpired => Self::SessionExpired {
                profile: "default".into(),
            },

            CoreError::Unauthorized { message } => Self::Unauthorized {
                message,
                profile: "default".into(),
            },

            CoreError::NotFound { entity, identifier } => Self::NotFound {
                list_command: "<entity> list".into(),
                resource_type: entity,
                identifier,
            },

            CoreError::ValidationFailed { message, fields } => Self::Rejected {
                hint: if fields.is_empty() {
                    "Check the payload against the backend's validation rules.".into()
                } else {
                    format!("Field errors:\n{}", format_fields(&fields))
                },
                message,
            },

            CoreError::Api { message, status } => Self::ApiError { status, message },

            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        let auth = CliError::from_core(CoreError::SessionExpired, "blogs", "prod");
        assert_eq!(auth.exit_code(), exit_code::AUTH);

        let missing = CliError::from_core(
            CoreError::NotFound {
                entity: "blog post".into(),
                identifier: "x".into(),
            },
            "blogs",
            "prod",
        );
        assert_eq!(missing.exit_code(), exit_code::NOT_FOUND);
        assert!(
            matches!(missing, CliError::NotFound { ref list_command, .. } if list_command == "blogs list")
        );

        let invalid: CliError = CoreError::ValidationFailed {
            message: "bad".into(),
            fields: BTreeMap::from([("title".into(), "title should not be empty".into())]),
        }
        .into();
        assert_eq!(invalid.exit_code(), exit_code::CONFLICT);

        let slow: CliError = CoreError::Timeout { timeout_secs: 5 }.into();
        assert_eq!(slow.exit_code(), exit_code::TIMEOUT);

        let down: CliError = CoreError::ConnectionFailed {
            url: "http://localhost:3000".into(),
            reason: "refused".into(),
        }
        .into();
        assert_eq!(down.exit_code(), exit_code::CONNECTION);
    }
}
