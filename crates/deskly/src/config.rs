//! CLI configuration: a thin wrapper around `deskly_config` shared types.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--api-url, --token, --insecure, --timeout).

use std::time::Duration;

use secrecy::SecretString;

use deskly_core::{ClientConfig, TlsMode};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use deskly_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config, store_token,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    names.sort();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

/// Check that `api_url` would be accepted as a base URL.
pub fn client_config_check(api_url: &str) -> Result<(), CliError> {
    deskly_config::client_config(api_url, &Profile::default(), &Defaults::default())?;
    Ok(())
}

/// Build a `ClientConfig` from the config file, active profile, and flags.
///
/// A missing profile is only an error when `--profile` named it
/// explicitly; otherwise an empty profile yields the built-in defaults.
pub fn resolve_client_config(
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<(ClientConfig, String), CliError> {
    let profile_name = active_profile_name(global, cfg);
    let fallback = Profile::default();
    let profile = match cfg.profiles.get(&profile_name) {
        Some(p) => p,
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(cfg),
            });
        }
        None => &fallback,
    };

    // 1. Base URL (flag/env > profile > fallback); clap folds DESKLY_API_URL into the flag
    let api_url = deskly_config::resolve_api_url(global.api_url.as_deref(), None, profile);
    let mut config = deskly_config::client_config(&api_url, profile, &cfg.defaults)?;

    // 2. Token (flag > profile chain)
    config.token = match global.token {
        Some(ref token) => Some(SecretString::from(token.clone())),
        None => deskly_config::resolve_token(profile, &profile_name),
    };

    // 3. TLS and timeout overrides
    if global.insecure {
        config.tls = TlsMode::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }

    Ok((config, profile_name))
}
