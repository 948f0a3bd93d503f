//! Shared configuration for the deskly CLI.
//!
//! TOML profiles, token resolution (env + keyring + plaintext), and
//! translation to `deskly_core::ClientConfig`. The CLI layers flag
//! overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use deskly_core::{ClientConfig, DEFAULT_API_URL, DEFAULT_FETCH_PAGE_SIZE, TlsMode};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "DESKLY_CONFIG";
pub const API_URL_ENV: &str = "DESKLY_API_URL";
pub const TOKEN_ENV: &str = "DESKLY_TOKEN";

const KEYRING_SERVICE: &str = "deskly";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("unknown profile '{profile}'")]
    UnknownProfile { profile: String },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Rows per page in list views.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            page_size: default_page_size(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_page_size() -> u32 {
    10
}

/// A named backend profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// API base URL (e.g., "https://cms.example.com/api").
    pub api_url: Option<String>,

    /// Bearer token (plaintext, prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable name containing the token.
    pub token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Accept invalid TLS certificates.
    pub insecure: Option<bool>,

    /// Override timeout in seconds.
    pub timeout: Option<u64>,

    /// Page size used when fetching whole collections.
    pub fetch_page_size: Option<u32>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `$DESKLY_CONFIG`, else platform conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "deskly", "deskly").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("deskly");
    p
}

// ── Config loading ──────────────────────────────────────────────────

pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` merged with `DESKLY_*` variables.
///
/// Nested keys use a double underscore: `DESKLY_DEFAULTS__OUTPUT=json`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("DESKLY_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token resolution ────────────────────────────────────────────────

fn keyring_key(profile_name: &str) -> String {
    format!("{profile_name}/token")
}

fn keyring_lookup(profile_name: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_key(profile_name))
        .ok()?
        .get_password()
        .ok()
}

/// Resolve the bearer token for a profile.
///
/// Order: `token_env` variable, `DESKLY_TOKEN`, system keyring, plaintext
/// profile token. `None` means unauthenticated; requests are still sent.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    resolve_token_with(
        profile,
        profile_name,
        |name| std::env::var(name).ok(),
        keyring_lookup,
    )
}

/// [`resolve_token`] with injectable environment and keyring lookups.
pub fn resolve_token_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Option<SecretString> {
    let non_empty = |v: String| (!v.trim().is_empty()).then_some(v);

    profile
        .token_env
        .as_deref()
        .and_then(&env)
        .and_then(non_empty)
        .or_else(|| env(TOKEN_ENV).and_then(non_empty))
        .or_else(|| keyring(profile_name).and_then(non_empty))
        .or_else(|| profile.token.clone().and_then(non_empty))
        .map(SecretString::from)
}

/// Store a token in the system keyring under `<profile>/token`.
pub fn store_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_key(profile_name))
        .and_then(|entry| entry.set_password(token))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

// ── Translation to ClientConfig ─────────────────────────────────────

/// Base URL order: explicit override, `DESKLY_API_URL`, profile, built-in
/// localhost fallback.
pub fn resolve_api_url(
    flag: Option<&str>,
    env: Option<String>,
    profile: &Profile,
) -> String {
    flag.map(str::to_owned)
        .or_else(|| env.filter(|v| !v.trim().is_empty()))
        .or_else(|| profile.api_url.clone())
        .unwrap_or_else(|| DEFAULT_API_URL.to_owned())
}

/// Build a `ClientConfig` from a profile with no flag overrides.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    let raw = resolve_api_url(None, std::env::var(API_URL_ENV).ok(), profile);
    let mut config = client_config(&raw, profile, defaults)?;
    config.token = resolve_token(profile, profile_name);
    Ok(config)
}

/// Token-less `ClientConfig` for `api_url`, with TLS, timeout and fetch
/// size taken from the profile.
pub fn client_config(
    api_url: &str,
    profile: &Profile,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    let url: url::Url = api_url.parse().map_err(|_| ConfigError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL: {api_url}"),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("not a base URL: {api_url}"),
        });
    }

    let tls = if profile.insecure.unwrap_or(false) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    let mut config = ClientConfig::new(url)
        .with_timeout(Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)));
    config.tls = tls;
    config.fetch_page_size = profile.fetch_page_size.unwrap_or(DEFAULT_FETCH_PAGE_SIZE);
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn token_of(t: Option<SecretString>) -> Option<String> {
        t.map(|s| s.expose_secret().to_owned())
    }

    #[test]
    fn token_chain_prefers_profile_env_then_global_env() {
        let profile = Profile {
            token: Some("plain".into()),
            token_env: Some("CMS_TOKEN".into()),
            ..Profile::default()
        };
        let env = |name: &str| match name {
            "CMS_TOKEN" => Some("from-profile-env".to_owned()),
            TOKEN_ENV => Some("from-global-env".to_owned()),
            _ => None,
        };
        let t = resolve_token_with(&profile, "default", env, no_env);
        assert_eq!(token_of(t).as_deref(), Some("from-profile-env"));

        let env = |name: &str| (name == TOKEN_ENV).then(|| "from-global-env".to_owned());
        let t = resolve_token_with(&profile, "default", env, no_env);
        assert_eq!(token_of(t).as_deref(), Some("from-global-env"));
    }

    #[test]
    fn token_chain_falls_back_to_keyring_then_plaintext() {
        let profile = Profile {
            token: Some("plain".into()),
            ..Profile::default()
        };
        let keyring = |name: &str| (name == "staging").then(|| "from-keyring".to_owned());
        let t = resolve_token_with(&profile, "staging", no_env, keyring);
        assert_eq!(token_of(t).as_deref(), Some("from-keyring"));

        let t = resolve_token_with(&profile, "default", no_env, keyring);
        assert_eq!(token_of(t).as_deref(), Some("plain"));
    }

    #[test]
    fn missing_token_is_none_not_error() {
        let t = resolve_token_with(&Profile::default(), "default", no_env, no_env);
        assert!(t.is_none());
    }

    #[test]
    fn api_url_precedence() {
        let profile = Profile {
            api_url: Some("https://profile.example/api".into()),
            ..Profile::default()
        };
        assert_eq!(
            resolve_api_url(Some("https://flag.example/api"), Some("https://env.example".into()), &profile),
            "https://flag.example/api"
        );
        assert_eq!(
            resolve_api_url(None, Some("https://env.example".into()), &profile),
            "https://env.example"
        );
        assert_eq!(resolve_api_url(None, None, &profile), "https://profile.example/api");
        assert_eq!(resolve_api_url(None, None, &Profile::default()), DEFAULT_API_URL);
    }

    #[test]
    fn client_config_applies_profile_overrides() {
        let profile = Profile {
            insecure: Some(true),
            timeout: Some(5),
            fetch_page_size: Some(250),
            ..Profile::default()
        };
        let cfg = client_config("https://cms.example/api", &profile, &Defaults::default()).unwrap();
        assert_eq!(cfg.tls, TlsMode::DangerAcceptInvalid);
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(cfg.fetch_page_size, 250);
        assert!(cfg.token.is_none());
    }

    #[test]
    fn invalid_url_is_validation_error() {
        let err = client_config("not a url", &Profile::default(), &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "api_url"));
    }

    #[test]
    fn save_then_load_round_trips_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.defaults.page_size = 25;
        cfg.profiles.insert(
            "default".into(),
            Profile {
                api_url: Some("http://localhost:4000/api".into()),
                token_env: Some("CMS_TOKEN".into()),
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.defaults.page_size, 25);
        assert_eq!(loaded.profiles["default"], cfg.profiles["default"]);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded.default_profile.as_deref(), Some("default"));
        assert!(loaded.profiles.is_empty());
    }
}
