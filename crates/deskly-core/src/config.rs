// ── Client configuration ──
//
// Everything needed to reach one backend. Built by the CLI from a
// resolved profile; consumed here to construct a `CrudClient`.

use std::sync::Arc;
use std::time::Duration;

use deskly_api::{
    CrudClient, SessionExpiryHandler, SharedToken, TlsMode, TokenSource, TransportConfig,
};
use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;

/// Fallback base URL when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

/// Page size used when fetching a full collection for client-side views.
pub const DEFAULT_FETCH_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: Url,
    pub token: Option<SecretString>,
    pub tls: TlsMode,
    pub timeout: Duration,
    pub fetch_page_size: u32,
}

impl ClientConfig {
    /// Parse `api_url` and apply defaults for everything else.
    pub fn parse(api_url: &str) -> Result<Self, CoreError> {
        let url = Url::parse(api_url).map_err(|e| CoreError::Config {
            message: format!("invalid API URL {api_url:?}: {e}"),
        })?;
        Ok(Self::new(url))
    }

    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            token: None,
            tls: TlsMode::default(),
            timeout: deskly_api::transport::DEFAULT_TIMEOUT,
            fetch_page_size: DEFAULT_FETCH_PAGE_SIZE,
        }
    }

    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a client whose shared token starts as `self.token`.
    ///
    /// Returns the token handle too, so callers can observe it being
    /// cleared on session expiry.
    pub fn connect(
        &self,
        on_session_expired: Option<SessionExpiryHandler>,
    ) -> Result<(CrudClient, SharedToken), CoreError> {
        let tokens = SharedToken::new(self.token.clone());
        let client = self.connect_with(Arc::new(tokens.clone()), on_session_expired)?;
        Ok((client, tokens))
    }

    /// Build a client over a caller-provided token source.
    pub fn connect_with(
        &self,
        tokens: Arc<dyn TokenSource>,
        on_session_expired: Option<SessionExpiryHandler>,
    ) -> Result<CrudClient, CoreError> {
        let transport = TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
        };
        let client = CrudClient::new(self.api_url.as_str(), &transport, tokens)?;
        Ok(match on_session_expired {
            Some(handler) => client.with_session_expiry(handler),
            None => client,
        })
    }
}
