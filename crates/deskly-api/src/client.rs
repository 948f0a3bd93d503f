// Async CRUD client for the deskly content backend.
//
// Every entity follows one REST pattern:
//   GET    /{entity}                list (envelope or bare array)
//   GET    /{entity}/{id}           get by id
//   GET    /{entity}/slug/{slug}    get by slug
//   POST   /{entity}                create
//   PATCH  /{entity}/{id}           partial update
//   PATCH  /{entity}/{id}/status    status change, body `{ status }`
//   DELETE /{entity}/{id}           delete
// Auth: `Authorization: Bearer <token>` when a token is available.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::auth::{SessionExpiryHandler, TokenSource};
use crate::envelope::{self, EnvelopeShape, ListPage};
use crate::error::Error;
use crate::params::ListParams;
use crate::record::{Record, RecordId};
use crate::transport::TransportConfig;

/// Message the backend uses for an invalid or expired bearer token.
const SESSION_EXPIRED_MESSAGE: &str = "Invalid or expired token";

/// Safety stop for `list_all` against a backend whose `hasNextPage` never flips.
const MAX_PAGES: u32 = 1_000;

// ── Error response shape ────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum MessageField {
    One(String),
    Many(Vec<String>),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    message: Option<MessageField>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    status_code: Option<u16>,
    #[serde(default)]
    errors: Option<BTreeMap<String, Value>>,
}

impl ErrorBody {
    fn messages(&self) -> Vec<String> {
        match &self.message {
            Some(MessageField::One(m)) => vec![m.clone()],
            Some(MessageField::Many(ms)) => ms.clone(),
            None => Vec::new(),
        }
    }

    fn is_session_expired(&self) -> bool {
        let message_matches =
            matches!(&self.message, Some(MessageField::One(m)) if m == SESSION_EXPIRED_MESSAGE);
        let error_ok = self.error.as_deref().is_none_or(|e| e == "Unauthorized");
        let code_ok = self.status_code.is_none_or(|c| c == 401);
        message_matches && error_ok && code_ok
    }

    /// Per-field messages from an `errors` map, or from validator-style
    /// message arrays where the first word names the field.
    fn fields(&self) -> BTreeMap<String, String> {
        if let Some(ref errors) = self.errors {
            return errors
                .iter()
                .map(|(k, v)| (k.clone(), flatten_message(v)))
                .collect();
        }
        let Some(MessageField::Many(ref ms)) = self.message else {
            return BTreeMap::new();
        };
        let mut fields = BTreeMap::new();
        for m in ms {
            if let Some((field, _)) = m.split_once(' ') {
                fields
                    .entry(field.to_owned())
                    .and_modify(|existing: &mut String| {
                        existing.push_str("; ");
                        existing.push_str(m);
                    })
                    .or_insert_with(|| m.clone());
            }
        }
        fields
    }
}

fn flatten_message(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(flatten_message)
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

// ── Result types ─────────────────────────────────────────────────────

/// Body of a successful DELETE. An empty body counts as success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteAck {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_true() -> bool {
    true
}

/// The id that stopped a bulk delete, and why.
#[derive(Debug)]
pub struct BulkDeleteFailure {
    pub id: RecordId,
    pub error: Error,
}

/// Outcome of a sequential bulk delete.
///
/// Deletes run in order and stop at the first failure. Earlier deletes
/// are not rolled back; ids after the failure are reported as `skipped`.
#[derive(Debug, Default)]
pub struct BulkDeleteReport {
    pub deleted: Vec<RecordId>,
    pub failed: Option<BulkDeleteFailure>,
    pub skipped: Vec<RecordId>,
}

impl BulkDeleteReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_none()
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Stateless async client for the content backend.
///
/// Owns no records and caches nothing. The bearer token is read from the
/// injected [`TokenSource`] on every request.
pub struct CrudClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    tokens: Arc<dyn TokenSource>,
    on_session_expired: Option<SessionExpiryHandler>,
}

impl CrudClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client for `base_url` (e.g. `http://localhost:3000/api`).
    pub fn new(
        base_url: &str,
        transport: &TransportConfig,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let mut client = Self::from_reqwest(base_url, http, tokens)?;
        client.timeout = transport.timeout;
        Ok(client)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(
        base_url: &str,
        http: reqwest::Client,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidRequest {
                message: format!("base URL cannot carry a path: {base_url}"),
            });
        }
        Ok(Self {
            http,
            base_url,
            timeout: crate::transport::DEFAULT_TIMEOUT,
            tokens,
            on_session_expired: None,
        })
    }

    /// Register the callback fired on an invalid/expired-token 401.
    pub fn with_session_expiry(mut self, handler: SessionExpiryHandler) -> Self {
        self.on_session_expired = Some(handler);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// `{base}/{endpoint...}/{segments...}`, each segment percent-encoded.
    pub(crate) fn url(&self, endpoint: &str, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| Error::InvalidRequest {
                message: format!("base URL cannot carry a path: {}", self.base_url),
            })?;
            path.pop_if_empty();
            path.extend(endpoint.split('/').filter(|s| !s.is_empty()));
            path.extend(segments);
        }
        Ok(url)
    }

    // ── Request plumbing ─────────────────────────────────────────────

    fn authorize(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, Error> {
        let Some(token) = self.tokens.token() else {
            return Ok(builder);
        };
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|e| Error::InvalidToken(e.to_string()))?;
        value.set_sensitive(true);
        Ok(builder.header(AUTHORIZATION, value))
    }

    pub(crate) async fn send(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, Error> {
        let builder = self.authorize(builder)?;
        builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                }
            } else {
                Error::Transport(e)
            }
        })
    }

    /// Return the body text of a successful response, or the mapped error.
    pub(crate) async fn body_text(&self, resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(self.parse_error(status, resp).await);
        }
        resp.text().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                }
            } else {
                Error::Transport(e)
            }
        })
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let path = resp.url().path().to_owned();
        let raw = resp.text().await.unwrap_or_default();
        let body = serde_json::from_str::<ErrorBody>(&raw).ok();
        let message = body
            .as_ref()
            .map(ErrorBody::messages)
            .filter(|m| !m.is_empty())
            .map_or_else(
                || {
                    if raw.is_empty() {
                        status.to_string()
                    } else {
                        raw.chars().take(200).collect()
                    }
                },
                |m| m.join("; "),
            );

        match status.as_u16() {
            401 => {
                self.tokens.clear();
                if body.as_ref().is_some_and(ErrorBody::is_session_expired) {
                    warn!("session expired; invoking session-expiry handler");
                    if let Some(ref handler) = self.on_session_expired {
                        handler();
                    }
                    Error::SessionExpired
                } else {
                    Error::Unauthorized { message }
                }
            }
            404 => Error::NotFound { path },
            400 | 409 | 422 => Error::Validation {
                status: status.as_u16(),
                fields: body.as_ref().map(ErrorBody::fields).unwrap_or_default(),
                message,
            },
            code => Error::Api {
                status: code,
                message,
            },
        }
    }

    async fn fetch_record(&self, builder: reqwest::RequestBuilder) -> Result<Record, Error> {
        let resp = self.send(builder).await?;
        let body = self.body_text(resp).await?;
        envelope::parse_single(&body)
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// `GET /{endpoint}` with paging, search, sort and filters on the query string.
    pub async fn list(&self, endpoint: &str, params: &ListParams) -> Result<ListPage, Error> {
        let query = params.to_query()?;
        let url = self.url(endpoint, &[])?;
        debug!("GET {url} params={query:?}");

        let resp = self.send(self.http.get(url).query(&query)).await?;
        let body = self.body_text(resp).await?;
        envelope::parse_list(&body, params.page, params.effective_limit())
    }

    /// Walk every page starting at `params.page` and concatenate the records.
    ///
    /// Stops on `hasNextPage == false`, an empty page, once `total` records
    /// have been seen, or immediately for a bare-array response.
    pub async fn list_all(&self, endpoint: &str, params: &ListParams) -> Result<Vec<Record>, Error> {
        let mut params = params.clone();
        let mut all = Vec::new();

        for _ in 0..MAX_PAGES {
            let page = self.list(endpoint, &params).await?;
            let received = page.records.len();
            let total = page.pagination.total;
            let has_next = page.pagination.has_next_page;
            let shape = page.shape;
            all.extend(page.records);

            if shape == EnvelopeShape::Bare
                || !has_next
                || received == 0
                || u64::try_from(all.len()).unwrap_or(u64::MAX) >= total
            {
                return Ok(all);
            }
            params.page += 1;
        }

        warn!(endpoint, pages = MAX_PAGES, "list_all stopped at page limit");
        Ok(all)
    }

    /// `GET /{endpoint}/{id}`.
    pub async fn get_by_id(&self, endpoint: &str, id: &RecordId) -> Result<Record, Error> {
        let url = self.url(endpoint, &[id.as_str()])?;
        debug!("GET {url}");
        self.fetch_record(self.http.get(url)).await
    }

    /// `GET /{endpoint}/slug/{slug}`.
    pub async fn get_by_slug(&self, endpoint: &str, slug: &str) -> Result<Record, Error> {
        let url = self.url(endpoint, &["slug", slug])?;
        debug!("GET {url}");
        self.fetch_record(self.http.get(url)).await
    }

    /// `POST /{endpoint}`; returns the created record with its assigned id.
    pub async fn create<B: Serialize + Sync + ?Sized>(
        &self,
        endpoint: &str,
        payload: &B,
    ) -> Result<Record, Error> {
        let url = self.url(endpoint, &[])?;
        debug!("POST {url}");
        self.fetch_record(self.http.post(url).json(payload)).await
    }

    /// `PATCH /{endpoint}/{id}` with a partial body.
    pub async fn update<B: Serialize + Sync + ?Sized>(
        &self,
        endpoint: &str,
        id: &RecordId,
        patch: &B,
    ) -> Result<Record, Error> {
        let url = self.url(endpoint, &[id.as_str()])?;
        debug!("PATCH {url}");
        self.fetch_record(self.http.patch(url).json(patch)).await
    }

    /// `PATCH /{endpoint}/{id}/status` with `{ "status": status }`.
    pub async fn update_status(
        &self,
        endpoint: &str,
        id: &RecordId,
        status: &str,
    ) -> Result<Record, Error> {
        #[derive(Serialize)]
        struct Body<'a> {
            status: &'a str,
        }

        let url = self.url(endpoint, &[id.as_str(), "status"])?;
        debug!("PATCH {url} status={status}");
        self.fetch_record(self.http.patch(url).json(&Body { status }))
            .await
    }

    /// `DELETE /{endpoint}/{id}`. Deleting a missing id is an error.
    pub async fn delete(&self, endpoint: &str, id: &RecordId) -> Result<DeleteAck, Error> {
        let url = self.url(endpoint, &[id.as_str()])?;
        debug!("DELETE {url}");

        let resp = self.send(self.http.delete(url)).await?;
        let is_json = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("json"));
        let body = self.body_text(resp).await?;
        if body.trim().is_empty() {
            return Ok(DeleteAck {
                success: true,
                message: None,
            });
        }
        let ack: DeleteAck = match serde_json::from_str(&body) {
            Ok(ack) => ack,
            Err(e) if is_json => {
                return Err(Error::Deserialization {
                    message: e.to_string(),
                    body,
                });
            }
            Err(_) => {
                debug!("DELETE returned a non-JSON body; treating 2xx as success");
                DeleteAck {
                    success: true,
                    message: None,
                }
            }
        };
        if ack.success {
            Ok(ack)
        } else {
            Err(Error::Api {
                status: 200,
                message: ack
                    .message
                    .unwrap_or_else(|| "backend reported success: false".into()),
            })
        }
    }

    /// Delete each id in turn; there is no backend bulk endpoint.
    pub async fn bulk_delete(&self, endpoint: &str, ids: &[RecordId]) -> BulkDeleteReport {
        let mut report = BulkDeleteReport::default();
        let mut iter = ids.iter();

        for id in iter.by_ref() {
            match self.delete(endpoint, id).await {
                Ok(_) => report.deleted.push(id.clone()),
                Err(error) => {
                    warn!(endpoint, id = %id, error = %error, "bulk delete stopped");
                    report.failed = Some(BulkDeleteFailure {
                        id: id.clone(),
                        error,
                    });
                    break;
                }
            }
        }
        report.skipped.extend(iter.cloned());
        report
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }
}
