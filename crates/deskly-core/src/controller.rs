// ── List controller ──
//
// Owns one entity's in-memory record set and query state. Loads the full
// collection from the backend, derives views client-side, and folds the
// results of mutations back into the local set so the view stays current
// without a re-fetch.
//
// Every load is tagged with a generation. Only the response for the most
// recent generation is applied; earlier responses are discarded whenever
// they arrive. Each load also carries a child cancellation token so an
// in-flight fetch can be abandoned when the consumer goes away.

use deskly_api::{BulkDeleteReport, CrudClient, ListParams, Record, RecordId};
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::Entity;
use crate::config::DEFAULT_FETCH_PAGE_SIZE;
use crate::error::CoreError;
use crate::notice::Notice;
use crate::query::{DEFAULT_PAGE_SIZE, QueryState};
use crate::schema::EntitySchema;
use crate::view::{View, derive_view};

// ── LoadState ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Loading,
    Ready,
}

/// Handle for one fetch. Hand it back to
/// [`ListController::complete_load`] with the fetch result.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    generation: u64,
    cancel: CancellationToken,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cancelled when this fetch is superseded or the controller goes away.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

// ── ListController ───────────────────────────────────────────────────

pub struct ListController {
    schema: EntitySchema,
    query: QueryState,
    records: Vec<Record>,
    state: LoadState,
    generation: u64,
    /// Lifetime token; cancelled on drop.
    cancel: CancellationToken,
    /// Child token of the fetch currently in flight.
    in_flight: Option<CancellationToken>,
    fetch_page_size: u32,
    notices: Vec<Notice>,
    load_error: Option<CoreError>,
}

impl ListController {
    /// A controller starts in `Loading` with no records.
    pub fn new(schema: EntitySchema) -> Self {
        let mut query = QueryState::new(DEFAULT_PAGE_SIZE);
        if let Some((key, direction)) = &schema.default_sort {
            query = query.with_sort(key.clone(), *direction);
        }
        Self {
            schema,
            query,
            records: Vec::new(),
            state: LoadState::Loading,
            generation: 0,
            cancel: CancellationToken::new(),
            in_flight: None,
            fetch_page_size: DEFAULT_FETCH_PAGE_SIZE,
            notices: Vec::new(),
            load_error: None,
        }
    }

    pub fn for_entity(entity: Entity) -> Self {
        Self::new(entity.schema())
    }

    pub fn with_fetch_page_size(mut self, size: u32) -> Self {
        self.fetch_page_size = size.max(1);
        self
    }

    pub fn with_page_size(mut self, size: u32) -> Self {
        self.query.set_page_size(size);
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut QueryState {
        &mut self.query
    }

    /// Current page, derived from the record set and query state.
    pub fn view(&self) -> View<'_> {
        derive_view(&self.records, &self.schema, &self.query)
    }

    /// Local lookup; does not touch the network.
    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Drain the notices accumulated since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Error from the most recent applied load, if it failed.
    pub fn load_error(&self) -> Option<&CoreError> {
        self.load_error.as_ref()
    }

    pub fn take_load_error(&mut self) -> Option<CoreError> {
        self.load_error.take()
    }

    /// Cancelling this token abandons the current fetch and all future ones.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Start a new fetch. Any fetch still in flight is superseded.
    pub fn begin_load(&mut self) -> FetchTicket {
        if let Some(prev) = self.in_flight.take() {
            prev.cancel();
        }
        self.generation += 1;
        self.state = LoadState::Loading;
        let cancel = self.cancel.child_token();
        self.in_flight = Some(cancel.clone());
        FetchTicket {
            generation: self.generation,
            cancel,
        }
    }

    /// Apply a fetch result if its ticket is still current.
    ///
    /// Returns `false` when the result was discarded as stale or
    /// cancelled. A failed fetch leaves the controller `Ready` with an
    /// empty record set and an error notice.
    pub fn complete_load(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<Record>, deskly_api::Error>,
    ) -> bool {
        if ticket.generation != self.generation || ticket.cancel.is_cancelled() {
            debug!(
                entity = %self.schema.name,
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale load"
            );
            return false;
        }

        self.in_flight = None;
        self.state = LoadState::Ready;
        match result {
            Ok(records) => {
                info!(entity = %self.schema.name, count = records.len(), "records loaded");
                self.records = records;
                self.load_error = None;
            }
            Err(e) => {
                let err = CoreError::from(e);
                warn!(entity = %self.schema.name, error = %err, "load failed");
                self.records.clear();
                self.notices
                    .push(Notice::error(format!("Failed to load {}s: {err}", self.schema.name)));
                self.load_error = Some(err);
            }
        }
        true
    }

    /// Fetch the whole collection and apply it.
    pub async fn load(&mut self, client: &CrudClient) -> bool {
        let ticket = self.begin_load();
        let params = ListParams::default().limit(self.fetch_page_size);
        let endpoint = self.schema.endpoint.clone();

        let result = tokio::select! {
            () = ticket.cancel.cancelled() => {
                debug!(entity = %self.schema.name, "load cancelled");
                return false;
            }
            result = client.list_all(&endpoint, &params) => result,
        };
        self.complete_load(&ticket, result)
    }

    /// Abandon the fetch in flight, keeping the current records.
    pub fn cancel(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
        self.state = LoadState::Ready;
    }

    // ── Local patches ────────────────────────────────────────────────

    pub fn apply_created(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Replace the record with the same id. Returns `false` if absent.
    pub fn apply_updated(&mut self, record: Record) -> bool {
        match self.records.iter_mut().find(|r| r.id() == record.id()) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    pub fn apply_removed(&mut self, id: &RecordId) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id() != id);
        self.records.len() != before
    }

    // ── Remote reads ─────────────────────────────────────────────────

    /// `GET` one record and fold it into the local set.
    pub async fn fetch(&mut self, client: &CrudClient, id: &RecordId) -> Result<Record, CoreError> {
        let record = client
            .get_by_id(&self.schema.endpoint, id)
            .await
            .map_err(|e| CoreError::from(e).for_entity(&self.schema.name, id.as_str()))?;
        self.upsert(record.clone());
        Ok(record)
    }

    pub async fn fetch_by_slug(
        &mut self,
        client: &CrudClient,
        slug: &str,
    ) -> Result<Record, CoreError> {
        let record = client
            .get_by_slug(&self.schema.endpoint, slug)
            .await
            .map_err(|e| CoreError::from(e).for_entity(&self.schema.name, slug))?;
        self.upsert(record.clone());
        Ok(record)
    }

    fn upsert(&mut self, record: Record) {
        if !self.apply_updated(record.clone()) {
            self.records.push(record);
        }
    }

    // ── Mutations ────────────────────────────────────────────────────

    pub async fn create(&mut self, client: &CrudClient, payload: &Value) -> Result<Record, CoreError> {
        match client.create(&self.schema.endpoint, payload).await {
            Ok(record) => {
                info!(entity = %self.schema.name, id = %record.id(), "created");
                self.notices
                    .push(Notice::success(format!("Created {} {}", self.schema.name, record.id())));
                self.apply_created(record.clone());
                Ok(record)
            }
            Err(e) => Err(self.fail("create", None, e)),
        }
    }

    pub async fn update(
        &mut self,
        client: &CrudClient,
        id: &RecordId,
        patch: &Value,
    ) -> Result<Record, CoreError> {
        match client.update(&self.schema.endpoint, id, patch).await {
            Ok(record) => {
                info!(entity = %self.schema.name, %id, "updated");
                self.notices
                    .push(Notice::success(format!("Updated {} {id}", self.schema.name)));
                self.apply_updated(record.clone());
                Ok(record)
            }
            Err(e) => Err(self.fail("update", Some(id.as_str()), e)),
        }
    }

    /// Change a record's status. Values outside the schema vocabulary are
    /// rejected without a request.
    pub async fn update_status(
        &mut self,
        client: &CrudClient,
        id: &RecordId,
        status: &str,
    ) -> Result<Record, CoreError> {
        if !self.schema.accepts_status(status) {
            let allowed = self.schema.statuses.join(", ");
            let err = CoreError::ValidationFailed {
                message: format!("unknown status {status:?}"),
                fields: [("status".to_owned(), format!("must be one of: {allowed}"))].into(),
            };
            self.notices.push(
                Notice::error(err.to_string())
                    .with_fields(err.field_errors().cloned().unwrap_or_default()),
            );
            return Err(err);
        }

        match client.update_status(&self.schema.endpoint, id, status).await {
            Ok(returned) => {
                info!(entity = %self.schema.name, %id, status, "status changed");
                self.notices.push(Notice::success(format!(
                    "Set {} {id} to {status}",
                    self.schema.name
                )));
                // Some handlers answer with only the changed fields.
                let record = match self.get(id) {
                    Some(local) => {
                        let mut merged = local.clone();
                        merged.merge(returned.fields());
                        merged.set("status", Value::String(status.to_owned()));
                        merged
                    }
                    None => returned,
                };
                self.apply_updated(record.clone());
                Ok(record)
            }
            Err(e) => Err(self.fail("status change", Some(id.as_str()), e)),
        }
    }

    pub async fn delete(&mut self, client: &CrudClient, id: &RecordId) -> Result<(), CoreError> {
        match client.delete(&self.schema.endpoint, id).await {
            Ok(_) => {
                info!(entity = %self.schema.name, %id, "deleted");
                self.apply_removed(id);
                self.notices
                    .push(Notice::success(format!("Deleted {} {id}", self.schema.name)));
                Ok(())
            }
            Err(e) => Err(self.fail("delete", Some(id.as_str()), e)),
        }
    }

    /// Delete ids in order, stopping at the first failure. Only
    /// successfully deleted ids leave the local set.
    pub async fn bulk_delete(&mut self, client: &CrudClient, ids: &[RecordId]) -> BulkDeleteReport {
        let report = client.bulk_delete(&self.schema.endpoint, ids).await;
        for id in &report.deleted {
            self.apply_removed(id);
        }

        let name = &self.schema.name;
        let notice = match &report.failed {
            None => Notice::success(format!("Deleted {} {name}(s)", report.deleted.len())),
            Some(failure) => {
                warn!(
                    entity = %name,
                    deleted = report.deleted.len(),
                    skipped = report.skipped.len(),
                    "bulk delete incomplete"
                );
                let fields = failure.error.field_errors().cloned().unwrap_or_default();
                Notice::error(format!(
                    "Deleted {} of {} {name}(s); {} failed: {}; {} not attempted",
                    report.deleted.len(),
                    ids.len(),
                    failure.id,
                    failure.error,
                    report.skipped.len(),
                ))
                .with_fields(fields)
            }
        };
        self.notices.push(notice);
        report
    }

    fn fail(&mut self, action: &str, id: Option<&str>, err: deskly_api::Error) -> CoreError {
        let mut err = CoreError::from(err);
        if let Some(id) = id {
            err = err.for_entity(&self.schema.name, id);
        }
        warn!(entity = %self.schema.name, action, error = %err, "mutation failed");
        let fields = err.field_errors().cloned().unwrap_or_default();
        self.notices.push(
            Notice::error(format!("Could not {action} {}: {err}", self.schema.name))
                .with_fields(fields),
        );
        err
    }
}

impl Drop for ListController {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
