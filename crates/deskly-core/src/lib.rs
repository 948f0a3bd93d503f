//! List controllers and client-side view derivation for deskly.
//!
//! - **[`ListController`]**: Owns one entity's record set and
//!   [`QueryState`]. [`load()`](ListController::load) fetches the full
//!   collection; mutations fold backend results into the local set and
//!   report outcomes as [`Notice`]s. Stale or cancelled loads are discarded.
//!
//! - **[`derive_view`]**: Pure search → filter → stable sort → paginate
//!   over a record slice, driven by an [`EntitySchema`].
//!
//! - **[`Entity`]**: The catalog of content types, each with its REST
//!   collection path and list schema.

pub mod catalog;
pub mod config;
pub mod controller;
pub mod error;
pub mod notice;
pub mod query;
pub mod schema;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use catalog::Entity;
pub use config::{ClientConfig, DEFAULT_API_URL, DEFAULT_FETCH_PAGE_SIZE};
pub use controller::{FetchTicket, ListController, LoadState};
pub use error::CoreError;
pub use notice::{Notice, NoticeLevel};
pub use query::{QueryState, SortDirection};
pub use schema::{EntitySchema, FilterRule, SortKey, SortKind};
pub use view::{View, derive_view, filter_and_sort};

// Transport types consumers need without depending on deskly-api directly.
pub use deskly_api::{
    BulkDeleteReport, CrudClient, Pagination, Record, RecordId, SessionExpiryHandler, SharedToken,
    TlsMode, UploadFile, UploadedFile,
};
