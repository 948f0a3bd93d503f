// deskly-api: Async Rust client for the deskly content backend

pub mod auth;
pub mod client;
pub mod envelope;
pub mod error;
pub mod params;
pub mod record;
pub mod transport;
pub mod upload;

pub use auth::{SessionExpiryHandler, SharedToken, TokenSource};
pub use client::{BulkDeleteFailure, BulkDeleteReport, CrudClient, DeleteAck};
pub use envelope::{EnvelopeShape, ListPage, Pagination};
pub use error::Error;
pub use params::{DEFAULT_LIMIT, ListParams, SortOrder};
pub use record::{Record, RecordId};
pub use transport::{TlsMode, TransportConfig};
pub use upload::{UploadFile, UploadedFile};
