//! Command dispatch: bridges CLI args -> list controller -> output formatting.

pub mod config_cmd;
pub mod entity;
pub mod upload;
pub mod util;

use deskly_core::CrudClient;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// A connected client plus the settings handlers need alongside it.
pub struct Session {
    pub client: CrudClient,
    pub profile: String,
    /// Per-request page size used when loading whole collections.
    pub fetch_page_size: u32,
    /// Rows per page when `--page-size` is absent.
    pub page_size: u32,
}

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd.into_entity() {
        Ok((entity, args)) => entity::handle(entity, args, session, global).await,
        Err(Command::Upload(args)) => upload::handle(args, session, global).await,
        // Config and Completions are handled before dispatch
        Err(other) => Err(CliError::Internal(format!(
            "command {other:?} does not talk to the backend"
        ))),
    }
}
