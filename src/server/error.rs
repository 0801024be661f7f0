//! Errors raised while serving connections.

use std::io;

use thiserror::Error;
use tokio::task::JoinError;

use crate::error::InspectError;

/// Errors that may occur while handling a connection.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Socket setup or forwarding failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The client's `ClientHello` could not be inspected.
    #[error("inspection failed: {0}")]
    Inspect(#[from] InspectError),
    /// The blocking inspection task did not complete.
    #[error("inspection task failed: {0}")]
    Join(#[from] JoinError),
}
