//! Subcommand implementations.
//!
//! Commands print their results to stdout. Failures bubble up as
//! [`CommandError`] and are shown through the notifier by `main`.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod watch;

use fastbite_client::{ApiError, ChannelError, ClientError, Runtime, StorageError};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A runtime operation failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The backend rejected the session; it has been cleared.
    #[error("Your session has expired. Please log in again.")]
    SessionExpired,

    /// No password on the command line or in the environment.
    #[error("A password is required (use --password or FASTBITE_PASSWORD)")]
    MissingPassword,

    /// Input rejected before contacting the backend.
    #[error("{0}")]
    Invalid(String),
}

impl CommandError {
    /// Message for the error alert.
    pub fn user_message(&self) -> String {
        match self {
            Self::Client(e) => e.user_message(),
            _ => self.to_string(),
        }
    }
}

impl From<ApiError> for CommandError {
    fn from(e: ApiError) -> Self {
        Self::Client(e.into())
    }
}

impl From<StorageError> for CommandError {
    fn from(e: StorageError) -> Self {
        Self::Client(e.into())
    }
}

impl From<ChannelError> for CommandError {
    fn from(e: ChannelError) -> Self {
        Self::Client(e.into())
    }
}

/// Map a "no result" outcome to [`CommandError::SessionExpired`] when the
/// session was torn down by it. An empty success body passes through.
pub fn ensure_session<T>(runtime: &Runtime, value: Option<T>) -> Result<Option<T>, CommandError> {
    if value.is_none() && !runtime.session().is_authenticated() {
        return Err(CommandError::SessionExpired);
    }
    Ok(value)
}
