//! Errors returned by this crate
//!
//! Some variants are not really failures, but outcomes a caller (typically a sync pass) is expected to branch on.
//! See [`Error::is_sentinel`].

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The backend configuration is incomplete. Nothing has been sent over the network
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Timeouts, refused connections, TLS failures...
    #[error("connection error: {0}")]
    Connection(#[from] reqwest::Error),

    /// The server answered a well-formed exchange with an unexpected status code
    #[error("unexpected HTTP status {status} for {operation}")]
    Protocol { operation: &'static str, status: StatusCode },

    #[error("malformed server response: {0}")]
    MalformedResponse(String),

    #[error("OCS request failed ({statuscode}): {message}")]
    Ocs { statuscode: u32, message: String },

    #[error("invalid task: {0}")]
    InvalidTask(String),

    #[error("{0} is not supported by this backend")]
    NotSupported(&'static str),

    #[error("list {0} is already published")]
    AlreadyPublished(String),

    #[error("list {0} is not published")]
    NotPublished(String),

    #[error("list {0} not found")]
    ListNotFound(String),

    #[error("task {0} not found")]
    TaskNotFound(String),

    /// The server refused to write into this list (e.g. it is a subscription)
    #[error("list {0} is read-only")]
    ReadOnly(String),

    #[error("a list named {0} already exists")]
    AlreadyExists(String),
}

impl Error {
    /// Whether this is one of the domain outcomes callers branch on, rather than a generic failure
    pub fn is_sentinel(&self) -> bool {
        matches!(
            self,
            Error::NotSupported(_)
                | Error::AlreadyPublished(_)
                | Error::NotPublished(_)
                | Error::ListNotFound(_)
                | Error::TaskNotFound(_)
                | Error::ReadOnly(_)
                | Error::AlreadyExists(_)
        )
    }

    /// Whether this error comes from the network layer, and may be worth retrying later
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    pub(crate) fn protocol(operation: &'static str, status: StatusCode) -> Self {
        Error::Protocol { operation, status }
    }
}
