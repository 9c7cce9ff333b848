use std::io;

use thiserror::Error;

/// Represents the outer-level, user-facing errors of the swap-interface package.
///
/// Variants:
/// - `InvalidInput`: The call failed because of bad input parameters.
/// - `FatalError`: There is a problem with the application setup (missing configuration,
///   unreadable storage).
/// - `RecoverableError`: A remote call failed. Retrying at a later time may succeed, for example
///   after a network problem.
/// - `Rejected`: The user or the wallet declined the request.
/// - `Timeout`: Waiting for an out-of-band confirmation took longer than allowed.
/// - `Cancelled`: Waiting for an out-of-band confirmation was cancelled by the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterfaceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Fatal error: {0}")]
    FatalError(String),
    #[error("Recoverable error: {0}")]
    RecoverableError(String),
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("Timed out: {0}")]
    Timeout(String),
    #[error("Cancelled: {0}")]
    Cancelled(String),
}

impl From<io::Error> for InterfaceError {
    fn from(err: io::Error) -> Self {
        InterfaceError::FatalError(err.to_string())
    }
}

impl From<serde_json::Error> for InterfaceError {
    fn from(err: serde_json::Error) -> Self {
        InterfaceError::FatalError(err.to_string())
    }
}

impl From<reqwest::Error> for InterfaceError {
    fn from(err: reqwest::Error) -> Self {
        InterfaceError::RecoverableError(err.to_string())
    }
}
