//! Error types for device operations.

use std::io;
use std::path::PathBuf;

use ulti_proto::EncodeError;

/// Alias for `Result<T, ulti::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`Dispatcher::run`](crate::Dispatcher::run).
///
/// Every variant is terminal for the operation; nothing is retried.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The request was rejected before any network I/O.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The local file could not be opened or mapped.
    #[error(transparent)]
    File(#[from] FileError),

    /// Resolving, connecting to, or writing to the device failed.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// A request that can never succeed.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// No target host was given.
    #[error("a device host is required")]
    MissingHost,

    /// No action was selected.
    #[error("no action selected")]
    NoAction,

    /// More than one action was selected.
    #[error("can't combine {0} in one invocation")]
    ConflictingActions(String),

    /// The file does not fit the action's size rules.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Failure to acquire a local file.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FileError {
    /// The file does not exist.
    #[error("{} not found", .path.display())]
    NotFound {
        /// Requested path.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The file exists but can't be opened for reading.
    #[error("can't read {}", .path.display())]
    NotReadable {
        /// Requested path.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The file's size could not be determined.
    #[error("can't stat {}", .path.display())]
    StatFailed {
        /// Requested path.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The file could not be mapped into memory.
    #[error("can't map {}", .path.display())]
    MapFailed {
        /// Requested path.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
}

/// Failure talking to the device.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConnectionError {
    /// The host name did not resolve to any address.
    #[error("can't resolve {host}")]
    ResolutionFailed {
        /// Host as given by the operator.
        host: String,
        /// Resolver error.
        #[source]
        source: io::Error,
    },

    /// Every resolved address refused the connection.
    #[error("couldn't connect to {host}")]
    ConnectFailed {
        /// Host as given by the operator.
        host: String,
        /// Error from the last address tried.
        #[source]
        source: io::Error,
    },

    /// Writing to an established connection failed.
    #[error("send failed")]
    SendFailed(#[source] io::Error),
}
