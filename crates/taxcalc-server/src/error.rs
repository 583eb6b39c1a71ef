//! Server error types.
//!
//! Every start failure is terminal for the process: the binary maps any
//! [`ServerError`] returned from startup to exit code 1. Request-level
//! failures (missing files, forbidden paths) are HTTP responses, not
//! errors of this type — see [`crate::static_files::StaticFileError`].

use std::path::PathBuf;

use thiserror::Error;

/// Errors that prevent the server from starting or running.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The index document is missing from the root directory.
    ///
    /// This is a configuration error, not a crash: there is nothing to
    /// serve at `/`, so the server refuses to start.
    #[error("index document not found: {path}")]
    MissingIndex {
        /// Path that was checked.
        path: PathBuf,
    },

    /// The configured port is already bound by another process.
    #[error("address {addr} is already in use")]
    AddrInUse {
        /// Address the bind was attempted on.
        addr: std::net::SocketAddr,
    },

    /// Any other bind failure.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// Address the bind was attempted on.
        addr: std::net::SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The `PORT` environment variable is not a valid port number.
    #[error("invalid PORT value '{value}': {source}")]
    InvalidPort {
        /// The raw environment value.
        value: String,
        /// Parse failure.
        #[source]
        source: std::num::ParseIntError,
    },

    /// I/O error during server operation.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
