//! Error handling for treefetch.
//!
//! Two layers of errors exist. [`Error`] covers configuration and scheduling
//! problems that abort a whole batch. [`TransferError`] covers everything that
//! can go wrong with a single URL; those never escape the transfer boundary and
//! end up as a [`Failure`](crate::downloader::Failure) in the batch result.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a batch.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from an underlying system.
    ///
    /// Typically a spawned task that could not be joined.
    #[error("Internal error: {0}")]
    Internal(String),

    /// The queue was configured with zero admission slots.
    #[error("Invalid concurrency: {0} (must be at least 1)")]
    InvalidConcurrency(usize),

    /// The queue's slot pool was closed while a task was waiting for a slot.
    #[error("Admission queue closed")]
    QueueClosed,

    /// I/O Error.
    ///
    /// Raised when the base output directory cannot be prepared.
    #[error("I/O error")]
    IOError {
        #[from]
        source: io::Error,
    },

    /// Error from the Reqwest library, raised while building the HTTP client.
    #[error("Reqwest Error")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },
}

/// Result type alias for operations that can fail with a treefetch [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that fail a single transfer.
#[derive(Error, Debug)]
pub enum TransferError {
    /// The URL is neither `http://` nor `https://`.
    #[error("unsupported scheme in {url}")]
    UnsupportedScheme { url: String },

    /// Network-level failure surfaced from the transport, including errors
    /// while reading the body stream.
    #[error("connection error for {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest_middleware::Error,
    },

    /// The server answered outside of `[200, 400)`.
    ///
    /// `body` holds the beginning of the downloaded content for diagnostics.
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        url: String,
        status: u16,
        body: String,
    },

    /// A directory or file could not be created, written or removed.
    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TransferError {
    /// Wrap an I/O error that happened at `path`.
    pub fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn connection(url: impl Into<String>, source: impl Into<reqwest_middleware::Error>) -> Self {
        Self::Connection {
            url: url.into(),
            source: source.into(),
        }
    }

    /// HTTP status code carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
