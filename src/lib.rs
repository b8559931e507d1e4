//! Treefetch mirrors lists of HTTP(S) URLs into a local directory tree, with
//! a bounded number of transfers in flight.
//!
//! `https://host/a/b/c.png?v=1` is saved as `<base>/a/b/c.png`. A URL that
//! fails never stops the batch: it is reported in the [`BatchResult`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use treefetch::{DownloaderBuilder, Error};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Error> {
//! let downloader = DownloaderBuilder::new()
//!     .directory(PathBuf::from("output"))
//!     .concurrent_downloads(4)
//!     .build();
//! let result = downloader
//!     .run(&["https://example.com/img/logo.png", "https://example.com/css/site.css"])
//!     .await?;
//! println!("failed: {:?}", result.failed_urls());
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`downloader`] - The batch driver, `Downloader` and `DownloaderBuilder`
//! - [`transfer`] - A single URL to file transfer and destination derivation
//! - [`queue`] - Bounded admission of concurrent tasks
//! - [`error`] - Batch-level `Error` and per-transfer `TransferError`
//! - [`http`] - HTTP client setup and the `Transport` seam
//! - [`progress`] - Progress events, throttling and terminal display
//! - [`sniff`] - Image type detection from magic bytes

pub mod downloader;
pub mod error;
pub mod http;
pub mod progress;
pub mod queue;
pub mod sniff;
pub mod transfer;

pub use downloader::{BatchResult, Downloader, DownloaderBuilder, Failure, Outcome};
pub use error::{Error, Result, TransferError};
pub use http::{create_http_client, HttpClientConfig, HttpTransport, Scheme, Transport};
pub use progress::{ProgressBarOpts, ProgressSink, StyleOptions};
pub use queue::Queue;
pub use transfer::{Transfer, TransferState};
