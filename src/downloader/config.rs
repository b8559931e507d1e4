//! Configuration structures and defaults for the downloader.
//!
//! # Examples
//!
//! ## Using Callbacks
//!
//! ```rust
//! use treefetch::downloader::{Outcome, TransferCallback};
//!
//! let callback: TransferCallback = Box::new(|outcome: &Outcome| match outcome {
//!     Outcome::Succeeded { path, bytes, .. } => println!("✓ {} ({} bytes)", path.display(), bytes),
//!     Outcome::Failed(failure) => println!("✗ {}", failure),
//! });
//! ```

use super::summary::Outcome;
use crate::http::Transport;
use crate::progress::{ProgressReporter, ProgressSink};
use crate::StyleOptions;

use reqwest::header::HeaderMap;
use std::env::current_dir;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Callback type for transfer completion events.
pub type TransferCallback = Box<dyn Fn(&Outcome) + Send + Sync>;

/// Configuration structure for the downloader.
#[derive(Clone)]
pub struct DownloaderConfig {
    /// Base directory the URL paths are mirrored into.
    pub directory: PathBuf,
    /// Maximum number of transfers in flight.
    pub concurrent_downloads: usize,
    /// Replace non-directories that sit where a directory is needed.
    pub clear: bool,
    /// Downloader style options.
    pub style_options: StyleOptions,
    /// Custom HTTP headers.
    pub headers: Option<HeaderMap>,
    /// Optional proxy configuration.
    pub proxy: Option<reqwest::Proxy>,
    /// Minimum delay between two forwarded progress updates of a transfer.
    pub progress_window: Duration,
    /// Receives progress instead of the terminal display.
    pub progress_sink: Option<Arc<dyn ProgressSink>>,
    /// Opens connections instead of the built-in HTTP transport.
    pub transport: Option<Arc<dyn Transport>>,
    /// Callback for when each transfer ends.
    pub on_complete: Option<Arc<TransferCallback>>,
}

impl std::fmt::Debug for DownloaderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloaderConfig")
            .field("directory", &self.directory)
            .field("concurrent_downloads", &self.concurrent_downloads)
            .field("clear", &self.clear)
            .field("style_options", &self.style_options)
            .field("headers", &self.headers)
            .field("proxy", &self.proxy)
            .field("progress_window", &self.progress_window)
            .field("progress_sink", &self.progress_sink.is_some())
            .field("transport", &self.transport.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            directory: current_dir().unwrap_or_default(),
            concurrent_downloads: 1,
            clear: false,
            style_options: StyleOptions::default(),
            headers: None,
            proxy: None,
            progress_window: ProgressReporter::DEFAULT_WINDOW,
            progress_sink: None,
            transport: None,
            on_complete: None,
        }
    }
}
