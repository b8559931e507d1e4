//! Core downloader implementation: the batch driver.
//!
//! [`Downloader::run`] takes a list of URLs, derives a destination for each
//! one below the base directory, and pushes a [`Transfer`] per URL through a
//! bounded [`Queue`]. A failing URL never stops the others; it ends up in the
//! [`BatchResult`] instead.
//!
//! # Examples
//!
//! ```rust,no_run
//! use treefetch::downloader::DownloaderBuilder;
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = DownloaderBuilder::new()
//!     .directory(PathBuf::from("./mirror"))
//!     .concurrent_downloads(10)
//!     .build();
//!
//! let result = downloader
//!     .run(&[
//!         "https://example.com/img/a.png",
//!         "https://example.com/img/b.png?v=2",
//!     ])
//!     .await?;
//! for failure in result.failures() {
//!     eprintln!("{}", failure);
//! }
//! # Ok(())
//! # }
//! ```

use super::config::{DownloaderConfig, TransferCallback};
use super::summary::{BatchResult, Failure, Outcome};
use crate::error::{Result, TransferError};
use crate::http::{HttpClientConfig, HttpTransport, Scheme, Transport};
use crate::progress::{NoProgress, ProgressDisplay, ProgressReporter, ProgressSink};
use crate::queue::Queue;
use crate::transfer::{ensure_dirs, strip_query, Transfer, UrlPath};

use futures::FutureExt;
use reqwest::header::HeaderMap;
use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::fmt::Debug;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::{fs, sync::mpsc};
use tracing::{debug, info, warn};

/// Represents the batch controller.
///
/// A downloader can be created via its builder:
///
/// ```rust
/// use treefetch::downloader::DownloaderBuilder;
///
/// let d = DownloaderBuilder::new().build();
/// ```
#[derive(Clone)]
pub struct Downloader {
    config: DownloaderConfig,
}

impl Debug for Downloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Downloader")
            .field("config", &self.config)
            .finish()
    }
}

impl Downloader {
    /// Creates a new Downloader with the given configuration.
    pub(crate) fn new(config: DownloaderConfig) -> Self {
        Self { config }
    }

    /// Gets the base directory.
    pub fn directory(&self) -> &PathBuf {
        &self.config.directory
    }

    /// Gets the maximum number of transfers in flight.
    pub fn concurrent_downloads(&self) -> usize {
        self.config.concurrent_downloads
    }

    /// Gets whether files in the way of directories are replaced.
    pub fn clear(&self) -> bool {
        self.config.clear
    }

    /// Gets the custom headers.
    pub fn headers(&self) -> Option<&HeaderMap> {
        self.config.headers.as_ref()
    }

    /// Mirror every URL of `urls` below the base directory.
    ///
    /// URLs mapping onto the same file are fetched once, the first one wins.
    /// The call returns after every transfer
    /// reached a terminal state. Only problems that prevent the batch from
    /// running at all (an unusable base directory, zero concurrency, a broken
    /// HTTP client setup) are returned as errors.
    pub async fn run<S: AsRef<str>>(&self, urls: &[S]) -> Result<BatchResult> {
        let urls = unique(urls);
        let mut result = BatchResult::new(urls.len());
        if urls.is_empty() {
            debug!("Nothing to download");
            return Ok(result);
        }

        let mut queue = Queue::new(self.config.concurrent_downloads)?;

        fs::create_dir_all(&self.config.directory).await?;
        let base = fs::canonicalize(&self.config.directory).await?;
        info!("Mirroring {} URLs into {:?}", urls.len(), &base);

        let transport = self.transport()?;

        // Prepare the progress display.
        let display = match self.config.progress_sink {
            Some(_) => None,
            None => Some(Arc::new(ProgressDisplay::new(
                self.config.style_options.clone(),
                urls.len(),
            ))),
        };
        let sink: Arc<dyn ProgressSink> = match (&self.config.progress_sink, &display) {
            (Some(sink), _) => sink.clone(),
            (None, Some(display)) => display.clone(),
            (None, None) => Arc::new(NoProgress),
        };
        let reporter = Arc::new(ProgressReporter::new(
            sink,
            urls.len(),
            self.config.progress_window,
        ));

        let (outcomes, mut collected) = mpsc::unbounded_channel();

        for (id, url) in urls.iter().enumerate() {
            let destination = match self.prepare(&base, url).await {
                Ok(destination) => destination,
                Err(e) => {
                    debug!("Skipping {}: {}", url, e);
                    let outcome = Outcome::Failed(Failure::from_error(url, &e));
                    notify(self.config.on_complete.as_deref(), &outcome);
                    let _ = outcomes.send(outcome);
                    continue;
                }
            };

            let transfer = Transfer::new(id, *url, destination);
            let transport = transport.clone();
            let reporter = reporter.clone();
            let on_complete = self.config.on_complete.clone();
            let outcomes = outcomes.clone();

            queue
                .submit(async move {
                    let outcome = run_transfer(transfer, transport.as_ref(), reporter.as_ref()).await;
                    notify(on_complete.as_deref(), &outcome);
                    let _ = outcomes.send(outcome);
                })
                .await?;
        }
        drop(outcomes);

        let drained = queue.drain().await;

        // Finish the progress display.
        if let Some(display) = &display {
            display.finish();
        }
        drained?;

        while let Some(outcome) = collected.recv().await {
            result.record(outcome);
        }

        info!(
            "Batch done: {} of {} succeeded, {} failed",
            result.succeeded(),
            result.total(),
            result.failed()
        );
        Ok(result)
    }

    /// Resolve the destination of `url` and create its directories.
    async fn prepare(&self, base: &Path, url: &str) -> std::result::Result<PathBuf, TransferError> {
        Scheme::from_url(url)?;
        let path = UrlPath::parse(url)?;
        let dir = ensure_dirs(base, &path.dirs, self.config.clear).await?;
        Ok(dir.join(&path.file))
    }

    fn transport(&self) -> Result<Arc<dyn Transport>> {
        if let Some(ref transport) = self.config.transport {
            return Ok(transport.clone());
        }
        let config = HttpClientConfig {
            proxy: self.config.proxy.clone(),
            headers: self.config.headers.clone(),
            https_only: false,
        };
        Ok(Arc::new(HttpTransport::new(config)?))
    }
}

/// Where a URL ends up, relative to the base directory.
///
/// URLs that will fail before touching the disk are keyed by their text.
#[derive(Debug, PartialEq, Eq, Hash)]
enum StorageKey<'a> {
    Path(PathBuf),
    Url(&'a str),
}

impl<'a> StorageKey<'a> {
    fn of(url: &'a str) -> Self {
        if Scheme::from_url(url).is_err() {
            return StorageKey::Url(url);
        }
        match UrlPath::parse(url) {
            Ok(path) => StorageKey::Path(strip_query(&path.relative())),
            Err(_) => StorageKey::Url(url),
        }
    }
}

/// Drop URLs sharing a storage path with an earlier one. First occurrence wins.
fn unique<S: AsRef<str>>(urls: &[S]) -> Vec<&str> {
    let mut seen = HashSet::new();
    urls.iter()
        .map(AsRef::as_ref)
        .filter(|url| {
            let fresh = seen.insert(StorageKey::of(*url));
            if !fresh {
                debug!("Skipping {}: same destination as an earlier URL", url);
            }
            fresh
        })
        .collect()
}

/// Hand `outcome` to the completion callback, if any. A panicking callback is
/// logged and otherwise ignored.
fn notify(callback: Option<&TransferCallback>, outcome: &Outcome) {
    let Some(callback) = callback else {
        return;
    };
    if let Err(panic) = std::panic::catch_unwind(AssertUnwindSafe(|| callback(outcome))) {
        warn!(
            "Completion callback panicked on {}: {}",
            outcome.url(),
            panic_message(panic.as_ref())
        );
    }
}

async fn run_transfer(
    mut transfer: Transfer,
    transport: &dyn Transport,
    sink: &dyn ProgressSink,
) -> Outcome {
    let run = AssertUnwindSafe(transfer.run(transport, sink))
        .catch_unwind()
        .await;

    match run {
        Ok(Ok(bytes)) => Outcome::Succeeded {
            url: transfer.url().to_string(),
            path: transfer.storage_path().to_path_buf(),
            bytes,
        },
        Ok(Err(e)) => {
            if let TransferError::HttpStatus { ref body, .. } = e {
                debug!("Response body of {}: {}", transfer.url(), body);
            }
            Outcome::Failed(Failure::from_error(transfer.url(), &e))
        }
        Err(panic) => {
            let reason = panic_message(panic.as_ref());
            warn!("Transfer of {} panicked: {}", transfer.url(), reason);
            Outcome::Failed(Failure::new(transfer.url(), format!("panicked: {reason}")))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
