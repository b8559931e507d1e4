//! Builder pattern implementation for creating Downloader instances.
//!
//! # Examples
//!
//! ## Basic Builder Usage
//!
//! ```rust
//! use treefetch::downloader::DownloaderBuilder;
//! use std::path::PathBuf;
//!
//! let downloader = DownloaderBuilder::new()
//!     .directory(PathBuf::from("./mirror"))
//!     .concurrent_downloads(8)
//!     .clear(true)
//!     .build();
//! assert_eq!(downloader.concurrent_downloads(), 8);
//! ```
//!
//! ## Hidden Progress Bars
//!
//! ```rust
//! use treefetch::downloader::DownloaderBuilder;
//!
//! let downloader = DownloaderBuilder::hidden().build();
//! ```

use super::{config::DownloaderConfig, downloader::Downloader, summary::Outcome};
use crate::http::Transport;
use crate::progress::ProgressSink;
use crate::{ProgressBarOpts, StyleOptions};

use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use std::{path::PathBuf, sync::Arc, time::Duration};

/// A builder used to create a [`Downloader`].
///
/// ```rust
/// use treefetch::downloader::DownloaderBuilder;
///
/// let d = DownloaderBuilder::new().concurrent_downloads(4).directory("mirror".into()).build();
/// ```
#[derive(Default)]
pub struct DownloaderBuilder {
    config: DownloaderConfig,
}

impl DownloaderBuilder {
    /// Creates a builder with the default options.
    pub fn new() -> Self {
        DownloaderBuilder::default()
    }

    /// Convenience function to hide the progress bars.
    pub fn hidden() -> Self {
        let mut builder = DownloaderBuilder::default();
        builder.config.style_options =
            StyleOptions::new(ProgressBarOpts::hidden(), ProgressBarOpts::hidden());
        builder
    }

    /// Sets the base directory the URL paths are mirrored into.
    pub fn directory(mut self, directory: PathBuf) -> Self {
        self.config.directory = directory;
        self
    }

    /// Set the maximum number of transfers in flight.
    ///
    /// Zero is rejected when the batch starts.
    pub fn concurrent_downloads(mut self, concurrent_downloads: usize) -> Self {
        self.config.concurrent_downloads = concurrent_downloads;
        self
    }

    /// Replace files that are in the way of a directory.
    pub fn clear(mut self, clear: bool) -> Self {
        self.config.clear = clear;
        self
    }

    /// Set the downloader style options.
    pub fn style_options(mut self, style_options: StyleOptions) -> Self {
        self.config.style_options = style_options;
        self
    }

    /// Route every request through `proxy`.
    pub fn proxy(mut self, proxy: reqwest::Proxy) -> Self {
        self.config.proxy = Some(proxy);
        self
    }

    /// Minimum delay between two progress updates of the same transfer.
    pub fn progress_window(mut self, window: Duration) -> Self {
        self.config.progress_window = window;
        self
    }

    /// Send progress to `sink` instead of drawing progress bars.
    pub fn progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.config.progress_sink = Some(sink);
        self
    }

    /// Open connections with `transport` instead of the built-in HTTP client.
    ///
    /// Headers and proxy settings only apply to the built-in client.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.config.transport = Some(transport);
        self
    }

    /// Set callback for when each transfer ends.
    ///
    /// The callback runs as soon as a transfer finishes, while others may still
    /// be in flight.
    ///
    /// ```rust
    /// use treefetch::downloader::{DownloaderBuilder, Outcome};
    ///
    /// let downloader = DownloaderBuilder::new()
    ///     .on_complete(|outcome| match outcome {
    ///         Outcome::Succeeded { url, .. } => println!("[Success] {}", url),
    ///         Outcome::Failed(failure) => println!("[Failed] {}", failure),
    ///     })
    ///     .build();
    /// ```
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Outcome) + Send + Sync + 'static,
    {
        self.config.on_complete = Some(Arc::new(Box::new(callback)));
        self
    }

    fn new_header(&self) -> HeaderMap {
        match self.config.headers {
            Some(ref h) => h.to_owned(),
            _ => HeaderMap::new(),
        }
    }

    /// Add the http headers.
    ///
    /// Successive calls are merged into a single map.
    ///
    /// ```
    /// use reqwest::header::{self, HeaderValue, HeaderMap};
    /// use treefetch::downloader::DownloaderBuilder;
    ///
    /// let ua = HeaderValue::from_static("treefetch/0.1");
    ///
    /// let builder = DownloaderBuilder::new()
    ///     .headers(HeaderMap::from_iter([(header::USER_AGENT, ua)]))
    ///     .build();
    /// ```
    ///
    /// See also [`header()`].
    ///
    /// [`header()`]: DownloaderBuilder::header
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        let mut new = self.new_header();
        new.extend(headers);

        self.config.headers = Some(new);
        self
    }

    /// Add the http header
    ///
    /// ```
    /// use reqwest::header::{self, HeaderValue};
    /// use treefetch::downloader::DownloaderBuilder;
    ///
    /// let builder = DownloaderBuilder::new()
    ///     .header(header::USER_AGENT, HeaderValue::from_static("treefetch/0.1"))
    ///     .header(header::REFERER, HeaderValue::from_static("https://example.com/"))
    ///     .build();
    /// assert_eq!(builder.headers().map(|h| h.len()), Some(2));
    /// ```
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        let mut new = self.new_header();

        new.insert(name, value);

        self.config.headers = Some(new);
        self
    }

    /// Create the [`Downloader`] with the specified options.
    pub fn build(self) -> Downloader {
        Downloader::new(self.config)
    }
}
