//! A single URL to file transfer.
//!
//! A [`Transfer`] walks through `Pending -> Connecting -> Streaming ->
//! Finalizing -> Succeeded`, or drops into `Failed` from any non-terminal
//! state. Whatever happens, the file handle is closed before
//! [`Transfer::run`] returns and a failed transfer leaves nothing on disk.
//!
//! # Examples
//!
//! ```rust,no_run
//! use treefetch::http::{HttpClientConfig, HttpTransport};
//! use treefetch::progress::NoProgress;
//! use treefetch::transfer::Transfer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new(HttpClientConfig::default())?;
//! let mut transfer = Transfer::new(0, "https://example.com/a/b.png", "/tmp/out/a/b.png");
//! let bytes = transfer.run(&transport, &NoProgress).await?;
//! println!("wrote {} bytes to {}", bytes, transfer.storage_path().display());
//! # Ok(())
//! # }
//! ```

pub mod path;

pub use path::{ensure_dirs, strip_query, UrlPath};

use crate::error::TransferError;
use crate::http::{Scheme, Transport};
use crate::progress::{Phase, ProgressEvent, ProgressSink};

use futures::StreamExt;
use std::io;
use std::path::{Path, PathBuf};
use tokio::{fs, fs::File, io::AsyncWriteExt};
use tracing::{debug, warn};

/// Upper bound of the body kept for an [`TransferError::HttpStatus`].
pub const DIAGNOSTIC_BODY_LIMIT: usize = 64 * 1024;

/// Lifecycle of a [`Transfer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferState {
    Pending,
    Connecting,
    Streaming,
    Finalizing,
    Succeeded,
    Failed,
}

impl TransferState {
    /// `Succeeded` or `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::Succeeded | TransferState::Failed)
    }

    /// States that hold an admission slot's worth of resources.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            TransferState::Connecting | TransferState::Streaming | TransferState::Finalizing
        )
    }
}

/// One URL to file download.
#[derive(Debug, Clone)]
pub struct Transfer {
    id: usize,
    url: String,
    destination: PathBuf,
    /// `destination` without its `?query` suffix; the only path written to.
    storage: PathBuf,
    state: TransferState,
    received: u64,
    total: Option<u64>,
}

impl Transfer {
    /// Create a pending transfer. `id` is the submission index in the batch.
    pub fn new(id: usize, url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        let destination = destination.into();
        let storage = strip_query(&destination);
        Self {
            id,
            url: url.into(),
            destination,
            storage,
            state: TransferState::Pending,
            received: 0,
            total: None,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Destination as derived from the URL, query included.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Where the file is actually written.
    pub fn storage_path(&self) -> &Path {
        &self.storage
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    /// Bytes received so far.
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Size announced by the server, if any.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Download the URL into [`Transfer::storage_path`].
    ///
    /// Emits `Started`, then one `Streaming` event per chunk, then exactly one
    /// of `Succeeded` or `Failed`. Returns the number of bytes written.
    ///
    /// # Panics
    ///
    /// Panics if the transfer already ran.
    pub async fn run(
        &mut self,
        transport: &dyn Transport,
        sink: &dyn ProgressSink,
    ) -> Result<u64, TransferError> {
        assert_eq!(
            self.state,
            TransferState::Pending,
            "transfer {} already ran",
            self.id
        );

        self.state = TransferState::Connecting;
        sink.on_transfer(&self.event(Phase::Started));

        let result = self.execute(transport, sink).await;
        match &result {
            Ok(bytes) => {
                debug!("Stored {} bytes at {:?}", bytes, &self.storage);
                self.state = TransferState::Succeeded;
                sink.on_transfer(&self.event(Phase::Succeeded));
            }
            Err(e) => {
                debug!("Transfer of {} failed: {}", &self.url, e);
                self.state = TransferState::Failed;
                sink.on_transfer(&self.event(Phase::Failed));
            }
        }
        result
    }

    async fn execute(
        &mut self,
        transport: &dyn Transport,
        sink: &dyn ProgressSink,
    ) -> Result<u64, TransferError> {
        let scheme = Scheme::from_url(&self.url)?;

        remove_stale(&self.storage).await?;

        debug!("Creating destination file {:?}", &self.storage);
        let mut file = File::create(&self.storage)
            .await
            .map_err(|e| TransferError::filesystem(&self.storage, e))?;

        let streamed = self.stream(&mut file, scheme, transport, sink).await;
        let flushed = file.flush().await;
        drop(file);

        let outcome = match (streamed, flushed) {
            (Ok(bytes), Ok(())) => Ok(bytes),
            (Ok(_), Err(e)) => Err(TransferError::filesystem(&self.storage, e)),
            (Err(e), _) => Err(e),
        };

        if outcome.is_err() {
            if let Err(e) = fs::remove_file(&self.storage).await {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!("Could not remove partial file {:?}: {}", &self.storage, e);
                }
            }
        }

        outcome
    }

    async fn stream(
        &mut self,
        file: &mut File,
        scheme: Scheme,
        transport: &dyn Transport,
        sink: &dyn ProgressSink,
    ) -> Result<u64, TransferError> {
        let connection = transport.open(scheme, &self.url).await?;
        self.state = TransferState::Streaming;
        self.total = connection.content_length;

        let success = connection.is_success();
        let status = connection.status;
        let mut diagnostic = Vec::new();

        let mut body = connection.body;
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|e| TransferError::filesystem(&self.storage, e))?;

            if !success && diagnostic.len() < DIAGNOSTIC_BODY_LIMIT {
                let take = (DIAGNOSTIC_BODY_LIMIT - diagnostic.len()).min(chunk.len());
                diagnostic.extend_from_slice(&chunk[..take]);
            }

            self.received += chunk.len() as u64;
            sink.on_transfer(&self.event(Phase::Streaming));
        }

        self.state = TransferState::Finalizing;

        if !success {
            return Err(TransferError::HttpStatus {
                url: self.url.clone(),
                status,
                body: String::from_utf8_lossy(&diagnostic).into_owned(),
            });
        }

        Ok(self.received)
    }

    fn event(&self, phase: Phase) -> ProgressEvent<'_> {
        ProgressEvent {
            id: self.id,
            path: &self.storage,
            bytes: self.received,
            total: self.total,
            phase,
        }
    }
}

async fn remove_stale(path: &Path) -> Result<(), TransferError> {
    match fs::remove_file(path).await {
        Ok(()) => {
            debug!("Removed existing file {:?}", path);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(TransferError::filesystem(path, e)),
    }
}
