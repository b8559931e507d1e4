//! Progress events and the sink they are delivered to.

use std::path::Path;

/// Where a transfer is in its life, as seen by progress consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// The transfer acquired its slot and is connecting.
    Started,
    /// A chunk was written.
    Streaming,
    /// The file is complete on disk.
    Succeeded,
    /// The transfer failed; nothing is left on disk.
    Failed,
}

impl Phase {
    /// `true` for [`Phase::Succeeded`] and [`Phase::Failed`].
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Succeeded | Phase::Failed)
    }
}

/// One notification about one transfer. Never retained by the library.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEvent<'a> {
    /// Submission index of the transfer within its batch.
    pub id: usize,
    /// Storage path of the transfer.
    pub path: &'a Path,
    /// Bytes received so far.
    pub bytes: u64,
    /// Expected size, when the server declared one.
    pub total: Option<u64>,
    /// Phase the event belongs to.
    pub phase: Phase,
}

impl ProgressEvent<'_> {
    /// Fraction of the transfer received, in `[0, 1]`.
    ///
    /// `None` when the total is unknown; consumers fall back to the byte count.
    ///
    /// ```rust
    /// use std::path::Path;
    /// use treefetch::progress::{Phase, ProgressEvent};
    ///
    /// let event = ProgressEvent {
    ///     id: 0,
    ///     path: Path::new("a.png"),
    ///     bytes: 50,
    ///     total: Some(200),
    ///     phase: Phase::Streaming,
    /// };
    /// assert_eq!(event.fraction(), Some(0.25));
    /// ```
    pub fn fraction(&self) -> Option<f64> {
        match self.total {
            Some(total) if total > 0 => Some((self.bytes as f64 / total as f64).clamp(0.0, 1.0)),
            _ => None,
        }
    }
}

/// Consumer of progress events.
///
/// Implementations are called from every in-flight transfer concurrently and
/// must not block for long.
pub trait ProgressSink: Send + Sync {
    /// Called for per-transfer events.
    fn on_transfer(&self, event: &ProgressEvent<'_>);

    /// Called with the fraction of the batch that completed successfully.
    fn on_batch(&self, _fraction: f64) {}
}

/// A sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_transfer(&self, _event: &ProgressEvent<'_>) {}
}
