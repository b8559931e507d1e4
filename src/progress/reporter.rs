//! Throttling and aggregation of progress events.

use super::event::{Phase, ProgressEvent, ProgressSink};

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct ReporterState {
    /// Last forwarded `Streaming` event per transfer id.
    last_emit: HashMap<usize, Instant>,
    /// Transfers that reached `Succeeded`.
    succeeded: usize,
}

/// Sits between the transfers and the real [`ProgressSink`].
///
/// `Streaming` events are forwarded at most once per `window` for each
/// transfer. `Started`, `Succeeded` and `Failed` are always forwarded, so the
/// final event of every transfer reaches the sink. Each success bumps the
/// aggregate fraction `succeeded / total`, which is forwarded through
/// [`ProgressSink::on_batch`] while the state lock is held: the values a sink
/// observes never decrease.
pub struct ProgressReporter {
    sink: Arc<dyn ProgressSink>,
    total: usize,
    window: Duration,
    state: Mutex<ReporterState>,
}

impl fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("total", &self.total)
            .field("window", &self.window)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl ProgressReporter {
    /// Default throttle window.
    pub const DEFAULT_WINDOW: Duration = Duration::from_millis(100);

    /// Create a reporter for a batch of `total` transfers.
    pub fn new(sink: Arc<dyn ProgressSink>, total: usize, window: Duration) -> Self {
        Self {
            sink,
            total,
            window,
            state: Mutex::new(ReporterState::default()),
        }
    }

    /// Current aggregate fraction.
    pub fn fraction(&self) -> f64 {
        let state = self.lock();
        Self::fraction_of(state.succeeded, self.total)
    }

    fn fraction_of(succeeded: usize, total: usize) -> f64 {
        if total == 0 {
            return 1.0;
        }
        (succeeded as f64 / total as f64).min(1.0)
    }

    fn lock(&self) -> MutexGuard<'_, ReporterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ProgressSink for ProgressReporter {
    fn on_transfer(&self, event: &ProgressEvent<'_>) {
        let mut state = self.lock();
        match event.phase {
            Phase::Streaming => {
                let now = Instant::now();
                if let Some(last) = state.last_emit.get(&event.id) {
                    if now.duration_since(*last) < self.window {
                        return;
                    }
                }
                state.last_emit.insert(event.id, now);
                drop(state);
                self.sink.on_transfer(event);
            }
            Phase::Started | Phase::Failed => {
                state.last_emit.remove(&event.id);
                drop(state);
                self.sink.on_transfer(event);
            }
            Phase::Succeeded => {
                state.last_emit.remove(&event.id);
                state.succeeded += 1;
                let fraction = Self::fraction_of(state.succeeded, self.total);
                self.sink.on_transfer(event);
                self.sink.on_batch(fraction);
            }
        }
    }
}
