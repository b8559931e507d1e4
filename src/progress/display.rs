//! Terminal rendering of progress events with `indicatif`.
//!
//! # Examples
//!
//! ```rust
//! use std::path::Path;
//! use treefetch::progress::{Phase, ProgressDisplay, ProgressEvent, ProgressSink, StyleOptions};
//!
//! let display = ProgressDisplay::new(StyleOptions::default(), 3);
//! display.on_transfer(&ProgressEvent {
//!     id: 0,
//!     path: Path::new("img/a.png"),
//!     bytes: 0,
//!     total: None,
//!     phase: Phase::Started,
//! });
//! display.on_batch(1.0 / 3.0);
//! display.finish();
//! ```

use super::event::{Phase, ProgressEvent, ProgressSink};
use crate::progress::StyleOptions;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Length of the main bar; its position is the batch percentage.
const MAIN_BAR_LEN: u64 = 100;

/// Progress display manager that coordinates the batch bar and one bar per
/// in-flight transfer.
pub struct ProgressDisplay {
    /// The multi-progress instance for coordinating multiple progress bars.
    multi: MultiProgress,
    /// The main progress bar for the batch.
    main: ProgressBar,
    /// Bars of transfers that have started but not finished.
    children: Mutex<HashMap<usize, ProgressBar>>,
    /// Style options for progress bars.
    style_options: StyleOptions,
}

impl std::fmt::Debug for ProgressDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressDisplay")
            .field("style_options", &self.style_options)
            .field("active", &self.children().len())
            .finish_non_exhaustive()
    }
}

impl ProgressDisplay {
    /// Create a new progress display manager for `total_transfers` transfers.
    ///
    /// The main bar is only drawn when the batch holds more than one transfer.
    pub fn new(style_options: StyleOptions, total_transfers: usize) -> Self {
        let multi = match style_options.is_enabled() {
            true => MultiProgress::new(),
            false => MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
        };

        let main = if total_transfers > 1 {
            let main = multi.add(style_options.main().clone().to_progress_bar(MAIN_BAR_LEN));
            main.tick();
            main
        } else {
            ProgressBar::hidden()
        };

        Self {
            multi,
            main,
            children: Mutex::new(HashMap::new()),
            style_options,
        }
    }

    /// Get the main progress bar.
    pub fn main(&self) -> &ProgressBar {
        &self.main
    }

    /// Number of transfers currently shown.
    pub fn active(&self) -> usize {
        self.children().len()
    }

    /// Finish the display, clearing or keeping the main bar based on configuration.
    pub fn finish(&self) {
        for (_, pb) in self.children().drain() {
            pb.finish_and_clear();
        }
        if self.style_options.main().clear {
            self.main.finish_and_clear();
        } else {
            self.main.finish();
        }
    }

    fn children(&self) -> MutexGuard<'_, HashMap<usize, ProgressBar>> {
        self.children.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish_child(&self, pb: ProgressBar) {
        if self.style_options.child().clear {
            pb.finish_and_clear();
        } else {
            pb.finish();
        }
    }
}

impl ProgressSink for ProgressDisplay {
    fn on_transfer(&self, event: &ProgressEvent<'_>) {
        match event.phase {
            Phase::Started => {
                let pb = self.multi.add(
                    self.style_options
                        .child()
                        .clone()
                        .to_progress_bar(event.total.unwrap_or(0)),
                );
                pb.set_message(event.path.display().to_string());
                self.children().insert(event.id, pb);
            }
            Phase::Streaming => {
                if let Some(pb) = self.children().get(&event.id) {
                    match event.total {
                        Some(total) => pb.set_length(total.max(event.bytes)),
                        None => pb.set_length(event.bytes),
                    }
                    pb.set_position(event.bytes);
                }
            }
            Phase::Succeeded => {
                let pb = self.children().remove(&event.id);
                if let Some(pb) = pb {
                    pb.set_position(event.bytes);
                    self.finish_child(pb);
                }
            }
            Phase::Failed => {
                let pb = self.children().remove(&event.id);
                if let Some(pb) = pb {
                    pb.abandon_with_message(format!("failed: {}", event.path.display()));
                    if self.style_options.child().clear {
                        self.multi.remove(&pb);
                    }
                }
            }
        }
    }

    fn on_batch(&self, fraction: f64) {
        let position = (fraction.clamp(0.0, 1.0) * MAIN_BAR_LEN as f64).round() as u64;
        self.main.set_position(position.max(self.main.position()));
    }
}
