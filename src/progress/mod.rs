//! Progress reporting.
//!
//! Transfers emit [`ProgressEvent`]s into a [`ProgressSink`]. The
//! [`ProgressReporter`] sits in front of the real sink: it throttles the
//! per-chunk chatter and turns successful completions into the aggregate
//! batch fraction. [`ProgressDisplay`] is the `indicatif` sink the CLI uses.
//!
//! - `event` - events, phases and the sink trait
//! - `reporter` - throttling and aggregation
//! - `display` - terminal rendering
//! - `style` - progress bar styling options
//!
//! # Examples
//!
//! ## Recording events
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use std::time::Duration;
//! use treefetch::progress::{ProgressEvent, ProgressReporter, ProgressSink};
//!
//! #[derive(Default)]
//! struct Fractions(Mutex<Vec<f64>>);
//!
//! impl ProgressSink for Fractions {
//!     fn on_transfer(&self, _event: &ProgressEvent<'_>) {}
//!     fn on_batch(&self, fraction: f64) {
//!         self.0.lock().unwrap().push(fraction);
//!     }
//! }
//!
//! let fractions = Arc::new(Fractions::default());
//! let reporter = ProgressReporter::new(fractions.clone(), 4, Duration::from_millis(100));
//! assert_eq!(reporter.fraction(), 0.0);
//! ```
//!
//! ## Hidden progress bars
//!
//! ```rust
//! use treefetch::progress::{ProgressBarOpts, StyleOptions};
//!
//! let hidden = StyleOptions::new(ProgressBarOpts::hidden(), ProgressBarOpts::hidden());
//! assert!(!hidden.is_enabled());
//! ```

pub(crate) mod display;
pub(crate) mod event;
pub(crate) mod reporter;
pub(crate) mod style;

pub use display::ProgressDisplay;
pub use event::{NoProgress, Phase, ProgressEvent, ProgressSink};
pub use reporter::ProgressReporter;
pub use style::{ProgressBarOpts, StyleOptions};
