//! Bounded admission of asynchronous tasks.
//!
//! [`Queue::submit`] starts a task right away if fewer than `max` tasks are in
//! flight, and otherwise waits until one of them finishes. Slots are
//! semaphore permits owned by the running task, so a slot is released however
//! the task ends.
//!
//! ```rust
//! use treefetch::queue::Queue;
//!
//! # async fn example() -> treefetch::Result<()> {
//! let mut queue = Queue::new(4)?;
//! for i in 0..16 {
//!     queue.submit(async move { println!("task {i}") }).await?;
//! }
//! queue.drain().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, warn};

/// Runs at most `max` tasks at the same time.
///
/// Tasks that were not drained are aborted when the queue is dropped.
#[derive(Debug)]
pub struct Queue {
    slots: Arc<Semaphore>,
    max: usize,
    outstanding: JoinSet<()>,
}

impl Queue {
    /// Create a queue with `max` admission slots.
    ///
    /// Fails with [`Error::InvalidConcurrency`] when `max` is zero.
    pub fn new(max: usize) -> Result<Self> {
        if max == 0 {
            return Err(Error::InvalidConcurrency(max));
        }
        Ok(Self {
            slots: Arc::new(Semaphore::new(max)),
            max,
            outstanding: JoinSet::new(),
        })
    }

    /// Maximum number of tasks in flight.
    pub fn max(&self) -> usize {
        self.max
    }

    /// Number of tasks currently holding a slot.
    pub fn in_flight(&self) -> usize {
        self.max - self.slots.available_permits()
    }

    /// Start `task` as soon as a slot is free.
    ///
    /// Returns once the task has been spawned, not once it has finished.
    pub async fn submit<F>(&mut self, task: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.reap();

        let permit = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Error::QueueClosed)?;

        self.outstanding.spawn(async move {
            let _permit = permit;
            task.await;
        });
        Ok(())
    }

    /// Wait for every submitted task to finish.
    ///
    /// All tasks are joined even if one of them panicked; the first panic is
    /// then reported as [`Error::Internal`].
    pub async fn drain(&mut self) -> Result<()> {
        let mut first_error = None;
        while let Some(joined) = self.outstanding.join_next().await {
            if let Err(e) = joined {
                first_error.get_or_insert(Self::join_error(e));
            }
        }
        debug!("Queue drained");
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Drop finished tasks from the join set.
    fn reap(&mut self) {
        while let Some(joined) = self.outstanding.try_join_next() {
            if let Err(e) = joined {
                warn!("Queued task ended abnormally: {}", e);
            }
        }
    }

    fn join_error(e: JoinError) -> Error {
        warn!("Queued task ended abnormally: {}", e);
        Error::Internal(format!("queued task failed: {e}"))
    }
}
