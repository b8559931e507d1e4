//! What a batch run reports back.

use crate::error::TransferError;

use std::fmt;
use std::path::PathBuf;

/// A URL that could not be mirrored, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    url: String,
    reason: String,
}

impl Failure {
    pub fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn from_error(url: &str, error: &TransferError) -> Self {
        Self::new(url, error.to_string())
    }

    /// The URL as it was submitted.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Human readable cause.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.url, self.reason)
    }
}

/// Terminal result of one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded {
        url: String,
        /// Where the content was stored.
        path: PathBuf,
        bytes: u64,
    },
    Failed(Failure),
}

impl Outcome {
    pub fn url(&self) -> &str {
        match self {
            Outcome::Succeeded { url, .. } => url,
            Outcome::Failed(failure) => failure.url(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded { .. })
    }
}

/// Summary of a whole batch.
///
/// `failures` are listed in the order the transfers ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    total: usize,
    succeeded: usize,
    bytes: u64,
    failures: Vec<Failure>,
}

impl BatchResult {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub(crate) fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Succeeded { bytes, .. } => {
                self.succeeded += 1;
                self.bytes += bytes;
            }
            Outcome::Failed(failure) => self.failures.push(failure),
        }
    }

    /// Number of distinct URLs in the batch.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Bytes written by successful transfers.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    /// URLs of the failed transfers, in completion order.
    pub fn failed_urls(&self) -> Vec<&str> {
        self.failures.iter().map(Failure::url).collect()
    }

    /// `true` when nothing failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}
