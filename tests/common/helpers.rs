#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tempfile::TempDir;
use treefetch::http::{BodyStream, Connection, Scheme, Transport};
use treefetch::progress::{Phase, ProgressBarOpts, ProgressEvent, ProgressSink, StyleOptions};
use treefetch::{DownloaderBuilder, TransferError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Common test constants
pub const TEST_HOST: &str = "http://mirror.test";
pub const TEST_USER_AGENT: &str = "treefetch-test-agent";

/// Creates a temporary directory for testing purposes
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Creates a temporary file with the given content
pub fn create_temp_file(dir: &Path, filename: &str, content: &[u8]) -> PathBuf {
    let file_path = dir.join(filename);
    fs::write(&file_path, content).expect("Failed to write temporary file");
    file_path
}

/// Creates a URL on the scripted test host
pub fn create_test_url(path: &str) -> String {
    format!("{}/{}", TEST_HOST, path.trim_start_matches('/'))
}

/// Creates test file content of specified size
pub fn create_test_content(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

/// Asserts that a file exists at the given path
pub fn assert_file_exists(path: &Path) {
    assert!(path.exists(), "File should exist at path: {:?}", path);
}

/// Asserts that nothing exists at the given path
pub fn assert_file_missing(path: &Path) {
    assert!(!path.exists(), "Nothing should exist at path: {:?}", path);
}

/// Asserts that a file has the expected size
pub fn assert_file_size(path: &Path, expected_size: u64) {
    let metadata = fs::metadata(path).expect("Failed to get file metadata");
    assert_eq!(
        metadata.len(),
        expected_size,
        "File size mismatch at path: {:?}",
        path
    );
}

/// Creates test headers with common user agent
pub fn create_test_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(TEST_USER_AGENT));
    headers
}

/// Style options with every bar hidden
pub fn create_disabled_style_options() -> StyleOptions {
    StyleOptions::new(ProgressBarOpts::hidden(), ProgressBarOpts::hidden())
}

/// A downloader builder writing into `dir` without drawing anything
pub fn create_test_downloader_builder(dir: &Path) -> DownloaderBuilder {
    DownloaderBuilder::hidden().directory(dir.to_path_buf())
}

// === Mock server helpers ===

/// Mounts `GET path_str` answering with `status` and `body`
pub async fn mount_file(server: &MockServer, path_str: &str, status: u16, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(path_str))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

/// Starts a mock server with a single file endpoint
pub async fn setup_mock_file(path_str: &str, content: &[u8]) -> MockServer {
    let server = MockServer::start().await;
    mount_file(&server, path_str, 200, content).await;
    server
}

// === Scripted transport ===

/// How the scripted transport answers a URL.
#[derive(Debug, Clone)]
pub struct Script {
    pub status: u16,
    pub chunks: Vec<Bytes>,
    pub content_length: Option<u64>,
    /// Delay before the response head and before each chunk.
    pub delay: Duration,
}

impl Script {
    pub fn ok(content: &[u8]) -> Self {
        Self {
            status: 200,
            chunks: content
                .chunks(16)
                .map(|c| Bytes::copy_from_slice(c))
                .collect(),
            content_length: Some(content.len() as u64),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            ..Self::ok(b"error page")
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Decrements the in-flight counter when the body is dropped.
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory [`Transport`] answering from per-URL scripts.
///
/// A connection counts as in flight from `open` until its body is dropped.
#[derive(Debug)]
pub struct MockTransport {
    scripts: HashMap<String, Script>,
    fallback: Script,
    in_flight: Arc<AtomicUsize>,
    peak: AtomicUsize,
    opened: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new(fallback: Script) -> Self {
        Self {
            scripts: HashMap::new(),
            fallback,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: AtomicUsize::new(0),
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, url: &str, script: Script) -> Self {
        self.scripts.insert(url.to_string(), script);
        self
    }

    /// Highest number of simultaneously open connections.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// URLs in the order they were opened.
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&self, _scheme: Scheme, url: &str) -> Result<Connection, TransferError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.opened.lock().unwrap().push(url.to_string());
        let guard = InFlight(self.in_flight.clone());

        let script = self.scripts.get(url).unwrap_or(&self.fallback).clone();
        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }

        let delay = script.delay;
        let body: BodyStream = stream::iter(script.chunks)
            .then(move |chunk| async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok::<Bytes, TransferError>(chunk)
            })
            .map(move |item| {
                let _held = &guard;
                item
            })
            .boxed();

        Ok(Connection {
            status: script.status,
            content_length: script.content_length,
            body,
        })
    }
}

// === Recording sink ===

/// A progress event without the borrowed path.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    pub id: usize,
    pub path: PathBuf,
    pub bytes: u64,
    pub total: Option<u64>,
    pub phase: Phase,
}

/// [`ProgressSink`] remembering everything it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<RecordedEvent>>,
    fractions: Mutex<Vec<f64>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn fractions(&self) -> Vec<f64> {
        self.fractions.lock().unwrap().clone()
    }

    /// Events of one transfer, in emission order.
    pub fn events_for(&self, id: usize) -> Vec<RecordedEvent> {
        self.events().into_iter().filter(|e| e.id == id).collect()
    }

    /// Number of terminal events per transfer id.
    pub fn terminal_counts(&self) -> HashMap<usize, usize> {
        let mut counts = HashMap::new();
        for event in self.events() {
            if event.phase.is_terminal() {
                *counts.entry(event.id).or_insert(0) += 1;
            }
        }
        counts
    }
}

impl ProgressSink for RecordingSink {
    fn on_transfer(&self, event: &ProgressEvent<'_>) {
        self.events.lock().unwrap().push(RecordedEvent {
            id: event.id,
            path: event.path.to_path_buf(),
            bytes: event.bytes,
            total: event.total,
            phase: event.phase,
        });
    }

    fn on_batch(&self, fraction: f64) {
        self.fractions.lock().unwrap().push(fraction);
    }
}

/// Asserts that `values` never decreases
pub fn assert_monotonic(values: &[f64]) {
    for pair in values.windows(2) {
        assert!(
            pair[0] <= pair[1],
            "values decreased from {} to {}: {:?}",
            pair[0],
            pair[1],
            values
        );
    }
}
