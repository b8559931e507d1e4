//! Tests for the downloader module: builder, configuration and the batch
//! driver's scheduling, driven by the scripted transport.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderValue, USER_AGENT};
use treefetch::downloader::{DownloaderBuilder, DownloaderConfig};
use treefetch::progress::Phase;

mod common;
use common::helpers::*;

#[test]
fn test_downloader_defaults() {
    let downloader = DownloaderBuilder::new().build();

    assert_eq!(downloader.concurrent_downloads(), 1);
    assert!(!downloader.clear());
    assert!(downloader.headers().is_none());
    assert_eq!(
        downloader.directory(),
        &std::env::current_dir().unwrap_or_default()
    );
}

#[test]
fn test_downloader_getters() {
    let temp_dir = create_temp_dir();
    let downloader = DownloaderBuilder::new()
        .directory(temp_dir.path().to_path_buf())
        .concurrent_downloads(10)
        .clear(true)
        .build();

    assert_eq!(downloader.directory(), temp_dir.path());
    assert_eq!(downloader.concurrent_downloads(), 10);
    assert!(downloader.clear());
}

#[test]
fn test_downloader_headers_are_merged() {
    let downloader = DownloaderBuilder::new()
        .headers(create_test_headers())
        .header(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("image/*"),
        )
        .build();

    let headers = downloader.headers().unwrap();
    assert_eq!(headers.len(), 2);
    assert_eq!(headers.get(USER_AGENT).unwrap(), TEST_USER_AGENT);
}

#[test]
fn test_downloader_debug() {
    let downloader = DownloaderBuilder::new().build();
    let debug_str = format!("{:?}", downloader);

    assert!(debug_str.contains("Downloader"));
    assert!(debug_str.contains("concurrent_downloads"));
}

#[test]
fn test_config_default() {
    let config = DownloaderConfig::default();
    assert_eq!(config.concurrent_downloads, 1);
    assert_eq!(config.progress_window, Duration::from_millis(100));
    assert!(config.progress_sink.is_none());
    assert!(config.transport.is_none());
    assert!(config.on_complete.is_none());
}

#[tokio::test]
async fn test_in_flight_transfers_never_exceed_the_bound() {
    let temp_dir = create_temp_dir();
    let transport = Arc::new(MockTransport::new(
        Script::ok(&create_test_content(64)).delayed(Duration::from_millis(10)),
    ));
    let urls: Vec<String> = (0..24)
        .map(|i| create_test_url(&format!("bound/{i}.bin")))
        .collect();

    let result = create_test_downloader_builder(temp_dir.path())
        .concurrent_downloads(4)
        .transport(transport.clone())
        .build()
        .run(&urls)
        .await
        .unwrap();

    assert_eq!(result.succeeded(), 24);
    assert!(transport.peak() <= 4, "peak was {}", transport.peak());
    assert!(transport.peak() > 1, "transfers never overlapped");
    assert_eq!(transport.in_flight(), 0);
    for i in 0..24 {
        assert_file_size(&temp_dir.path().join(format!("bound/{i}.bin")), 64);
    }
}

#[tokio::test]
async fn test_single_slot_runs_in_submission_order() {
    let temp_dir = create_temp_dir();
    let transport = Arc::new(MockTransport::new(
        Script::ok(b"abc").delayed(Duration::from_millis(2)),
    ));
    let urls: Vec<String> = (0..6)
        .map(|i| create_test_url(&format!("seq/{i}.txt")))
        .collect();

    create_test_downloader_builder(temp_dir.path())
        .transport(transport.clone())
        .build()
        .run(&urls)
        .await
        .unwrap();

    assert_eq!(transport.peak(), 1);
    assert_eq!(transport.opened(), urls);
}

#[tokio::test]
async fn test_concurrent_failures_are_all_recorded() {
    let temp_dir = create_temp_dir();
    let urls: Vec<String> = (0..300)
        .map(|i| create_test_url(&format!("stress/{i}.bin")))
        .collect();
    let mut transport = MockTransport::new(
        Script::ok(&create_test_content(32)).delayed(Duration::from_millis(1)),
    );
    for url in urls.iter().step_by(2) {
        transport = transport.with(
            url,
            Script::status(500).delayed(Duration::from_millis(1)),
        );
    }

    let result = create_test_downloader_builder(temp_dir.path())
        .concurrent_downloads(64)
        .transport(Arc::new(transport))
        .build()
        .run(&urls)
        .await
        .unwrap();

    assert_eq!(result.total(), 300);
    assert_eq!(result.succeeded(), 150);
    assert_eq!(result.failed(), 150);

    let failed: HashSet<&str> = result.failed_urls().into_iter().collect();
    let expected: HashSet<&str> = urls.iter().step_by(2).map(String::as_str).collect();
    assert_eq!(failed, expected);

    for (i, url) in urls.iter().enumerate() {
        let stored = temp_dir.path().join(format!("stress/{i}.bin"));
        if failed.contains(url.as_str()) {
            assert_file_missing(&stored);
        } else {
            assert_file_size(&stored, 32);
        }
    }
}

#[tokio::test]
async fn test_batch_fraction_is_monotonic() {
    let temp_dir = create_temp_dir();
    let urls: Vec<String> = (0..20)
        .map(|i| create_test_url(&format!("frac/{i}.bin")))
        .collect();
    let mut transport = MockTransport::new(
        Script::ok(&create_test_content(48)).delayed(Duration::from_millis(1)),
    );
    for url in urls.iter().take(5) {
        transport = transport.with(url, Script::status(404));
    }
    let sink = RecordingSink::new();

    let result = create_test_downloader_builder(temp_dir.path())
        .concurrent_downloads(8)
        .transport(Arc::new(transport))
        .progress_sink(sink.clone())
        .build()
        .run(&urls)
        .await
        .unwrap();

    assert_eq!(result.succeeded(), 15);
    let fractions = sink.fractions();
    assert_eq!(fractions.len(), 15);
    assert_monotonic(&fractions);
    assert_eq!(fractions.last().copied(), Some(0.75));
}

#[tokio::test]
async fn test_every_transfer_ends_exactly_once() {
    let temp_dir = create_temp_dir();
    let urls: Vec<String> = (0..12)
        .map(|i| create_test_url(&format!("end/{i}.bin")))
        .collect();
    let transport =
        MockTransport::new(Script::ok(&create_test_content(40))).with(&urls[7], Script::status(502));
    let sink = RecordingSink::new();

    create_test_downloader_builder(temp_dir.path())
        .concurrent_downloads(3)
        .transport(Arc::new(transport))
        .progress_sink(sink.clone())
        .build()
        .run(&urls)
        .await
        .unwrap();

    let counts = sink.terminal_counts();
    assert_eq!(counts.len(), 12);
    assert!(counts.values().all(|count| *count == 1));

    for id in 0..12 {
        let events = sink.events_for(id);
        assert_eq!(events.first().map(|e| e.phase), Some(Phase::Started));
        let expected = if id == 7 { Phase::Failed } else { Phase::Succeeded };
        assert_eq!(events.last().map(|e| e.phase), Some(expected));
    }
}

#[tokio::test]
async fn test_streaming_events_are_throttled() {
    let temp_dir = create_temp_dir();
    // 16 byte chunks: 8 chunks per transfer.
    let content = create_test_content(128);
    let urls: Vec<String> = (0..3)
        .map(|i| create_test_url(&format!("throttle/{i}.bin")))
        .collect();

    let count_streaming = |sink: &RecordingSink, id: usize| {
        sink.events_for(id)
            .iter()
            .filter(|e| e.phase == Phase::Streaming)
            .count()
    };

    let throttled = RecordingSink::new();
    create_test_downloader_builder(temp_dir.path())
        .transport(Arc::new(MockTransport::new(Script::ok(&content))))
        .progress_sink(throttled.clone())
        .progress_window(Duration::from_secs(3600))
        .build()
        .run(&urls)
        .await
        .unwrap();
    for id in 0..3 {
        assert_eq!(count_streaming(&*throttled, id), 1);
        let last = throttled.events_for(id).pop().unwrap();
        assert_eq!((last.phase, last.bytes), (Phase::Succeeded, 128));
    }

    let unthrottled = RecordingSink::new();
    create_test_downloader_builder(temp_dir.path())
        .transport(Arc::new(MockTransport::new(Script::ok(&content))))
        .progress_sink(unthrottled.clone())
        .progress_window(Duration::ZERO)
        .build()
        .run(&urls)
        .await
        .unwrap();
    for id in 0..3 {
        assert_eq!(count_streaming(&*unthrottled, id), 8);
    }
}

#[tokio::test]
async fn test_progress_paths_are_storage_paths() {
    let temp_dir = create_temp_dir();
    let sink = RecordingSink::new();

    create_test_downloader_builder(temp_dir.path())
        .transport(Arc::new(MockTransport::new(Script::ok(b"data"))))
        .progress_sink(sink.clone())
        .build()
        .run(&[create_test_url("p/q.txt?version=3")])
        .await
        .unwrap();

    let events = sink.events_for(0);
    assert!(!events.is_empty());
    assert!(events.iter().all(|e| e.path.ends_with("p/q.txt")));
}

#[tokio::test]
async fn test_urls_sharing_a_destination_run_once() {
    let temp_dir = create_temp_dir();
    let first = create_test_url("dup/x.bin?v=1");
    let second = create_test_url("dup/x.bin?v=2");
    let transport = MockTransport::new(
        Script::ok(&create_test_content(64)).delayed(Duration::from_millis(20)),
    )
    .with(&second, Script::status(500).delayed(Duration::from_millis(5)));
    let transport = Arc::new(transport);

    let result = create_test_downloader_builder(temp_dir.path())
        .concurrent_downloads(2)
        .transport(transport.clone())
        .build()
        .run(&[first.clone(), second])
        .await
        .unwrap();

    assert_eq!(result.total(), 1);
    assert_eq!(result.succeeded(), 1);
    assert!(result.failures().is_empty());
    assert_eq!(transport.opened(), vec![first]);
    assert_file_size(&temp_dir.path().join("dup/x.bin"), 64);
}

#[tokio::test]
async fn test_panicking_callback_keeps_the_batch_result() {
    let temp_dir = create_temp_dir();
    let urls: Vec<String> = (0..4)
        .map(|i| create_test_url(&format!("cb/{i}.bin")))
        .collect();
    let failing = urls[1].clone();
    let transport = MockTransport::new(Script::ok(b"data")).with(&failing, Script::status(404));

    let result = create_test_downloader_builder(temp_dir.path())
        .concurrent_downloads(2)
        .transport(Arc::new(transport))
        .on_complete(|outcome| {
            if outcome.is_success() {
                panic!("callback failure");
            }
        })
        .build()
        .run(&urls)
        .await
        .unwrap();

    assert_eq!(result.succeeded(), 3);
    assert_eq!(result.failed_urls(), vec![failing.as_str()]);
}
