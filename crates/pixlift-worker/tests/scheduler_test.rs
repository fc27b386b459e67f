#[path = "helpers/mod.rs"]
mod helpers;

use helpers::fixtures::{write_file, write_png};
use helpers::transport::{Event, RecordingTransport};
use helpers::{config, request};
use pixlift_core::{ResponseData, UploadError, UploadResult};
use pixlift_worker::UploadScheduler;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn scheduler(
    max_concurrent: usize,
    temp_dir: &std::path::Path,
    transport: Arc<RecordingTransport>,
) -> UploadScheduler {
    UploadScheduler::with_transport(config(max_concurrent, temp_dir), transport).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_never_exceeds_max_concurrent() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_file(dir.path(), "doc.txt", b"hello");
    let transport = Arc::new(RecordingTransport::with_delay(Duration::from_millis(40)));
    let scheduler = scheduler(3, dir.path(), transport.clone());

    let handles: Vec<_> = (0..10)
        .map(|i| scheduler.submit(request(&format!("u{i}"), &source)))
        .collect();
    for handle in handles {
        assert!(handle.await.is_ok());
    }

    assert_eq!(transport.calls(), 10);
    let max_active = transport.max_active();
    assert!(max_active <= 3, "saw {max_active} concurrent transfers");
    assert!(max_active >= 2, "uploads were never run in parallel");

    // The i-th start (1-based) happens after at least i - 3 transfers ended.
    let mut starts = 0usize;
    let mut ends = 0usize;
    for event in transport.events() {
        match event {
            Event::Start(_) => {
                starts += 1;
                assert!(ends + 3 >= starts, "start #{starts} after only {ends} ends");
            }
            Event::End(_) => ends += 1,
        }
    }

    let stats = scheduler.stats();
    assert_eq!(stats.completed, 10);
    assert_eq!(stats.in_flight, 0);
    assert_eq!(stats.queued, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_before_start() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_file(dir.path(), "doc.txt", b"hello");
    let transport = Arc::new(RecordingTransport::gated());
    let scheduler = scheduler(1, dir.path(), transport.clone());

    let first = scheduler.submit(request("a", &source));
    transport.wait_for_starts(1).await;

    let second = scheduler.submit(request("b", &source));
    let third = scheduler.submit(request("c", &source));
    assert_eq!(scheduler.cancel("b"), 1);
    assert_eq!(second.await, Err(UploadError::Cancelled));

    transport.release(2);
    assert!(first.await.is_ok());
    assert!(third.await.is_ok());

    assert_eq!(transport.calls(), 2);
    assert_eq!(transport.started_ids(), vec!["a".to_string(), "c".to_string()]);
    assert_eq!(scheduler.stats().cancelled, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancelled_upload_never_reads_its_source() {
    let source_dir = tempfile::tempdir().unwrap();
    let temp_dir = tempfile::tempdir().unwrap();
    let source = write_file(source_dir.path(), "doc.txt", b"hello");
    let missing = source_dir.path().join("never-written.png");
    let transport = Arc::new(RecordingTransport::gated());
    let scheduler = scheduler(1, temp_dir.path(), transport.clone());

    let blocker = scheduler.submit(request("blocker", &source));
    transport.wait_for_starts(1).await;

    // Running this one would fail to read the source and write nothing useful.
    let queued = scheduler.submit(
        request("ghost", &missing).with_resize(pixlift_core::ResizeOptions::bounded(10, 10)),
    );
    assert_eq!(scheduler.cancel("ghost"), 1);
    assert_eq!(queued.await, Err(UploadError::Cancelled));

    transport.release(1);
    assert!(blocker.await.is_ok());

    assert_eq!(transport.started_ids(), vec!["blocker".to_string()]);
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    let stats = scheduler.stats();
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.cancelled, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_does_not_touch_running_upload() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_file(dir.path(), "doc.txt", b"hello");
    let transport = Arc::new(RecordingTransport::gated());
    let scheduler = scheduler(1, dir.path(), transport.clone());

    let running = scheduler.submit(request("a", &source));
    transport.wait_for_starts(1).await;

    assert_eq!(scheduler.cancel("a"), 0);
    transport.release(1);

    let response = running.await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.data, ResponseData::Text("stored a".into()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_covers_duplicate_ids() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_file(dir.path(), "doc.txt", b"hello");
    let transport = Arc::new(RecordingTransport::gated());
    let scheduler = scheduler(1, dir.path(), transport.clone());

    let blocker = scheduler.submit(request("blocker", &source));
    transport.wait_for_starts(1).await;

    let first = scheduler.submit(request("dup", &source));
    let second = scheduler.submit(request("dup", &source));
    assert_eq!(scheduler.stats().queued, 2);
    assert_eq!(scheduler.cancel("dup"), 2);

    assert_eq!(first.await, Err(UploadError::Cancelled));
    assert_eq!(second.await, Err(UploadError::Cancelled));

    transport.release(1);
    assert!(blocker.await.is_ok());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_callback_fires_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let text = write_file(dir.path(), "doc.txt", b"hello");
    let image = write_png(dir.path(), "photo.png", 120, 80);
    let missing = dir.path().join("missing.bin");

    let transport = Arc::new(
        RecordingTransport::with_delay(Duration::from_millis(20)).failing_for(&["flaky"]),
    );
    let scheduler = scheduler(2, dir.path(), transport.clone());
    let (tx, mut rx) = mpsc::unbounded_channel::<(String, UploadResult)>();

    let submissions = [
        ("plain", text.clone()),
        ("image", image.clone()),
        ("flaky", text.clone()),
        ("missing", missing),
        ("later", image),
        ("cancel-me", text),
    ];
    for (id, path) in submissions.iter() {
        let tx = tx.clone();
        let id_owned = id.to_string();
        scheduler.submit_with_callback(request(id, path), move |result| {
            tx.send((id_owned, result)).unwrap();
        });
    }
    scheduler.cancel("cancel-me");
    drop(tx);

    let mut results: HashMap<String, Vec<UploadResult>> = HashMap::new();
    while let Some((id, result)) = rx.recv().await {
        results.entry(id).or_default().push(result);
    }

    assert_eq!(results.len(), submissions.len());
    for (id, delivered) in &results {
        assert_eq!(delivered.len(), 1, "{id} completed {} times", delivered.len());
    }

    assert!(results["plain"][0].is_ok());
    assert!(results["image"][0].is_ok());
    assert!(results["later"][0].is_ok());
    assert_eq!(results["flaky"][0].as_ref().unwrap_err().code(), "TRANSPORT_ERROR");
    assert_eq!(results["missing"][0].as_ref().unwrap_err().code(), "ENCODING_ERROR");

    // Cancelling raced the scheduler; either it never started or it completed normally.
    match &results["cancel-me"][0] {
        Err(UploadError::Cancelled) => assert!(!transport.started_ids().contains(&"cancel-me".into())),
        other => assert!(other.is_ok(), "unexpected result {other:?}"),
    }

    let stats = scheduler.stats();
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.completed + stats.cancelled, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_close_rejects_new_uploads_but_finishes_queued() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_file(dir.path(), "doc.txt", b"hello");
    let transport = Arc::new(RecordingTransport::gated());
    let scheduler = scheduler(1, dir.path(), transport.clone());

    let running = scheduler.submit(request("a", &source));
    transport.wait_for_starts(1).await;
    let queued = scheduler.submit(request("b", &source));

    scheduler.close();
    let rejected = scheduler.submit(request("c", &source));
    assert_eq!(rejected.await, Err(UploadError::Cancelled));

    transport.release(2);
    assert!(running.await.is_ok());
    assert!(queued.await.is_ok());
    assert_eq!(transport.started_ids(), vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_resized_upload_reports_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png(dir.path(), "wide.png", 400, 200);
    let transport = Arc::new(RecordingTransport::default());
    let scheduler = scheduler(2, dir.path(), transport.clone());

    let upload = request("wide", &source)
        .with_resize(pixlift_core::ResizeOptions::bounded(100, 100));
    let response = scheduler.submit(upload).await.unwrap();

    let metadata = response.preprocessing.metadata().copied().unwrap();
    assert!(response.preprocessing.is_resized());
    assert_eq!((metadata.width, metadata.height), (100, 50));

    let body = transport.body("wide").unwrap();
    let text = String::from_utf8_lossy(&body);
    assert!(text.contains("name=\"X-Image-Width\"\r\nContent-Type: text/plain; charset=UTF-8\r\n\r\n100"));
    assert!(text.contains("name=\"X-Image-Height\"\r\nContent-Type: text/plain; charset=UTF-8\r\n\r\n50"));
}

#[test]
fn test_runtime_shutdown_abandons_pending_uploads() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_file(dir.path(), "doc.txt", b"hello");
    let transport = Arc::new(RecordingTransport::gated());
    let (tx, rx) = std::sync::mpsc::channel::<(String, UploadResult)>();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    let scheduler = runtime
        .block_on(async { UploadScheduler::with_transport(config(1, dir.path()), transport.clone()) })
        .unwrap();

    for id in ["first", "second"] {
        let tx = tx.clone();
        scheduler.submit_with_callback(request(id, &source), move |result| {
            tx.send((id.to_string(), result)).unwrap();
        });
    }
    runtime.block_on(transport.wait_for_starts(1));
    runtime.shutdown_timeout(Duration::from_secs(1));

    let delivered: Vec<_> = rx.try_iter().collect();
    assert_eq!(delivered.len(), 2);
    for (_, result) in delivered {
        assert_eq!(result, Err(UploadError::Abandoned));
    }

    // The upload that held a slot released it when its task was dropped.
    let stats = scheduler.stats();
    assert_eq!(stats.in_flight, 0);
    assert_eq!(stats.completed + stats.failed, 0);
}
