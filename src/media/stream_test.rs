use std::{
    sync::{atomic::Ordering, Arc},
    thread,
    time::Duration,
};

use bytes::Bytes;
use futures::StreamExt;
use image::{GenericImageView, ImageFormat};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{multipart_segment, pull_loop, EndReason, MjpegStream, ViewerEnd};
use crate::media::{
    source::FrameSource,
    testing::{FakeCamera, FakeOpener},
    types::{DeviceId, EncodedFrame, StreamConfig},
};

const HEADER: &[u8] = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";

fn config(width: u32, height: u32, quality: u8, fps_limit: Option<u32>) -> StreamConfig {
    StreamConfig {
        device: DeviceId::Index(0),
        width,
        height,
        quality,
        fps_limit,
    }
}

fn acquired(camera: FakeCamera) -> Arc<FrameSource> {
    let source = FakeOpener::new(camera).into_source();
    source.acquire().unwrap();
    Arc::new(source)
}

/// Runs one viewer loop on its own thread and collects every segment it sends.
fn run_viewer(source: Arc<FrameSource>, config: StreamConfig) -> (ViewerEnd, Vec<Bytes>) {
    let (tx, mut rx) = mpsc::channel(64);
    let handle = thread::spawn(move || pull_loop(&source, &config, tx, &CancellationToken::new()));

    let mut segments = Vec::new();
    while let Some(segment) = rx.blocking_recv() {
        segments.push(segment);
    }
    (handle.join().unwrap(), segments)
}

fn jpeg_payload(segment: &[u8]) -> &[u8] {
    assert!(segment.starts_with(HEADER), "missing part header");
    assert!(segment.ends_with(b"\r\n"), "missing part trailer");
    &segment[HEADER.len()..segment.len() - 2]
}

#[test]
fn test_multipart_segment_layout() {
    let frame = EncodedFrame {
        data: Bytes::from_static(b"\xFF\xD8jpeg\xFF\xD9"),
    };
    let segment = multipart_segment(&frame);
    assert_eq!(
        &segment[..],
        &b"--frame\r\nContent-Type: image/jpeg\r\n\r\n\xFF\xD8jpeg\xFF\xD9\r\n"[..]
    );
}

#[test]
fn test_five_frames_to_five_segments() {
    let source = acquired(FakeCamera::new(640, 480).frame_limit(5));
    let (end, segments) = run_viewer(source, config(320, 240, 80, None));

    assert_eq!(segments.len(), 5);
    for segment in &segments {
        let jpeg = jpeg_payload(segment);
        let image = image::load_from_memory_with_format(jpeg, ImageFormat::Jpeg).unwrap();
        assert_eq!(image.dimensions(), (320, 240));
    }
    assert_eq!(end.reason, EndReason::SourceFailed);
    assert_eq!(end.frames, 5);
    assert_eq!(end.emitted, 5);
}

#[test]
fn test_read_failure_ends_loop() {
    let source = acquired(FakeCamera::new(64, 48).fail_read(3));
    let (end, segments) = run_viewer(source, config(32, 24, 50, None));

    assert_eq!(segments.len(), 2);
    assert_eq!(end.reason, EndReason::SourceFailed);
    assert_eq!(end.frames, 2);
}

#[test]
fn test_encode_failure_skips_frame() {
    let source = acquired(FakeCamera::new(64, 48).corrupt_read(2).frame_limit(4));
    let (end, segments) = run_viewer(source, config(32, 24, 50, None));

    assert_eq!(segments.len(), 3);
    assert_eq!(end.frames, 4);
    assert_eq!(end.emitted, 3);
    assert_eq!(end.reason, EndReason::SourceFailed);
}

#[test]
fn test_unacquired_source_ends_immediately() {
    let source = Arc::new(FakeOpener::new(FakeCamera::new(64, 48)).into_source());
    let (end, segments) = run_viewer(source, config(32, 24, 50, None));

    assert!(segments.is_empty());
    assert_eq!(end.reason, EndReason::SourceFailed);
}

#[test]
fn test_disconnect_ends_loop() {
    let source = acquired(FakeCamera::new(64, 48));
    let cfg = config(32, 24, 50, None);
    let (tx, mut rx) = mpsc::channel(1);
    let handle = thread::spawn(move || pull_loop(&source, &cfg, tx, &CancellationToken::new()));

    assert!(rx.blocking_recv().is_some());
    assert!(rx.blocking_recv().is_some());
    drop(rx);

    let end = handle.join().unwrap();
    assert_eq!(end.reason, EndReason::Disconnected);
    assert!(end.emitted >= 2);
}

#[test]
fn test_cancelled_loop_reads_nothing() {
    let opener = FakeOpener::new(FakeCamera::new(64, 48));
    let reads = opener.reads.clone();
    let source = opener.into_source();
    source.acquire().unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let (tx, _rx) = mpsc::channel(1);
    let end = pull_loop(&source, &config(32, 24, 50, None), tx, &cancel);

    assert_eq!(end.reason, EndReason::Cancelled);
    assert_eq!(end.frames, 0);
    assert_eq!(reads.load(Ordering::SeqCst), 0);
}

#[test]
fn test_failure_in_one_viewer_spares_the_other() {
    // Whichever viewer performs the shared third read fails; the other keeps going.
    let source = acquired(FakeCamera::new(64, 48).fail_read(3));

    let mut viewers = Vec::new();
    for _ in 0..2 {
        let source = Arc::clone(&source);
        let cfg = config(32, 24, 50, None);
        let (tx, rx) = mpsc::channel(4);
        let handle = thread::spawn(move || pull_loop(&source, &cfg, tx, &CancellationToken::new()));
        viewers.push((rx, handle));
    }

    let mut received = Vec::new();
    for (rx, _) in viewers.iter_mut() {
        let mut count = 0;
        while count < 10 {
            match rx.blocking_recv() {
                Some(_) => count += 1,
                None => break,
            }
        }
        received.push(count);
    }

    let ends: Vec<ViewerEnd> = viewers
        .into_iter()
        .map(|(rx, handle)| {
            drop(rx);
            handle.join().unwrap()
        })
        .collect();

    let failed = ends
        .iter()
        .filter(|end| end.reason == EndReason::SourceFailed)
        .count();
    let survived = ends
        .iter()
        .zip(&received)
        .filter(|(end, count)| end.reason == EndReason::Disconnected && **count == 10)
        .count();
    assert_eq!(failed, 1);
    assert_eq!(survived, 1);
    for end in &ends {
        assert!(end.frames >= end.emitted);
    }
}

// ------------------------------------------------------------------------
// MjpegStream
// ------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn test_stream_respects_fps_cap() {
    let source = acquired(FakeCamera::new(64, 48));
    let cancel = CancellationToken::new();
    let mut stream = MjpegStream::spawn(source, Arc::new(config(32, 24, 50, Some(10))), &cancel);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    let mut count = 0;
    while let Ok(Some(item)) = tokio::time::timeout_at(deadline, stream.next()).await {
        let segment = item.unwrap();
        assert!(segment.starts_with(HEADER));
        count += 1;
    }

    assert!(count >= 5, "only {} frames", count);
    assert!(count <= 11, "{} frames exceeds the cap", count);
    cancel.cancel();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stream_ends_when_source_fails() {
    let source = acquired(FakeCamera::new(64, 48).frame_limit(3));
    let stream = MjpegStream::spawn(source, Arc::new(config(32, 24, 50, None)), &CancellationToken::new());

    let segments: Vec<_> = tokio::time::timeout(Duration::from_secs(5), stream.collect::<Vec<_>>())
        .await
        .unwrap();
    assert_eq!(segments.len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dropping_stream_stops_reads() {
    let opener = FakeOpener::new(FakeCamera::new(64, 48));
    let reads = opener.reads.clone();
    let source = opener.into_source();
    source.acquire().unwrap();

    let mut stream = MjpegStream::spawn(
        Arc::new(source),
        Arc::new(config(32, 24, 50, Some(100))),
        &CancellationToken::new(),
    );
    assert!(stream.next().await.is_some());
    drop(stream);

    tokio::time::sleep(Duration::from_millis(100)).await;
    let settled = reads.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(reads.load(Ordering::SeqCst), settled);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_parent_cancel_ends_stream() {
    let source = acquired(FakeCamera::new(64, 48));
    let cancel = CancellationToken::new();
    let mut stream = MjpegStream::spawn(source, Arc::new(config(32, 24, 50, Some(20))), &cancel);

    assert!(stream.next().await.is_some());
    cancel.cancel();

    let next = tokio::time::timeout(Duration::from_secs(1), stream.next()).await.unwrap();
    assert!(next.is_none());
}
