use std::{
    convert::Infallible,
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    task::{Context, Poll},
    time::{Duration, Instant},
};

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard, WaitForCancellationFutureOwned};

use crate::media::{
    pipeline::{FramePipeline, Pacer},
    source::FrameSource,
    types::{EncodedFrame, StreamConfig},
};

/// `Content-Type` of the `/video_feed` response.
pub const MULTIPART_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

const PART_HEADER: &[u8] = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";
const PART_TRAILER: &[u8] = b"\r\n";
const STATS_INTERVAL: Duration = Duration::from_secs(5);

static NEXT_VIEWER_ID: AtomicU64 = AtomicU64::new(1);

/// Frames one JPEG as a multipart part: boundary, header, blank line, payload, CRLF.
pub fn multipart_segment(frame: &EncodedFrame) -> Bytes {
    let mut buf = BytesMut::with_capacity(PART_HEADER.len() + frame.len() + PART_TRAILER.len());
    buf.extend_from_slice(PART_HEADER);
    buf.extend_from_slice(&frame.data);
    buf.extend_from_slice(PART_TRAILER);
    buf.freeze()
}

/// Per-connection diagnostics: a frame counter and periodic throughput logging.
#[derive(Debug)]
pub struct ViewerSession {
    id: u64,
    frames: u64,
    emitted: u64,
    started: Instant,
    last_log: Instant,
}

impl ViewerSession {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            id: NEXT_VIEWER_ID.fetch_add(1, Ordering::Relaxed),
            frames: 0,
            emitted: 0,
            started: now,
            last_log: now,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Frames read from the source by this viewer.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Segments handed to the connection.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    fn record_read(&mut self) {
        self.frames += 1;

        let now = Instant::now();
        if now.duration_since(self.last_log) >= STATS_INTERVAL {
            let elapsed = now.duration_since(self.started).as_secs_f64();
            log::debug!(
                "viewer {}: Stats: {} frames, {:.2} FPS average",
                self.id,
                self.frames,
                self.frames as f64 / elapsed
            );
            self.last_log = now;
        }
    }

    fn record_emit(&mut self, frame: &EncodedFrame) {
        self.emitted += 1;
        if self.emitted == 1 {
            log::debug!("viewer {}: First frame size: {} bytes", self.id, frame.len());
        }
    }
}

impl Default for ViewerSession {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndReason {
    /// The frame source reported a read failure.
    SourceFailed,
    /// The connection's receiving end went away.
    Disconnected,
    /// The viewer or the whole server was cancelled.
    Cancelled,
}

/// How a pull loop finished.
#[derive(Debug)]
pub struct ViewerEnd {
    pub reason: EndReason,
    pub frames: u64,
    pub emitted: u64,
}

/// One viewer's blocking pull loop: pace, read, resize, encode, frame, send.
///
/// Runs until the source fails, `tx` is closed, or `cancel` fires. Encoding failures
/// skip the frame. Must run on a thread where blocking is allowed.
pub fn pull_loop(
    source: &FrameSource,
    config: &StreamConfig,
    tx: mpsc::Sender<Bytes>,
    cancel: &CancellationToken,
) -> ViewerEnd {
    let pipeline = FramePipeline::new(config);
    let mut pacer = Pacer::new(config.fps_limit);
    let mut session = ViewerSession::new();

    log::info!("viewer {}: Starting frame generation", session.id());

    let reason = loop {
        if cancel.is_cancelled() {
            break EndReason::Cancelled;
        }

        pacer.wait();

        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("viewer {}: {}", session.id(), e);
                break EndReason::SourceFailed;
            }
        };
        session.record_read();

        let encoded = match pipeline.process(frame) {
            Ok(encoded) => encoded,
            Err(e) => {
                log::error!("viewer {}: {}", session.id(), e);
                continue;
            }
        };
        session.record_emit(&encoded);

        if tx.blocking_send(multipart_segment(&encoded)).is_err() {
            break EndReason::Disconnected;
        }
    };

    log::info!(
        "viewer {}: stream ended ({:?}) after {} frames",
        session.id(),
        reason,
        session.frames()
    );

    ViewerEnd {
        reason,
        frames: session.frames(),
        emitted: session.emitted(),
    }
}

/// Response body for one viewer, backed by its own pull loop on the blocking pool.
///
/// Dropping the stream (client gone) cancels the loop; so does cancelling the parent
/// token passed to [`MjpegStream::spawn`].
pub struct MjpegStream {
    inner: ReceiverStream<Bytes>,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
    _guard: DropGuard,
}

impl MjpegStream {
    pub fn spawn(
        source: Arc<FrameSource>,
        config: Arc<StreamConfig>,
        parent: &CancellationToken,
    ) -> Self {
        // One slot: a slow client never holds more than one stale frame.
        let (tx, rx) = mpsc::channel(1);
        let cancel = parent.child_token();

        let loop_cancel = cancel.clone();
        tokio::task::spawn_blocking(move || pull_loop(&source, &config, tx, &loop_cancel));

        Self {
            inner: ReceiverStream::new(rx),
            cancelled: Box::pin(cancel.clone().cancelled_owned()),
            _guard: cancel.drop_guard(),
        }
    }
}

impl Stream for MjpegStream {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancelled.as_mut().poll(cx).is_ready() {
            return Poll::Ready(None);
        }
        self.inner.poll_next_unpin(cx).map(|opt| opt.map(Ok))
    }
}

#[cfg(test)]
#[path = "stream_test.rs"]
mod stream_test;
