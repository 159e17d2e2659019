//! Fake capture devices for tests.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use crate::media::{
    error::StreamError,
    source::{CaptureDevice, DeviceOpener, FrameSource},
    types::{DeviceId, DeviceInfo, RawFrame},
};

/// Deterministic RGB test pattern with enough detail that JPEG quality matters.
pub fn synthetic_frame(width: u32, height: u32, seed: u32) -> RawFrame {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let noise = (x.wrapping_mul(7919) ^ y.wrapping_mul(104729) ^ seed.wrapping_mul(31)) % 64;
            data.push(((x * 255 / width.max(1)) as u8).wrapping_add(noise as u8));
            data.push(((y * 255 / height.max(1)) as u8).wrapping_sub(noise as u8));
            data.push(((x + y + seed) % 256) as u8);
        }
    }
    RawFrame::new(data, width, height)
}

/// Scripted camera behaviour.
#[derive(Clone, Debug)]
pub struct FakeCamera {
    pub width: u32,
    pub height: u32,
    /// Reads after this many frames fail.
    pub frame_limit: Option<u64>,
    /// 1-based read numbers that fail once; later reads succeed again.
    pub fail_reads: Vec<u64>,
    /// Reads that return a frame whose buffer does not match its dimensions.
    pub corrupt_reads: Vec<u64>,
    /// Opening fails with this reason.
    pub open_error: Option<String>,
}

impl FakeCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_limit: None,
            fail_reads: Vec::new(),
            corrupt_reads: Vec::new(),
            open_error: None,
        }
    }

    pub fn frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    pub fn fail_read(mut self, read: u64) -> Self {
        self.fail_reads.push(read);
        self
    }

    pub fn corrupt_read(mut self, read: u64) -> Self {
        self.corrupt_reads.push(read);
        self
    }

    pub fn busy(mut self) -> Self {
        self.open_error = Some("device busy".to_string());
        self
    }
}

/// Opens [`FakeCamera`] devices; counters are shared across all handles it creates.
#[derive(Clone)]
pub struct FakeOpener {
    camera: FakeCamera,
    pub opens: Arc<AtomicU64>,
    pub reads: Arc<AtomicU64>,
}

impl FakeOpener {
    pub fn new(camera: FakeCamera) -> Self {
        Self {
            camera,
            opens: Arc::new(AtomicU64::new(0)),
            reads: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn into_source(self) -> FrameSource {
        FrameSource::new(DeviceId::Index(0), self)
    }
}

impl DeviceOpener for FakeOpener {
    fn open(&self, device: &DeviceId) -> Result<Box<dyn CaptureDevice>, StreamError> {
        if let Some(reason) = &self.camera.open_error {
            return Err(StreamError::device_open(device, reason));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeDevice {
            camera: self.camera.clone(),
            reads: Arc::clone(&self.reads),
        }))
    }
}

struct FakeDevice {
    camera: FakeCamera,
    reads: Arc<AtomicU64>,
}

impl CaptureDevice for FakeDevice {
    fn info(&self) -> DeviceInfo {
        DeviceInfo {
            backend: "fake".to_string(),
            width: self.camera.width,
            height: self.camera.height,
            fps: 30.0,
        }
    }

    fn read_frame(&mut self) -> Result<RawFrame, StreamError> {
        let read = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        if self.camera.fail_reads.contains(&read) {
            return Err(StreamError::FrameRead(format!("simulated failure on read {}", read)));
        }
        if self.camera.frame_limit.is_some_and(|limit| read > limit) {
            return Err(StreamError::FrameRead("simulated disconnect".to_string()));
        }
        if self.camera.corrupt_reads.contains(&read) {
            return Ok(RawFrame::new(vec![0; 12], self.camera.width, self.camera.height));
        }
        Ok(synthetic_frame(self.camera.width, self.camera.height, read as u32))
    }
}
