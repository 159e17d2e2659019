use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex, MutexGuard, PoisonError,
};

use crate::media::{
    error::StreamError,
    types::{DeviceId, DeviceInfo, RawFrame},
};

/// An opened camera. Reads block until the device delivers a frame.
pub trait CaptureDevice: Send {
    fn info(&self) -> DeviceInfo;
    fn read_frame(&mut self) -> Result<RawFrame, StreamError>;
}

/// Opens a [`CaptureDevice`] for a [`DeviceId`].
pub trait DeviceOpener: Send + Sync {
    fn open(&self, device: &DeviceId) -> Result<Box<dyn CaptureDevice>, StreamError>;
}

/// Process-wide owner of the single camera handle.
///
/// The handle is opened lazily by [`FrameSource::acquire`] and shared by every viewer.
/// Reads go through a mutex, so concurrent viewers take turns on the device.
pub struct FrameSource {
    device: DeviceId,
    opener: Box<dyn DeviceOpener>,
    handle: Mutex<Option<Box<dyn CaptureDevice>>>,
    opens: AtomicU64,
}

impl FrameSource {
    pub fn new(device: DeviceId, opener: impl DeviceOpener + 'static) -> Self {
        Self {
            device,
            opener: Box::new(opener),
            handle: Mutex::new(None),
            opens: AtomicU64::new(0),
        }
    }

    fn handle(&self) -> MutexGuard<'_, Option<Box<dyn CaptureDevice>>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens the device unless it is already open.
    pub fn acquire(&self) -> Result<(), StreamError> {
        let mut handle = self.handle();
        if handle.is_some() {
            return Ok(());
        }

        log::info!("Initializing camera device: {}", self.device);
        let device = self.opener.open(&self.device).map_err(|e| {
            log::error!("Failed to open camera device {}: {}", self.device, e);
            e
        })?;
        self.opens.fetch_add(1, Ordering::Relaxed);

        let info = device.info();
        log::info!("Camera opened successfully");
        log::info!("Backend: {}", info.backend);
        log::info!("Native resolution: {}x{}", info.width, info.height);
        log::info!("Native FPS: {}", info.fps);

        *handle = Some(device);
        Ok(())
    }

    /// Blocking read of the next frame. Fails when the device is not open or stops delivering.
    pub fn next_frame(&self) -> Result<RawFrame, StreamError> {
        let mut handle = self.handle();
        match handle.as_mut() {
            Some(device) => device.read_frame(),
            None => Err(StreamError::FrameRead(format!(
                "camera device {} is not open",
                self.device
            ))),
        }
    }

    /// Closes the device. Does nothing when it was never opened.
    pub fn release(&self) {
        if self.handle().take().is_some() {
            log::info!("Releasing camera");
        }
    }

    pub fn is_open(&self) -> bool {
        self.handle().is_some()
    }

    /// Native handles created so far.
    pub fn open_count(&self) -> u64 {
        self.opens.load(Ordering::Relaxed)
    }

    pub fn info(&self) -> Option<DeviceInfo> {
        self.handle().as_ref().map(|device| device.info())
    }
}

#[cfg(test)]
#[path = "source_test.rs"]
mod source_test;
