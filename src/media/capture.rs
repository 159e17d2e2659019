use ffmpeg_capture::{CaptureTarget, VideoCapture};

use crate::media::{
    error::StreamError,
    source::{CaptureDevice, DeviceOpener},
    types::{DeviceId, DeviceInfo, RawFrame},
};

/// Opens cameras through FFmpeg's input devices.
pub struct FfmpegOpener;

impl DeviceOpener for FfmpegOpener {
    fn open(&self, device: &DeviceId) -> Result<Box<dyn CaptureDevice>, StreamError> {
        let target = to_capture_target(device);
        let capture = VideoCapture::open(&target)
            .map_err(|e| StreamError::device_open(device, format!("{:#}", e)))?;
        Ok(Box::new(FfmpegDevice { capture }))
    }
}

struct FfmpegDevice {
    capture: VideoCapture,
}

impl CaptureDevice for FfmpegDevice {
    fn info(&self) -> DeviceInfo {
        DeviceInfo {
            backend: self.capture.backend().to_string(),
            width: self.capture.width(),
            height: self.capture.height(),
            fps: self.capture.fps(),
        }
    }

    fn read_frame(&mut self) -> Result<RawFrame, StreamError> {
        let picture = self
            .capture
            .read_rgb()
            .map_err(|e| StreamError::FrameRead(format!("{:#}", e)))?;
        Ok(RawFrame::new(picture.data, picture.width, picture.height))
    }
}

pub fn to_capture_target(device: &DeviceId) -> CaptureTarget {
    match device {
        DeviceId::Index(index) => CaptureTarget::index(*index),
        DeviceId::Path(path) => CaptureTarget::path(path),
    }
}
