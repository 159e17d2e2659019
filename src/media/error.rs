use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    /// The device is missing, busy or not permitted; fatal for the request that hit it.
    #[error("could not open camera device {device}: {reason}")]
    DeviceOpen { device: String, reason: String },
    /// The device stopped delivering frames; ends the viewer that observed it.
    #[error("failed to read frame from camera: {0}")]
    FrameRead(String),
    /// One frame could not be compressed; the frame is skipped.
    #[error("failed to encode frame as JPEG: {0}")]
    Encode(String),
}

impl StreamError {
    pub fn device_open(device: impl ToString, reason: impl ToString) -> Self {
        Self::DeviceOpen {
            device: device.to_string(),
            reason: reason.to_string(),
        }
    }
}
