/// Registers FFmpeg formats and input devices (v4l2, avfoundation, dshow).
/// Call once at startup before opening any capture target.
pub fn init() -> anyhow::Result<()> {
    ffmpeg_next::init().map_err(|e| anyhow::anyhow!("ffmpeg_next init: {}", e))
}

pub mod decoder;
pub mod device;
pub mod input;
pub mod scaler;
pub mod stream;

pub use input::{CaptureTarget, VideoCapture};
