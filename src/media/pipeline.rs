use std::time::{Duration, Instant};

use bytes::Bytes;
use image::{imageops::FilterType, RgbImage};
use jpeg_encoder::{ColorType, Encoder};

use crate::media::{
    error::StreamError,
    types::{EncodedFrame, RawFrame, StreamConfig},
};

/// Best-effort frame pacing: sleeps until `1/fps` has passed since the previous emission.
/// Never drops or skips frames to catch up.
#[derive(Debug)]
pub struct Pacer {
    min_interval: Option<Duration>,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(fps_limit: Option<u32>) -> Self {
        Self {
            min_interval: fps_limit
                .filter(|fps| *fps > 0)
                .map(|fps| Duration::from_secs_f64(1.0 / fps as f64)),
            last: None,
        }
    }

    pub fn min_interval(&self) -> Option<Duration> {
        self.min_interval
    }

    /// Blocks the calling thread for the rest of the current interval.
    pub fn wait(&mut self) {
        let Some(min_interval) = self.min_interval else {
            return;
        };
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < min_interval {
                std::thread::sleep(min_interval - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}

/// Resize + JPEG encode for one raw frame.
#[derive(Clone, Debug)]
pub struct FramePipeline {
    width: u32,
    height: u32,
    quality: u8,
}

impl FramePipeline {
    pub fn new(config: &StreamConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            quality: config.quality.clamp(1, 100),
        }
    }

    pub fn process(&self, frame: RawFrame) -> Result<EncodedFrame, StreamError> {
        let frame = resize(frame, self.width, self.height)?;
        encode(&frame, self.quality)
    }
}

/// Scales `frame` to `width`x`height`; frames already at that size pass through untouched.
pub fn resize(frame: RawFrame, width: u32, height: u32) -> Result<RawFrame, StreamError> {
    if frame.width == width && frame.height == height {
        return Ok(frame);
    }

    let (src_w, src_h) = (frame.width, frame.height);
    let image = RgbImage::from_raw(src_w, src_h, frame.data).ok_or_else(|| {
        StreamError::Encode(format!("frame buffer too small for {}x{} RGB", src_w, src_h))
    })?;
    let resized = image::imageops::resize(&image, width, height, FilterType::Triangle);
    Ok(RawFrame::new(resized.into_raw(), width, height))
}

/// Compresses an RGB24 frame at `quality` (1-100).
pub fn encode(frame: &RawFrame, quality: u8) -> Result<EncodedFrame, StreamError> {
    let width = u16::try_from(frame.width)
        .map_err(|_| StreamError::Encode(format!("width {} too large", frame.width)))?;
    let height = u16::try_from(frame.height)
        .map_err(|_| StreamError::Encode(format!("height {} too large", frame.height)))?;

    let mut buf = Vec::new();
    let encoder = Encoder::new(&mut buf, quality.clamp(1, 100));
    encoder
        .encode(&frame.data, width, height, ColorType::Rgb)
        .map_err(|e| StreamError::Encode(e.to_string()))?;

    Ok(EncodedFrame {
        data: Bytes::from(buf),
    })
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;
