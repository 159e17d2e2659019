use std::fmt::{Display, Formatter};
use std::str::FromStr;

use bytes::Bytes;
use serde::Serialize;

/// Camera identifier: an index (`0`) or a device path / url (`/dev/video10`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DeviceId {
    Index(u32),
    Path(String),
}

impl FromStr for DeviceId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.parse::<u32>() {
            Ok(index) => DeviceId::Index(index),
            Err(_) => DeviceId::Path(s.to_string()),
        })
    }
}

impl Display for DeviceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceId::Index(index) => write!(f, "{}", index),
            DeviceId::Path(path) => write!(f, "{}", path),
        }
    }
}

/// Streaming parameters, fixed for the lifetime of the process.
#[derive(Clone, Debug)]
pub struct StreamConfig {
    pub device: DeviceId,
    pub width: u32,
    pub height: u32,
    // 1-100
    pub quality: u8,
    // None = no pacing
    pub fps_limit: Option<u32>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            device: DeviceId::Index(0),
            width: 640,
            height: 480,
            quality: 50,
            fps_limit: None,
        }
    }
}

/// What the capture backend reported when the device was opened.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceInfo {
    pub backend: String,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

/// Packed RGB24 picture at the device's native size.
#[derive(Clone, Debug)]
pub struct RawFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RawFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }
}

impl Display for RawFrame {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(
            f,
            "RawFrame {{ {}x{}, data: {} }}",
            self.width,
            self.height,
            self.data.len()
        )
    }
}

/// One JPEG image, produced and consumed within a single loop iteration.
#[derive(Clone, Debug)]
pub struct EncodedFrame {
    pub data: Bytes,
}

impl EncodedFrame {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
