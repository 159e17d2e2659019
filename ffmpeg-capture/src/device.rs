use std::fmt::{Display, Formatter};
use std::ops::Range;

use crate::input::{CaptureTarget, VideoCapture};

/// A capture device that opened successfully while probing.
#[derive(Clone, Debug)]
pub struct ProbedDevice {
    pub index: u32,
    pub backend: String,
    pub width: u32,
    pub height: u32,
}

impl Display for ProbedDevice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Device {}: {} - {}x{}",
            self.index, self.backend, self.width, self.height
        )
    }
}

/// Tries to open every index in `indices`; devices that fail to open are skipped.
pub fn probe_indices(indices: Range<u32>) -> Vec<ProbedDevice> {
    indices
        .filter_map(|index| {
            let target = CaptureTarget::index(index);
            match VideoCapture::open(&target) {
                Ok(capture) => Some(ProbedDevice {
                    index,
                    backend: capture.backend().to_string(),
                    width: capture.width(),
                    height: capture.height(),
                }),
                Err(e) => {
                    log::trace!("probe {}: {:#}", target, e);
                    None
                }
            }
        })
        .collect()
}

/// `/dev/video*` nodes, sorted by name.
#[cfg(target_os = "linux")]
pub fn v4l2_device_paths() -> anyhow::Result<Vec<std::path::PathBuf>> {
    use std::path::PathBuf;
    let mut paths: Vec<PathBuf> = std::fs::read_dir("/dev")?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|s| s.starts_with("video"))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();
    Ok(paths)
}

#[cfg(not(target_os = "linux"))]
pub fn v4l2_device_paths() -> anyhow::Result<Vec<std::path::PathBuf>> {
    Ok(Vec::new())
}

/// Index of a `/dev/videoN` node, if the path has that shape.
pub fn video_node_index(path: &std::path::Path) -> Option<u32> {
    path.file_name()?
        .to_str()?
        .strip_prefix("video")?
        .parse()
        .ok()
}
