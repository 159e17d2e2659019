use std::path::{Path, PathBuf};

use ffmpeg_capture::device::{probe_indices, v4l2_device_paths, video_node_index};

const PROBE_INDICES: u32 = 10;
const MAX_VIDEO_NODE: u32 = 20;

/// `--list-devices`: logs every openable camera index and any extra `/dev/video*` nodes.
pub(crate) fn list_devices() -> anyhow::Result<()> {
    log::info!("Scanning for camera devices...");

    let found = probe_indices(0..PROBE_INDICES);
    for device in &found {
        log::info!("{}", device);
    }

    let indices: Vec<u32> = found.iter().map(|d| d.index).collect();
    for path in unreported_paths(v4l2_device_paths()?, &indices) {
        log::info!("Found device path: {}", path.display());
    }

    if found.is_empty() {
        log::warn!("No openable camera devices found");
    }
    Ok(())
}

/// `/dev/videoN` nodes (N < 20) whose index was not already reported as openable.
fn unreported_paths(paths: Vec<PathBuf>, found: &[u32]) -> Vec<PathBuf> {
    paths
        .into_iter()
        .filter(|path| match video_node_index(Path::new(path)) {
            Some(index) => index < MAX_VIDEO_NODE && !found.contains(&index),
            None => false,
        })
        .collect()
}
