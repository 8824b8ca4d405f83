// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera enumeration
//!
//! Lists `/dev/video*` nodes that can capture video. A physical camera often
//! exposes several nodes (capture + metadata); only the first capture node
//! per bus is kept.

use super::types::{CameraDevice, DeviceInfo, DeviceKind};
use tracing::{debug, info, trace};
use v4l::capability::Flags;

/// Enumerate capture-capable V4L2 devices, ordered by node index
pub fn enumerate_cameras() -> Vec<CameraDevice> {
    let mut nodes = v4l::context::enum_devices();
    nodes.sort_by_key(|node| node.index());

    let mut cameras: Vec<CameraDevice> = Vec::new();

    for node in nodes {
        let path = node.path().to_string_lossy().to_string();

        let device = match v4l::Device::with_path(node.path()) {
            Ok(device) => device,
            Err(e) => {
                debug!(path = %path, error = %e, "Cannot open V4L2 node");
                continue;
            }
        };

        let caps = match device.query_caps() {
            Ok(caps) => caps,
            Err(e) => {
                debug!(path = %path, error = %e, "VIDIOC_QUERYCAP failed");
                continue;
            }
        };

        if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
            trace!(path = %path, "Skipping node without video capture");
            continue;
        }

        if cameras
            .iter()
            .filter_map(|c| c.device_info.as_ref())
            .any(|info| !caps.bus.is_empty() && info.bus == caps.bus)
        {
            trace!(path = %path, bus = %caps.bus, "Skipping secondary node of known camera");
            continue;
        }

        let real_path = std::fs::canonicalize(node.path())
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|_| path.clone());

        let name = node.name().unwrap_or_else(|| caps.card.clone());

        cameras.push(CameraDevice {
            name,
            path,
            kind: DeviceKind::V4l2,
            device_info: Some(DeviceInfo {
                card: caps.card,
                driver: caps.driver,
                bus: caps.bus,
                real_path,
            }),
        });
    }

    info!(count = cameras.len(), "Enumerated V4L2 cameras");
    cameras
}

/// Pick the default device: the preferred path when present, else the first camera
pub fn select_default(cameras: Vec<CameraDevice>, preferred: Option<&str>) -> Option<CameraDevice> {
    if let Some(preferred) = preferred
        && let Some(index) = cameras.iter().position(|c| c.path == preferred)
    {
        return cameras.into_iter().nth(index);
    }
    cameras.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(path: &str) -> CameraDevice {
        CameraDevice {
            name: path.to_string(),
            path: path.to_string(),
            kind: DeviceKind::V4l2,
            device_info: None,
        }
    }

    #[test]
    fn test_select_default_prefers_configured_path() {
        let cameras = vec![camera("/dev/video0"), camera("/dev/video2")];
        let selected = select_default(cameras, Some("/dev/video2")).unwrap();
        assert_eq!(selected.path, "/dev/video2");
    }

    #[test]
    fn test_select_default_falls_back_to_first() {
        let cameras = vec![camera("/dev/video0"), camera("/dev/video2")];
        let selected = select_default(cameras, Some("/dev/video9")).unwrap();
        assert_eq!(selected.path, "/dev/video0");
        assert!(select_default(Vec::new(), None).is_none());
    }
}
