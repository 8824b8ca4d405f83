// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Where a camera device's frames come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceKind {
    /// V4L2 capture node (e.g. /dev/video0)
    V4l2,
    /// Still image or video file streamed as if it were a camera
    File(PathBuf),
}

/// Device information from V4L2 capability
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Name of the device (V4L2 card)
    pub card: String,
    /// Driver name (V4L2 driver)
    pub driver: String,
    /// Bus information, shared by all nodes of one physical camera
    pub bus: String,
    /// Real device path (resolved symlinks)
    pub real_path: String,
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub name: String,
    pub path: String, // V4L2 node path or file path
    pub kind: DeviceKind,
    pub device_info: Option<DeviceInfo>,
}

impl CameraDevice {
    /// A file streamed as a camera
    pub fn from_file(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "file".to_string());
        Self {
            name,
            path: path.to_string_lossy().to_string(),
            kind: DeviceKind::File(path),
            device_info: None,
        }
    }
}

/// Pixel format of a frame handed to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit RGBA, 4 bytes per pixel
    RGBA,
    /// 8-bit luma only
    Gray8,
}

impl PixelFormat {
    /// Bytes per pixel in the main plane
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::RGBA => 4,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// A single video frame
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    pub format: PixelFormat,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// Timestamp when frame was captured (for latency diagnostics)
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Wrap a decoded RGBA image (no row padding)
    pub fn from_rgba_image(image: &image::RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            data: Arc::from(image.as_raw().as_slice()),
            format: PixelFormat::RGBA,
            stride: image.width() * 4,
            captured_at: Instant::now(),
        }
    }

    /// RGB value at (x, y), clamped to the frame; black when the buffer is short
    pub fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if self.width == 0 || self.height == 0 {
            return (0, 0, 0);
        }
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        let bpp = self.format.bytes_per_pixel() as usize;
        let idx = y * self.stride as usize + x * bpp;

        match self.format {
            PixelFormat::RGBA => match self.data.get(idx..idx + 3) {
                Some(px) => (px[0], px[1], px[2]),
                None => (0, 0, 0),
            },
            PixelFormat::Gray8 => match self.data.get(idx) {
                Some(&v) => (v, v, v),
                None => (0, 0, 0),
            },
        }
    }

    /// BT.601 luma at (x, y)
    pub fn luma_at(&self, x: u32, y: u32) -> u8 {
        match self.format {
            PixelFormat::Gray8 => self.rgb_at(x, y).0,
            PixelFormat::RGBA => {
                let (r, g, b) = self.rgb_at(x, y);
                ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
            }
        }
    }
}

/// Receiver for preview frames
pub type FrameReceiver = futures::channel::mpsc::Receiver<CameraFrame>;

/// Sender for preview frames
pub type FrameSender = futures::channel::mpsc::Sender<CameraFrame>;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// Failed to initialize backend
    InitializationFailed(String),
    /// Camera device not found
    DeviceNotFound(String),
    /// General I/O error
    IoError(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::IoError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_at_respects_stride() {
        // 2x2 RGBA with 2 bytes of row padding
        let data: Vec<u8> = vec![
            255, 0, 0, 255, 0, 255, 0, 255, 0, 0, //
            0, 0, 255, 255, 255, 255, 255, 255, 0, 0,
        ];
        let frame = CameraFrame {
            width: 2,
            height: 2,
            data: Arc::from(data.as_slice()),
            format: PixelFormat::RGBA,
            stride: 10,
            captured_at: Instant::now(),
        };

        assert_eq!(frame.rgb_at(0, 0), (255, 0, 0));
        assert_eq!(frame.rgb_at(1, 0), (0, 255, 0));
        assert_eq!(frame.rgb_at(0, 1), (0, 0, 255));
        assert_eq!(frame.rgb_at(5, 5), (255, 255, 255)); // clamped
        assert_eq!(frame.luma_at(1, 1), 255);
    }

    #[test]
    fn test_file_device_name() {
        let device = CameraDevice::from_file(PathBuf::from("/tmp/codes/ticket.png"));
        assert_eq!(device.name, "ticket.png");
        assert!(matches!(device.kind, DeviceKind::File(_)));
    }
}
