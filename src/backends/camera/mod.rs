// SPDX-License-Identifier: MPL-2.0

//! Camera capture subsystem
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │     ScanScreen      │
//! └──────────┬──────────┘
//!            │ owns
//!            ▼
//! ┌─────────────────────┐
//! │   CaptureSession    │  ← start/stop as a unit, frame pump
//! └──┬───────────────┬──┘
//!    │ input         │ outputs
//!    ▼               ▼
//! ┌────────────┐  ┌──────────────────────────────┐
//! │CaptureInput│  │PreviewSurface, MetadataOutput│
//! └────────────┘  └──────────────────────────────┘
//! ```
//!
//! [`CaptureBackend`] selects the default device and wraps it as an input.
//! [`GstBackend`] is the GStreamer implementation (V4L2 nodes or a file
//! streamed as a camera).

pub mod enumeration;
pub mod metadata;
pub mod pipeline;
pub mod preview;
pub mod session;
pub mod types;

pub use metadata::{MetadataObjectsDelegate, MetadataOutput};
pub use preview::PreviewSurface;
pub use session::{CaptureSession, SessionOutput};
pub use types::*;

use pipeline::GstPipeline;
use std::path::PathBuf;
use tracing::{debug, info};

/// Device selection and input creation
pub trait CaptureBackend: Send + Sync {
    /// The device the screen should use, if any camera exists
    fn default_device(&self) -> Option<CameraDevice>;

    /// Wrap a device as a session input
    fn open_input(&self, device: &CameraDevice) -> BackendResult<Box<dyn CaptureInput>>;
}

/// A camera bound into a session
///
/// `start` may be called again after `stop`; every start gets a fresh frame
/// channel.
pub trait CaptureInput: Send {
    fn device(&self) -> &CameraDevice;

    /// Begin delivering frames into `frames`
    fn start(&mut self, frames: FrameSender) -> BackendResult<()>;

    /// Stop delivering frames and release the device
    fn stop(&mut self) -> BackendResult<()>;
}

/// GStreamer-backed capture
#[derive(Debug, Clone, Default)]
pub struct GstBackend {
    /// Camera path to prefer over the first enumerated one
    preferred_path: Option<String>,
    /// Stream this file instead of a camera
    file_source: Option<PathBuf>,
}

impl GstBackend {
    pub fn new(preferred_path: Option<String>) -> Self {
        Self {
            preferred_path,
            file_source: None,
        }
    }

    /// Use a still image or video file as the only device
    pub fn with_file_source(path: PathBuf) -> Self {
        Self {
            preferred_path: None,
            file_source: Some(path),
        }
    }
}

impl CaptureBackend for GstBackend {
    fn default_device(&self) -> Option<CameraDevice> {
        if let Some(path) = &self.file_source {
            return path
                .is_file()
                .then(|| CameraDevice::from_file(path.clone()));
        }
        enumeration::select_default(
            enumeration::enumerate_cameras(),
            self.preferred_path.as_deref(),
        )
    }

    fn open_input(&self, device: &CameraDevice) -> BackendResult<Box<dyn CaptureInput>> {
        gstreamer::init().map_err(|e| BackendError::NotAvailable(e.to_string()))?;

        // Fail early when the node cannot be opened, instead of on first start
        match &device.kind {
            DeviceKind::V4l2 => {
                std::fs::OpenOptions::new()
                    .read(true)
                    .write(true)
                    .open(&device.path)
                    .map_err(|e| {
                        BackendError::InitializationFailed(format!("{}: {}", device.path, e))
                    })?;
            }
            DeviceKind::File(path) => {
                if !path.is_file() {
                    return Err(BackendError::DeviceNotFound(path.display().to_string()));
                }
            }
        }

        debug!(device = %device.name, "Opened capture input");
        Ok(Box::new(GstInput {
            device: device.clone(),
            pipeline: None,
        }))
    }
}

/// Input that builds a fresh GStreamer pipeline on every start
pub struct GstInput {
    device: CameraDevice,
    pipeline: Option<GstPipeline>,
}

impl CaptureInput for GstInput {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn start(&mut self, frames: FrameSender) -> BackendResult<()> {
        if self.pipeline.is_some() {
            return Ok(());
        }
        let pipeline = GstPipeline::new(&self.device, frames)?;
        pipeline.start()?;
        info!(device = %self.device.name, "Capture input started");
        self.pipeline = Some(pipeline);
        Ok(())
    }

    fn stop(&mut self) -> BackendResult<()> {
        match self.pipeline.take() {
            Some(pipeline) => pipeline.stop(),
            None => Ok(()),
        }
    }
}
