// SPDX-License-Identifier: MPL-2.0

//! Frame recognition
//!
//! This module defines the recognizer seam used by the metadata output and
//! the rqrr-backed QR implementation. Recognizers are synchronous; the
//! metadata output runs them on a blocking thread.

pub mod tasks;
pub mod types;

use crate::backends::camera::types::CameraFrame;

pub use tasks::qr_detector;
pub use tasks::QrRecognizer;
pub use types::{FrameRegion, MachineReadableCode, MetadataObject, SymbolFormat};

/// Turns a frame into zero or more recognized objects
pub trait SymbolRecognizer: Send + Sync {
    /// Formats this recognizer can report
    fn supported_formats(&self) -> &[SymbolFormat];

    /// Recognize every symbol in the frame, in detection order
    fn recognize(&self, frame: &CameraFrame) -> Vec<MetadataObject>;
}
