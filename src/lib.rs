// SPDX-License-Identifier: MPL-2.0

//! Code Scanner - scan QR codes from a camera feed
//!
//! A single scanning screen: it checks camera permission, runs a capture
//! session that previews the camera and feeds sampled frames to a symbol
//! recognizer, and shows the first decoded string in an alert.
//!
//! # Architecture
//!
//! - [`app`]: The scanning screen, its messages, handlers and view
//! - [`backends`]: Camera authorization and the GStreamer capture session
//! - [`config`]: User configuration handling
//! - [`terminal`]: Terminal UI loop hosting the screen

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod terminal;

// Re-export commonly used types
pub use app::frame_processor::{MetadataObject, SymbolFormat};
pub use app::{Message, ScanScreen, ScreenState};
pub use config::{Config, ResultPolicy};
pub use errors::{AppError, AppResult, CameraError, PermissionError};
