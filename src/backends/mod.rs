// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for camera access and capture
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 ScanScreen                   │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌───────────────┐    ┌──────────────────┐  │
//! │  │ Authorization │    │     Camera       │  │
//! │  │   (portal)    │    │   (GStreamer)    │  │
//! │  └───────────────┘    └──────────────────┘  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`authorization`]: Camera permission status and access requests
//! - [`camera`]: Device enumeration, capture inputs, session and outputs

pub mod authorization;
pub mod camera;
