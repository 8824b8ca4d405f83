// SPDX-License-Identifier: GPL-3.0-only

//! Message handler modules
//!
//! Handlers are grouped by concern, each one an `impl ScanScreen` block.

pub mod detection;
pub mod permission;
pub mod session;
pub mod ui;
