// SPDX-License-Identifier: GPL-3.0-only

//! Live preview surface
//!
//! The session pushes every frame here; the view reads the latest one when it
//! draws. Cloning shares the same surface.

use super::types::CameraFrame;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct PreviewState {
    frame: Option<CameraFrame>,
    /// Display bounds (columns, rows) the preview is laid out in
    bounds: Option<(u16, u16)>,
    mirrored: bool,
    frames_presented: u64,
}

#[derive(Debug, Clone, Default)]
pub struct PreviewSurface {
    state: Arc<Mutex<PreviewState>>,
}

impl PreviewSurface {
    fn lock(&self) -> MutexGuard<'_, PreviewState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Resize to the screen bounds
    pub fn set_bounds(&self, bounds: (u16, u16)) {
        self.lock().bounds = Some(bounds);
    }

    /// `None` until the first layout
    pub fn bounds(&self) -> Option<(u16, u16)> {
        self.lock().bounds
    }

    pub fn set_mirrored(&self, mirrored: bool) {
        self.lock().mirrored = mirrored;
    }

    pub fn is_mirrored(&self) -> bool {
        self.lock().mirrored
    }

    /// Replace the displayed frame
    pub fn present(&self, frame: CameraFrame) {
        let mut state = self.lock();
        state.frame = Some(frame);
        state.frames_presented += 1;
    }

    /// The most recent frame, if any arrived
    pub fn latest_frame(&self) -> Option<CameraFrame> {
        self.lock().frame.clone()
    }

    pub fn frames_presented(&self) -> u64 {
        self.lock().frames_presented
    }
}
