// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Application identity
pub mod app_info {
    /// Directory name used under the config and cache directories
    pub const APP_DIR: &str = "code-scanner";

    /// Configuration file name
    pub const CONFIG_FILE: &str = "config.json";

    /// Log file name used in terminal mode
    pub const LOG_FILE: &str = "scanner.log";

    /// Current configuration version
    pub const CONFIG_VERSION: u32 = 1;

    /// Application version (git describe, set by build.rs)
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}

/// Fixed user-facing strings
pub mod strings {
    /// Title of the result alert
    pub const RESULT_TITLE: &str = "Found a data matrix";

    /// The single action on the result alert
    pub const CLOSE_ACTION: &str = "Close";

    /// Label inserted by the failure overlay
    pub const FAILURE_MESSAGE: &str = "Couldn't access the camera";

    /// Shown in the preview area before the first frame arrives
    pub const WAITING_FOR_CAMERA: &str = "Waiting for camera...";

    /// Shown while the permission prompt is outstanding
    pub const WAITING_FOR_PERMISSION: &str = "Waiting for camera permission...";
}

/// Failure overlay animation timings
pub mod animation {
    use super::Duration;

    /// Background recolour, starts immediately
    pub const RECOLOR_DURATION: Duration = Duration::from_millis(900);

    /// Delay before the failure label starts to appear
    pub const LABEL_DELAY: Duration = Duration::from_millis(400);

    /// Failure label fade-in
    pub const LABEL_DURATION: Duration = Duration::from_millis(500);
}

/// Terminal colours (RGB)
pub mod colors {
    /// Screen background before the failure recolour
    pub const BACKGROUND: (u8, u8, u8) = (0, 0, 0);

    /// Failure background (system red)
    pub const FAILURE_BACKGROUND: (u8, u8, u8) = (255, 59, 48);

    /// Failure label text
    pub const FAILURE_LABEL: (u8, u8, u8) = (255, 255, 255);
}

/// Recognition defaults
pub mod recognition {
    /// Minimum time between two recognition passes
    pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 100;

    /// Frames are downscaled so that neither side exceeds this before recognition
    pub const DEFAULT_MAX_DIMENSION: u32 = 640;
}

/// GStreamer pipeline configuration
pub mod pipeline {
    /// Maximum buffers in appsink queue
    pub const MAX_BUFFERS: u32 = 2;

    /// Capacity of the channel between the streaming thread and the frame pump
    pub const FRAME_CHANNEL_CAPACITY: usize = 4;

    /// Output format for the appsink
    pub const OUTPUT_FORMAT: &str = "RGBA";

    /// Framerate used when streaming a still image as a camera
    pub const IMAGE_SOURCE_FRAMERATE: u32 = 15;
}

/// Timing constants
pub mod timing {
    /// Frame log interval (log every N frames)
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// Timeout for pipeline stop
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// Timeout for pipeline start
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// Terminal input poll interval while the screen is animating
    pub const UI_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(16);

    /// Terminal input poll interval while nothing moves on screen
    pub const IDLE_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(100);
}

/// File format constants
pub mod file_formats {
    /// Still image extensions; any other file source is decoded as video
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS
            .iter()
            .any(|&e| e.eq_ignore_ascii_case(ext))
    }
}

/// Permission portal (xdg-desktop-portal) names
pub mod portal {
    pub const DESTINATION: &str = "org.freedesktop.portal.Desktop";
    pub const PATH: &str = "/org/freedesktop/portal/desktop";
    pub const CAMERA_INTERFACE: &str = "org.freedesktop.portal.Camera";
    pub const REQUEST_INTERFACE: &str = "org.freedesktop.portal.Request";

    /// Present inside a Flatpak sandbox
    pub const FLATPAK_INFO: &str = "/.flatpak-info";

    /// Portal response code for a granted request
    pub const RESPONSE_SUCCESS: u32 = 0;
}
