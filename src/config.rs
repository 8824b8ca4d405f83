// SPDX-License-Identifier: GPL-3.0-only

use crate::app::frame_processor::SymbolFormat;
use crate::constants::{app_info, recognition};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// What to do with a decode event while a result alert is already open
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum ResultPolicy {
    /// Ignore new results until the alert is closed
    #[default]
    Suppress,
    /// Show the newest result in the open alert
    Replace,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: u32,
    /// Last used camera device path
    pub last_camera_path: Option<String>,
    /// Symbol formats the metadata output watches
    pub symbol_formats: Vec<SymbolFormat>,
    pub result_policy: ResultPolicy,
    /// Minimum time between two recognition passes
    pub sample_interval_ms: u64,
    /// Frames are downscaled so their longest side fits this before recognition
    pub max_dimension: u32,
    /// Mirror camera preview horizontally (selfie mode)
    pub mirror_preview: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: app_info::CONFIG_VERSION,
            last_camera_path: None,
            symbol_formats: SymbolFormat::DEFAULT.to_vec(),
            result_policy: ResultPolicy::default(),
            sample_interval_ms: recognition::DEFAULT_SAMPLE_INTERVAL_MS,
            max_dimension: recognition::DEFAULT_MAX_DIMENSION,
            mirror_preview: false,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(app_info::APP_DIR).join(app_info::CONFIG_FILE))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("No config directory available, using defaults");
                Self::default()
            }
        }
    }

    /// Load from `path`; a missing or invalid file yields defaults
    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Self::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config, using defaults");
                return Self::default();
            }
        };

        match serde_json::from_str::<Config>(&contents) {
            Ok(config) => {
                if config.version != app_info::CONFIG_VERSION {
                    info!(
                        found = config.version,
                        current = app_info::CONFIG_VERSION,
                        "Config written by another version"
                    );
                }
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Record the camera used in the default config file
    ///
    /// Only `last_camera_path` changes; the rest of the file is kept as
    /// stored, so per-run overrides never reach disk.
    pub fn remember_camera(camera: &str) -> AppResult<bool> {
        let path = Self::path()
            .ok_or_else(|| AppError::Config("No config directory available".to_string()))?;
        Self::remember_camera_at(&path, camera)
    }

    /// Record the camera used in the config file at `path`
    ///
    /// Returns whether the file was written.
    pub fn remember_camera_at(path: &Path, camera: &str) -> AppResult<bool> {
        let mut stored = Self::load_from(path);
        if stored.last_camera_path.as_deref() == Some(camera) {
            return Ok(false);
        }
        stored.last_camera_path = Some(camera.to_string());
        stored.save_to(path)?;
        info!(camera, "Remembered camera");
        Ok(true)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }
}
