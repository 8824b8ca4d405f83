// SPDX-License-Identifier: MPL-2.0

//! Error types for the scanner

use crate::backends::camera::types::BackendError;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Camera-related errors
    Camera(CameraError),
    /// Camera permission errors
    Permission(PermissionError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
}

/// Camera-specific errors
#[derive(Debug, Clone, PartialEq)]
pub enum CameraError {
    /// No camera devices found
    NoCameraFound,
    /// A device exists but could not be wrapped as a session input
    InputUnavailable(String),
    /// The capture session rejected a configuration step or failed to start
    SessionFailed(String),
}

/// Camera permission errors
#[derive(Debug, Clone, PartialEq)]
pub enum PermissionError {
    /// The user refused camera access
    Denied,
    /// Access is blocked by system policy and cannot be granted from here
    Restricted,
    /// The desktop portal could not be reached or answered with an error
    PortalUnavailable(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Permission(e) => write!(f, "Permission error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::NoCameraFound => write!(f, "No camera devices found"),
            CameraError::InputUnavailable(msg) => write!(f, "Camera input unavailable: {}", msg),
            CameraError::SessionFailed(msg) => write!(f, "Capture session failed: {}", msg),
        }
    }
}

impl fmt::Display for PermissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionError::Denied => write!(f, "Camera access denied"),
            PermissionError::Restricted => write!(f, "Camera access restricted by the system"),
            PermissionError::PortalUnavailable(msg) => write!(f, "Camera portal unavailable: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for PermissionError {}

// Conversions from sub-errors to AppError
impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<PermissionError> for AppError {
    fn from(err: PermissionError) -> Self {
        AppError::Permission(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<BackendError> for CameraError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::DeviceNotFound(_) => CameraError::NoCameraFound,
            BackendError::NotAvailable(msg) | BackendError::InitializationFailed(msg) => {
                CameraError::InputUnavailable(msg)
            }
            other => CameraError::SessionFailed(other.to_string()),
        }
    }
}

impl From<zbus::Error> for PermissionError {
    fn from(err: zbus::Error) -> Self {
        PermissionError::PortalUnavailable(err.to_string())
    }
}
