// SPDX-License-Identifier: GPL-3.0-only

//! Screen state and messages

use crate::app::animation::FailureOverlay;
use crate::app::frame_processor::{MetadataObject, SymbolRecognizer};
use crate::backends::authorization::{AuthorizationStatus, CameraAuthorization};
use crate::backends::camera::{CaptureBackend, CaptureSession, MetadataOutput, PreviewSurface};
use crate::config::Config;
use crate::constants::strings;
use crate::errors::AppError;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;

/// Where the scanning screen is in its lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScreenState {
    /// Created, never shown
    #[default]
    Init,
    /// Authorization queried; waiting for the answer when it was not determined
    RequestingPermission,
    /// Session running, decode events handled
    SessionActive,
    /// Session exists but is stopped because the screen is hidden
    Paused,
    /// A result alert is open over a running session
    ResultShown,
    /// Access denied or restricted; failure overlay shown
    PermissionFailed,
    /// No camera or no usable input; failure overlay shown
    CameraUnavailable,
}

impl ScreenState {
    /// States with no way forward in this activation
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScreenState::PermissionFailed | ScreenState::CameraUnavailable
        )
    }
}

/// Everything the screen reacts to
#[derive(Debug, Clone)]
pub enum Message {
    /// The screen is about to become visible
    ScreenWillAppear,
    /// The screen is about to be hidden
    ScreenWillDisappear,
    /// Completion of an outstanding access request
    PermissionResolved(bool),
    /// A batch from the metadata output, in detection order
    MetadataDetected(Vec<MetadataObject>),
    /// The alert's action was chosen
    CloseAlert,
    /// The screen bounds changed (columns, rows)
    Resize { width: u16, height: u16 },
    /// The screen is going away for good
    Discard,
}

/// A dismissing action on an alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertAction {
    pub label: String,
}

/// Modal alert rendered over the screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
    pub actions: Vec<AlertAction>,
}

impl Alert {
    /// The result alert: fixed title, decoded text as body, one Close action
    pub fn result(text: impl Into<String>) -> Self {
        Self {
            title: strings::RESULT_TITLE.to_string(),
            message: text.into(),
            actions: vec![AlertAction {
                label: strings::CLOSE_ACTION.to_string(),
            }],
        }
    }
}

/// The scanning screen
///
/// Owns the capture session and reacts to lifecycle messages and to decode
/// batches forwarded from the metadata output. All mutation happens on the
/// thread calling [`update`](ScanScreen::update).
pub struct ScanScreen {
    /// Settings for this run
    pub config: Config,
    /// Runtime for the permission request and the session's frame pump
    pub(crate) runtime: Handle,
    pub(crate) authorization: Arc<dyn CameraAuthorization>,
    pub(crate) backend: Arc<dyn CaptureBackend>,
    pub(crate) recognizer: Arc<dyn SymbolRecognizer>,
    /// Sender side of the screen's own message queue
    pub(crate) messages: UnboundedSender<Message>,
    /// Present only after a successful setup
    pub(crate) session: Option<CaptureSession>,
    pub(crate) metadata_output: Option<Arc<MetadataOutput>>,
    pub(crate) preview: PreviewSurface,
    pub(crate) phase: ScreenState,
    pub(crate) visible: bool,
    /// Last known authorization status
    pub(crate) permission: Option<AuthorizationStatus>,
    pub(crate) permission_request_pending: bool,
    pub(crate) alert: Option<Alert>,
    pub(crate) failure: Option<FailureOverlay>,
    /// Why the screen ended up in a failure state
    pub(crate) last_error: Option<AppError>,
    pub(crate) sessions_created: usize,
    pub(crate) alerts_presented: usize,
    pub(crate) failures_shown: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_alert_has_single_close_action() {
        let alert = Alert::result("HELLO");
        assert_eq!(alert.title, "Found a data matrix");
        assert_eq!(alert.message, "HELLO");
        assert_eq!(alert.actions.len(), 1);
        assert_eq!(alert.actions[0].label, "Close");
    }

    #[test]
    fn test_terminal_states() {
        assert!(ScreenState::PermissionFailed.is_terminal());
        assert!(ScreenState::CameraUnavailable.is_terminal());
        assert!(!ScreenState::Paused.is_terminal());
    }
}
