// SPDX-License-Identifier: MPL-2.0

//! Scanning screen
//!
//! # Architecture
//!
//! - `state`: Screen state types (ScanScreen, Message, ScreenState, Alert)
//! - `animation`: Failure overlay timelines
//! - `frame_processor`: Recognition result types and recognizers
//! - `handlers`: Message handlers split by concern
//! - `update`: Message dispatch
//! - `view`: Terminal widgets
//!
//! # Flow
//!
//! ```text
//! Init ─appear─▶ RequestingPermission ─granted─▶ SessionActive ◀─close─ ResultShown
//!                   │            ▲                  │    ▲  └──decode──▶──┘
//!          denied / │            │ PermissionResolved   │hide│show
//!          restricted            │                  ▼    │
//!                   ▼        (not determined)      Paused
//!           PermissionFailed
//! ```
//!
//! Setup errors end in `CameraUnavailable`.

pub mod animation;
pub mod frame_processor;
mod handlers;
mod state;
mod update;
pub mod view;

pub use handlers::detection::{MessageForwarder, select_result};
pub use state::{Alert, AlertAction, Message, ScanScreen, ScreenState};

use crate::app::animation::FailureOverlay;
use crate::app::frame_processor::SymbolRecognizer;
use crate::backends::authorization::{AuthorizationStatus, CameraAuthorization};
use crate::backends::camera::{CaptureBackend, CaptureSession, MetadataOutput, PreviewSurface};
use crate::config::Config;
use crate::errors::AppError;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::debug;

impl ScanScreen {
    /// Create the screen and the receiving end of its message queue
    ///
    /// The caller drains the receiver on the UI thread and feeds every message
    /// back into [`update`](Self::update).
    pub fn new(
        config: Config,
        runtime: Handle,
        authorization: Arc<dyn CameraAuthorization>,
        backend: Arc<dyn CaptureBackend>,
        recognizer: Arc<dyn SymbolRecognizer>,
    ) -> (Self, UnboundedReceiver<Message>) {
        let (messages, receiver) = mpsc::unbounded_channel();
        let preview = PreviewSurface::default();
        preview.set_mirrored(config.mirror_preview);

        debug!(
            formats = ?config.symbol_formats,
            policy = ?config.result_policy,
            "Scan screen created"
        );

        let screen = Self {
            config,
            runtime,
            authorization,
            backend,
            recognizer,
            messages,
            session: None,
            metadata_output: None,
            preview,
            phase: ScreenState::Init,
            visible: false,
            permission: None,
            permission_request_pending: false,
            alert: None,
            failure: None,
            last_error: None,
            sessions_created: 0,
            alerts_presented: 0,
            failures_shown: 0,
        };
        (screen, receiver)
    }

    /// Observable state; an open alert over a running session reads as `ResultShown`
    pub fn state(&self) -> ScreenState {
        if self.alert.is_some() && self.phase == ScreenState::SessionActive {
            ScreenState::ResultShown
        } else {
            self.phase
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    pub fn metadata_output(&self) -> Option<&Arc<MetadataOutput>> {
        self.metadata_output.as_ref()
    }

    pub fn preview(&self) -> &PreviewSurface {
        &self.preview
    }

    pub fn permission(&self) -> Option<AuthorizationStatus> {
        self.permission
    }

    pub fn is_waiting_for_permission(&self) -> bool {
        self.permission_request_pending
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    pub fn failure(&self) -> Option<&FailureOverlay> {
        self.failure.as_ref()
    }

    pub fn last_error(&self) -> Option<&AppError> {
        self.last_error.as_ref()
    }

    /// Sessions constructed over the screen's lifetime
    pub fn sessions_created(&self) -> usize {
        self.sessions_created
    }

    /// Result alerts opened over the screen's lifetime
    pub fn alerts_presented(&self) -> usize {
        self.alerts_presented
    }

    /// Times the failure overlay was started
    pub fn failures_shown(&self) -> usize {
        self.failures_shown
    }
}

impl Drop for ScanScreen {
    fn drop(&mut self) {
        self.discard();
    }
}
