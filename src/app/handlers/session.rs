// SPDX-License-Identifier: GPL-3.0-only

//! Capture session lifecycle handlers

use crate::app::handlers::detection::MessageForwarder;
use crate::app::state::{ScanScreen, ScreenState};
use crate::backends::authorization::AuthorizationStatus;
use crate::backends::camera::{CaptureSession, MetadataOutput, SessionOutput};
use crate::errors::CameraError;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

impl ScanScreen {
    /// Build the capture session and start it
    ///
    /// Acquires the default device and an input for it, attaches the preview
    /// and (when the session has room) a metadata output watching the
    /// configured formats with this screen as its delegate.
    pub fn setup_session(&mut self) -> Result<(), CameraError> {
        if self.session.is_some() {
            debug!("Session already set up");
            return Ok(());
        }

        let device = self
            .backend
            .default_device()
            .ok_or(CameraError::NoCameraFound)?;
        info!(device = %device.name, path = %device.path, "Setting up capture session");

        let input = self.backend.open_input(&device)?;
        let mut session = CaptureSession::new(self.runtime.clone());
        session.add_input(input)?;
        session.add_output(SessionOutput::Preview(self.preview.clone()))?;

        let metadata = Arc::new(MetadataOutput::new(
            Arc::clone(&self.recognizer),
            self.config.sample_interval(),
        ));
        let output = SessionOutput::Metadata(Arc::clone(&metadata));
        let attached = if session.can_add_output(&output) {
            session.add_output(output)?;
            metadata.set_object_types(&self.config.symbol_formats);
            metadata.set_delegate(Arc::new(MessageForwarder::new(self.messages.clone())));
            Some(metadata)
        } else {
            warn!("Session has no room for a metadata output, scanning disabled");
            None
        };

        session.start_running()?;

        self.sessions_created += 1;
        self.metadata_output = attached;
        self.session = Some(session);
        Ok(())
    }

    /// Set up the session, or show the failure UI when that is impossible
    pub(crate) fn start_scanning(&mut self) {
        match self.setup_session() {
            Ok(()) => {
                self.phase = ScreenState::SessionActive;
            }
            Err(e) => {
                error!(error = %e, "Camera unavailable");
                self.last_error = Some(e.into());
                self.phase = ScreenState::CameraUnavailable;
                self.show_failure_ui();
            }
        }
    }

    pub fn on_screen_will_appear(&mut self) {
        self.visible = true;

        if let Some(session) = self.session.as_mut() {
            if !session.is_running() {
                match session.start_running() {
                    Ok(()) => info!("Session resumed"),
                    Err(e) => error!(error = %e, "Failed to resume session"),
                }
            }
            if session.is_running() {
                self.phase = ScreenState::SessionActive;
            }
            return;
        }

        match self.phase {
            ScreenState::Init => self.activate(),
            // Access was granted while the screen was hidden
            ScreenState::RequestingPermission
                if !self.permission_request_pending
                    && self.permission == Some(AuthorizationStatus::Authorized) =>
            {
                self.start_scanning();
            }
            _ => {}
        }
    }

    pub fn on_screen_will_disappear(&mut self) {
        self.visible = false;

        if let Some(session) = self.session.as_mut()
            && session.is_running()
        {
            session.stop_running();
            self.phase = ScreenState::Paused;
            info!("Session paused");
        }
    }

    /// Tear down the session and unregister from the metadata output
    pub fn discard(&mut self) {
        if let Some(metadata) = self.metadata_output.take() {
            metadata.clear_delegate();
        }
        if let Some(mut session) = self.session.take() {
            session.stop_running();
            info!("Session discarded");
        }
        self.alert = None;
        self.visible = false;
    }
}
