// SPDX-License-Identifier: GPL-3.0-only

//! Camera permission handlers

use crate::app::state::{Message, ScanScreen, ScreenState};
use crate::backends::authorization::AuthorizationStatus;
use tracing::{debug, info, warn};

impl ScanScreen {
    /// Whether access is already authorized
    ///
    /// When nobody has been asked yet this starts the request and returns
    /// `false` right away; the answer arrives later as
    /// [`Message::PermissionResolved`].
    pub fn check_and_request_permission(&mut self) -> bool {
        let status = self.authorization.current_status();
        debug!(?status, "Camera authorization status");
        self.permission = Some(status);

        match status {
            AuthorizationStatus::Authorized => true,
            AuthorizationStatus::Denied | AuthorizationStatus::Restricted => false,
            AuthorizationStatus::NotDetermined => {
                self.request_access();
                false
            }
        }
    }

    fn request_access(&mut self) {
        if self.permission_request_pending {
            return;
        }
        self.permission_request_pending = true;

        let request = self.authorization.request_access();
        let messages = self.messages.clone();
        self.runtime.spawn(async move {
            let granted = request.await;
            if messages.send(Message::PermissionResolved(granted)).is_err() {
                debug!("Screen discarded before the permission answer");
            }
        });
        info!("Camera access requested");
    }

    /// First activation: check permission, then set up or fail
    pub(crate) fn activate(&mut self) {
        self.phase = ScreenState::RequestingPermission;

        if self.check_and_request_permission() {
            self.start_scanning();
            return;
        }

        match self.permission {
            Some(status @ (AuthorizationStatus::Denied | AuthorizationStatus::Restricted)) => {
                self.fail_permission(status);
            }
            _ => debug!("Waiting for the permission answer"),
        }
    }

    pub(crate) fn handle_permission_resolved(&mut self, granted: bool) {
        self.permission_request_pending = false;
        if self.phase != ScreenState::RequestingPermission {
            debug!(granted, phase = ?self.phase, "Late permission answer ignored");
            return;
        }

        if !granted {
            self.fail_permission(AuthorizationStatus::Denied);
            return;
        }

        info!("Camera access granted");
        self.permission = Some(AuthorizationStatus::Authorized);
        if self.visible {
            self.start_scanning();
        }
    }

    fn fail_permission(&mut self, status: AuthorizationStatus) {
        warn!(?status, "Camera access not granted");
        self.permission = Some(status);
        self.last_error = status.as_error().map(Into::into);
        self.phase = ScreenState::PermissionFailed;
        self.show_failure_ui();
    }
}
