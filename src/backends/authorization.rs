// SPDX-License-Identifier: GPL-3.0-only

//! Camera authorization
//!
//! Native processes may use a camera when they can open its device node, so
//! the status comes from the node's permissions. Sandboxed (Flatpak)
//! processes must ask the xdg-desktop-portal Camera interface; the portal
//! remembers the user's answer and replies without prompting next time.

use crate::constants::portal;
use crate::errors::PermissionError;
use futures::StreamExt;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};

/// Result of the authorization query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    Authorized,
    /// The user refused access
    Denied,
    /// System policy blocks access; the user cannot change it here
    Restricted,
    /// Nobody has been asked yet
    NotDetermined,
}

impl AuthorizationStatus {
    /// The error a failed status maps to
    pub fn as_error(&self) -> Option<PermissionError> {
        match self {
            AuthorizationStatus::Denied => Some(PermissionError::Denied),
            AuthorizationStatus::Restricted => Some(PermissionError::Restricted),
            AuthorizationStatus::Authorized | AuthorizationStatus::NotDetermined => None,
        }
    }
}

/// Camera authorization provider
pub trait CameraAuthorization: Send + Sync {
    /// Current status, without prompting
    fn current_status(&self) -> AuthorizationStatus;

    /// Ask for access; resolves to whether it was granted
    fn request_access(&self) -> BoxFuture<'static, bool>;
}

/// Fixed answer, for file sources (no camera involved) and tests
#[derive(Debug, Clone, Copy)]
pub struct StaticAuthorization {
    status: AuthorizationStatus,
    grant_on_request: bool,
}

impl StaticAuthorization {
    pub fn new(status: AuthorizationStatus, grant_on_request: bool) -> Self {
        Self {
            status,
            grant_on_request,
        }
    }

    pub fn authorized() -> Self {
        Self::new(AuthorizationStatus::Authorized, true)
    }
}

impl CameraAuthorization for StaticAuthorization {
    fn current_status(&self) -> AuthorizationStatus {
        self.status
    }

    fn request_access(&self) -> BoxFuture<'static, bool> {
        let granted = self.grant_on_request;
        Box::pin(async move { granted })
    }
}

/// Device-node permissions natively, xdg-desktop-portal in a sandbox
#[derive(Debug, Clone)]
pub struct PortalAuthorization {
    device_path: Option<PathBuf>,
    sandboxed: bool,
}

impl PortalAuthorization {
    /// `device_path` is the node the screen will open, if one is known
    pub fn new(device_path: Option<PathBuf>) -> Self {
        Self {
            device_path,
            sandboxed: Path::new(portal::FLATPAK_INFO).exists(),
        }
    }
}

impl CameraAuthorization for PortalAuthorization {
    fn current_status(&self) -> AuthorizationStatus {
        if self.sandboxed {
            return AuthorizationStatus::NotDetermined;
        }
        match &self.device_path {
            Some(path) => node_status(path),
            // No camera at all: setup reports that, not the permission check
            None => AuthorizationStatus::Authorized,
        }
    }

    fn request_access(&self) -> BoxFuture<'static, bool> {
        if !self.sandboxed {
            let granted = self.current_status() == AuthorizationStatus::Authorized;
            return Box::pin(async move { granted });
        }
        Box::pin(async move {
            match access_camera().await {
                Ok(granted) => granted,
                Err(e) => {
                    warn!(error = %e, "Camera portal request failed");
                    false
                }
            }
        })
    }
}

/// Map read/write access on a device node to a status
fn node_status(path: &Path) -> AuthorizationStatus {
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return AuthorizationStatus::Restricted;
    };

    // SAFETY: c_path is a valid NUL-terminated string for the duration of the call
    let result = unsafe { libc::access(c_path.as_ptr(), libc::R_OK | libc::W_OK) };
    if result == 0 {
        return AuthorizationStatus::Authorized;
    }

    let err = std::io::Error::last_os_error();
    debug!(path = %path.display(), error = %err, "Device node not accessible");
    match err.raw_os_error() {
        // Node vanished; setup reports the missing camera
        Some(libc::ENOENT) => AuthorizationStatus::Authorized,
        _ => AuthorizationStatus::Restricted,
    }
}

/// `org.freedesktop.portal.Camera.AccessCamera` round trip
async fn access_camera() -> Result<bool, PermissionError> {
    let connection = zbus::Connection::session().await?;

    let sender = connection
        .unique_name()
        .map(|name| name.as_str().trim_start_matches(':').replace('.', "_"))
        .ok_or_else(|| PermissionError::PortalUnavailable("No unique bus name".to_string()))?;
    let token = format!("code_scanner_{}", uuid::Uuid::new_v4().simple());
    let request_path = format!("{}/request/{}/{}", portal::PATH, sender, token);

    // Subscribe before calling so a fast response is not missed
    let request = zbus::Proxy::new(
        &connection,
        portal::DESTINATION,
        request_path.as_str(),
        portal::REQUEST_INTERFACE,
    )
    .await?;
    let mut responses = request.receive_signal("Response").await?;

    let camera = zbus::Proxy::new(
        &connection,
        portal::DESTINATION,
        portal::PATH,
        portal::CAMERA_INTERFACE,
    )
    .await?;

    let mut options: HashMap<&str, Value> = HashMap::new();
    options.insert("handle_token", Value::new(token.as_str()));

    info!("Requesting camera access from the desktop portal");
    let handle: OwnedObjectPath = camera.call("AccessCamera", &(options,)).await?;
    debug!(handle = %handle.as_str(), "Portal request created");

    let message = responses.next().await.ok_or_else(|| {
        PermissionError::PortalUnavailable("Request closed without a response".to_string())
    })?;
    let body = message.body();
    let (response, _results): (u32, HashMap<String, OwnedValue>) = body.deserialize()?;

    info!(response, "Camera portal answered");
    Ok(response == portal::RESPONSE_SUCCESS)
}
