// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! `update()` routes each message to a handler method implemented in the
//! `handlers` submodules.
//!
//! # Handler Modules
//!
//! - `handlers::permission`: Authorization check and access request
//! - `handlers::session`: Session setup, pause/resume, teardown
//! - `handlers::detection`: Decode batches
//! - `handlers::ui`: Result alert, failure overlay, bounds

use crate::app::state::{Message, ScanScreen};
use tracing::trace;

impl ScanScreen {
    /// Main message handler
    pub fn update(&mut self, message: Message) {
        trace!(?message, "Message");
        match message {
            // ===== Lifecycle =====
            Message::ScreenWillAppear => self.on_screen_will_appear(),
            Message::ScreenWillDisappear => self.on_screen_will_disappear(),
            Message::Discard => self.discard(),

            // ===== Permission =====
            Message::PermissionResolved(granted) => self.handle_permission_resolved(granted),

            // ===== Detection =====
            Message::MetadataDetected(objects) => self.on_barcode_decoded(objects),

            // ===== UI =====
            Message::CloseAlert => self.close_alert(),
            Message::Resize { width, height } => self.handle_resize(width, height),
        }
    }
}
