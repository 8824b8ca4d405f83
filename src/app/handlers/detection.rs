// SPDX-License-Identifier: GPL-3.0-only

//! Decode event handling

use crate::app::frame_processor::MetadataObject;
use crate::app::state::{Message, ScanScreen, ScreenState};
use crate::backends::camera::MetadataObjectsDelegate;
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

/// Metadata delegate that marshals batches onto the screen's queue
#[derive(Debug, Clone)]
pub struct MessageForwarder {
    sender: UnboundedSender<Message>,
}

impl MessageForwarder {
    pub fn new(sender: UnboundedSender<Message>) -> Self {
        Self { sender }
    }
}

impl MetadataObjectsDelegate for MessageForwarder {
    fn metadata_output(&self, objects: Vec<MetadataObject>) {
        if self.sender.send(Message::MetadataDetected(objects)).is_err() {
            trace!("Screen gone, dropping metadata batch");
        }
    }
}

/// Text to show for a batch
///
/// Only the first object by arrival order is considered; the rest of the
/// batch is dropped even when the first is unusable.
pub fn select_result(objects: &[MetadataObject]) -> Option<&str> {
    objects.first()?.decoded_string()
}

impl ScanScreen {
    pub fn on_barcode_decoded(&mut self, objects: Vec<MetadataObject>) {
        let scanning = self.phase == ScreenState::SessionActive
            && self.session.as_ref().is_some_and(|s| s.is_running());
        if !scanning {
            trace!(phase = ?self.phase, "Not scanning, batch ignored");
            return;
        }

        match select_result(&objects) {
            Some(text) => self.show_result(text.to_string()),
            None => trace!(count = objects.len(), "First object has no decoded string"),
        }
    }
}
