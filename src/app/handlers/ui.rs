// SPDX-License-Identifier: GPL-3.0-only

//! Alert and failure overlay handlers

use crate::app::animation::FailureOverlay;
use crate::app::state::{Alert, ScanScreen};
use crate::config::ResultPolicy;
use std::time::Instant;
use tracing::{debug, info};

impl ScanScreen {
    /// Present the result alert, or apply the result policy if one is open
    pub fn show_result(&mut self, text: String) {
        match (&mut self.alert, self.config.result_policy) {
            (Some(_), ResultPolicy::Suppress) => {
                debug!("Alert already open, result suppressed");
            }
            (Some(alert), ResultPolicy::Replace) => {
                debug!("Alert already open, result replaced");
                alert.message = text;
            }
            (None, _) => {
                info!(len = text.len(), "Showing decoded result");
                self.alert = Some(Alert::result(text));
                self.alerts_presented += 1;
            }
        }
    }

    /// Dismiss the alert; scanning continues underneath
    pub fn close_alert(&mut self) {
        if self.alert.take().is_some() {
            debug!("Alert closed");
        }
    }

    /// Start the failure overlay; later calls keep the running one
    pub fn show_failure_ui(&mut self) {
        if self.failure.is_some() {
            return;
        }
        self.failure = Some(FailureOverlay::start(Instant::now()));
        self.failures_shown += 1;
    }

    /// Lay the preview out above the status line
    pub(crate) fn handle_resize(&mut self, width: u16, height: u16) {
        self.preview.set_bounds((width, height.saturating_sub(1)));
    }
}
