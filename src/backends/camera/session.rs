// SPDX-License-Identifier: GPL-3.0-only

//! Capture session
//!
//! Binds one camera input to a preview surface and an optional metadata
//! output, and starts/stops them as a unit. While running, a pump task on the
//! tokio runtime moves frames from the input to the outputs.

use super::CaptureInput;
use super::metadata::MetadataOutput;
use super::preview::PreviewSurface;
use super::types::{CameraDevice, FrameReceiver};
use crate::constants::pipeline;
use crate::errors::CameraError;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Something that can be attached to a session's output side
#[derive(Debug, Clone)]
pub enum SessionOutput {
    Preview(PreviewSurface),
    Metadata(Arc<MetadataOutput>),
}

pub struct CaptureSession {
    runtime: Handle,
    input: Option<Box<dyn CaptureInput>>,
    preview: Option<PreviewSurface>,
    metadata: Option<Arc<MetadataOutput>>,
    pump: Option<JoinHandle<()>>,
    running: bool,
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("device", &self.device().map(|d| d.name.as_str()))
            .field("outputs", &self.output_count())
            .field("running", &self.running)
            .finish()
    }
}

impl CaptureSession {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            input: None,
            preview: None,
            metadata: None,
            pump: None,
            running: false,
        }
    }

    pub fn can_add_input(&self) -> bool {
        self.input.is_none()
    }

    pub fn add_input(&mut self, input: Box<dyn CaptureInput>) -> Result<(), CameraError> {
        if !self.can_add_input() {
            return Err(CameraError::SessionFailed(
                "Session already has an input".to_string(),
            ));
        }
        debug!(device = %input.device().name, "Input attached");
        self.input = Some(input);
        Ok(())
    }

    /// One preview and one metadata output at most
    pub fn can_add_output(&self, output: &SessionOutput) -> bool {
        match output {
            SessionOutput::Preview(_) => self.preview.is_none(),
            SessionOutput::Metadata(_) => self.metadata.is_none(),
        }
    }

    pub fn add_output(&mut self, output: SessionOutput) -> Result<(), CameraError> {
        if !self.can_add_output(&output) {
            return Err(CameraError::SessionFailed(
                "Session cannot accept another output of this kind".to_string(),
            ));
        }
        if self.running {
            warn!("Output added while running; it takes effect on the next start");
        }
        match output {
            SessionOutput::Preview(preview) => self.preview = Some(preview),
            SessionOutput::Metadata(metadata) => self.metadata = Some(metadata),
        }
        Ok(())
    }

    pub fn input_count(&self) -> usize {
        usize::from(self.input.is_some())
    }

    pub fn output_count(&self) -> usize {
        usize::from(self.preview.is_some()) + usize::from(self.metadata.is_some())
    }

    pub fn metadata_output(&self) -> Option<&Arc<MetadataOutput>> {
        self.metadata.as_ref()
    }

    pub fn device(&self) -> Option<&CameraDevice> {
        self.input.as_ref().map(|input| input.device())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start the input and the frame pump; no-op when already running
    pub fn start_running(&mut self) -> Result<(), CameraError> {
        if self.running {
            return Ok(());
        }
        let input = self
            .input
            .as_mut()
            .ok_or_else(|| CameraError::SessionFailed("Session has no input".to_string()))?;

        let (sender, receiver) = futures::channel::mpsc::channel(pipeline::FRAME_CHANNEL_CAPACITY);
        input.start(sender)?;

        let pump = pump_frames(receiver, self.preview.clone(), self.metadata.clone());
        self.pump = Some(self.runtime.spawn(pump));
        self.running = true;

        info!(device = %input.device().name, "Capture session running");
        Ok(())
    }

    /// Stop the input and the pump; no-op when already stopped
    pub fn stop_running(&mut self) {
        if !self.running {
            return;
        }
        if let Some(input) = self.input.as_mut()
            && let Err(e) = input.stop()
        {
            warn!(error = %e, "Input did not stop cleanly");
        }
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        self.running = false;
        info!("Capture session stopped");
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop_running();
    }
}

async fn pump_frames(
    mut frames: FrameReceiver,
    preview: Option<PreviewSurface>,
    metadata: Option<Arc<MetadataOutput>>,
) {
    while let Some(frame) = frames.next().await {
        if let Some(metadata) = &metadata
            && metadata.try_begin_sample(Instant::now())
        {
            tokio::spawn(Arc::clone(metadata).process(frame.clone()));
        }
        if let Some(preview) = &preview {
            preview.present(frame);
        }
    }
    debug!("Frame channel closed");
}
