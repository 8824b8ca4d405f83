// SPDX-License-Identifier: MPL-2.0

//! GStreamer pipeline feeding RGBA frames to the capture session

use super::types::*;
use crate::constants::{file_formats, pipeline, timing};
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Build the `gst-launch` description for a device
pub fn launch_description(device: &CameraDevice) -> String {
    let sink = format!(
        "videoconvert ! video/x-raw,format={} ! appsink name=sink",
        pipeline::OUTPUT_FORMAT
    );

    match &device.kind {
        DeviceKind::V4l2 => {
            format!("v4l2src device=\"{}\" ! decodebin ! {}", device.path, sink)
        }
        DeviceKind::File(path) if is_still_image(path) => format!(
            "filesrc location=\"{}\" ! decodebin ! imagefreeze ! videorate ! video/x-raw,framerate={}/1 ! {}",
            path.display(),
            pipeline::IMAGE_SOURCE_FRAMERATE,
            sink
        ),
        DeviceKind::File(path) => {
            format!("filesrc location=\"{}\" ! decodebin ! {}", path.display(), sink)
        }
    }
}

fn is_still_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(file_formats::is_image_extension)
}

/// Capture pipeline
///
/// Decodes whatever the source produces, converts to RGBA and pushes frames
/// into the session's frame channel from the streaming thread.
pub struct GstPipeline {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
}

impl GstPipeline {
    pub fn new(device: &CameraDevice, frame_sender: FrameSender) -> BackendResult<Self> {
        gstreamer::init().map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        let description = launch_description(device);
        info!(device = %device.name, pipeline = %description, "Creating capture pipeline");

        let pipeline = gstreamer::parse::launch(&description)
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?
            .downcast::<gstreamer::Pipeline>()
            .map_err(|_| {
                BackendError::InitializationFailed("Launch result is not a pipeline".to_string())
            })?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| BackendError::InitializationFailed("Failed to get appsink".to_string()))?
            .dynamic_cast::<AppSink>()
            .map_err(|_| {
                BackendError::InitializationFailed("Failed to cast appsink".to_string())
            })?;

        appsink.set_property("emit-signals", true);
        appsink.set_property("sync", false); // Disable sync for lowest latency
        appsink.set_property("max-buffers", pipeline::MAX_BUFFERS);
        appsink.set_property("drop", true); // Drop old frames if processing is slow
        appsink.set_property("enable-last-sample", false);

        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let frame_start = Instant::now();
                    let frame_num = FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);

                    let sample = appsink.pull_sample().map_err(|e| {
                        if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                            error!(frame = frame_num, error = ?e, "Failed to pull sample");
                        }
                        gstreamer::FlowError::Eos
                    })?;

                    let buffer = sample.buffer().ok_or(gstreamer::FlowError::Error)?;
                    if buffer.flags().contains(gstreamer::BufferFlags::CORRUPTED) {
                        if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                            warn!(frame = frame_num, "Buffer marked as corrupted, skipping frame");
                        }
                        return Ok(gstreamer::FlowSuccess::Ok);
                    }

                    let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;
                    let video_info =
                        VideoInfo::from_caps(caps).map_err(|_| gstreamer::FlowError::Error)?;
                    let map = buffer
                        .map_readable()
                        .map_err(|_| gstreamer::FlowError::Error)?;

                    let frame = CameraFrame {
                        width: video_info.width(),
                        height: video_info.height(),
                        data: Arc::from(map.as_slice()),
                        format: PixelFormat::RGBA,
                        stride: video_info.stride()[0] as u32,
                        captured_at: frame_start,
                    };

                    // Non-blocking: drop the frame when the pump is behind
                    let mut sender = frame_sender.clone();
                    match sender.try_send(frame) {
                        Ok(()) => {
                            if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                                debug!(
                                    frame = frame_num,
                                    width = video_info.width(),
                                    height = video_info.height(),
                                    copy_us = frame_start.elapsed().as_micros(),
                                    "Frame delivered"
                                );
                            }
                        }
                        Err(e) if e.is_disconnected() => return Err(gstreamer::FlowError::Flushing),
                        Err(_) => {
                            if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                                debug!(frame = frame_num, "Frame dropped (channel full)");
                            }
                        }
                    }

                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        Ok(Self { pipeline, appsink })
    }

    /// Set the pipeline to PLAYING and wait (bounded) for the transition
    pub fn start(&self) -> BackendResult<()> {
        self.pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| {
                BackendError::InitializationFailed(format!("Failed to start pipeline: {}", e))
            })?;

        let (result, state, pending) = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::START_TIMEOUT_SECS,
        ));
        debug!(result = ?result, state = ?state, pending = ?pending, "Pipeline state");
        if result.is_err() {
            return Err(BackendError::InitializationFailed(
                "Pipeline failed to reach PLAYING".to_string(),
            ));
        }
        if state != gstreamer::State::Playing {
            warn!("Pipeline is not in PLAYING state yet");
        }
        Ok(())
    }

    /// Stop the pipeline and release the device
    pub fn stop(&self) -> BackendResult<()> {
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());

        self.pipeline
            .set_state(gstreamer::State::Null)
            .map_err(|e| BackendError::Other(format!("Failed to stop pipeline: {}", e)))?;

        let (result, state, _) = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::STOP_TIMEOUT_SECS,
        ));
        match result {
            Ok(_) => info!(state = ?state, "Capture pipeline stopped"),
            Err(e) => debug!(error = ?e, state = ?state, "Pipeline state change had issues"),
        }
        Ok(())
    }
}

impl Drop for GstPipeline {
    fn drop(&mut self) {
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());
        let _ = self.pipeline.set_state(gstreamer::State::Null);
    }
}
