// SPDX-License-Identifier: GPL-3.0-only

//! Metadata output
//!
//! Watches sampled frames for a configured set of symbol formats and hands
//! each non-empty batch to the registered delegate. At most one recognition
//! runs at a time; frames arriving meanwhile are only previewed.

use crate::app::frame_processor::{MetadataObject, SymbolFormat, SymbolRecognizer};
use crate::backends::camera::types::CameraFrame;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Receiver of recognition batches
pub trait MetadataObjectsDelegate: Send + Sync {
    /// Called with every non-empty batch, in detection order
    fn metadata_output(&self, objects: Vec<MetadataObject>);
}

#[derive(Default)]
struct OutputState {
    object_types: Vec<SymbolFormat>,
    delegate: Option<Arc<dyn MetadataObjectsDelegate>>,
    last_sample: Option<Instant>,
}

pub struct MetadataOutput {
    recognizer: Arc<dyn SymbolRecognizer>,
    sample_interval: Duration,
    state: Mutex<OutputState>,
    busy: AtomicBool,
}

impl std::fmt::Debug for MetadataOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("MetadataOutput")
            .field("object_types", &state.object_types)
            .field("has_delegate", &state.delegate.is_some())
            .field("sample_interval", &self.sample_interval)
            .finish()
    }
}

impl MetadataOutput {
    pub fn new(recognizer: Arc<dyn SymbolRecognizer>, sample_interval: Duration) -> Self {
        Self {
            recognizer,
            sample_interval,
            state: Mutex::new(OutputState::default()),
            busy: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, OutputState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Formats the recognizer behind this output can report
    pub fn available_object_types(&self) -> &[SymbolFormat] {
        self.recognizer.supported_formats()
    }

    /// Set the watched formats; formats the recognizer cannot report are skipped
    pub fn set_object_types(&self, types: &[SymbolFormat]) {
        let available = self.available_object_types();
        let mut watched = Vec::with_capacity(types.len());
        for format in types {
            if !available.contains(format) {
                warn!(format = %format, "Recognizer cannot report this format, not watching it");
            } else if !watched.contains(format) {
                watched.push(*format);
            }
        }
        debug!(?watched, "Metadata object types configured");
        self.lock().object_types = watched;
    }

    pub fn object_types(&self) -> Vec<SymbolFormat> {
        self.lock().object_types.clone()
    }

    pub fn set_delegate(&self, delegate: Arc<dyn MetadataObjectsDelegate>) {
        self.lock().delegate = Some(delegate);
    }

    pub fn clear_delegate(&self) {
        self.lock().delegate = None;
    }

    pub fn has_delegate(&self) -> bool {
        self.lock().delegate.is_some()
    }

    /// Claim the next recognition slot if the interval elapsed and none is running
    pub fn try_begin_sample(&self, now: Instant) -> bool {
        let mut state = self.lock();
        if state.object_types.is_empty() || state.delegate.is_none() {
            return false;
        }
        if let Some(last) = state.last_sample
            && now.saturating_duration_since(last) < self.sample_interval
        {
            return false;
        }
        if self.busy.swap(true, Ordering::AcqRel) {
            return false;
        }
        state.last_sample = Some(now);
        true
    }

    /// Recognize a frame claimed with [`try_begin_sample`](Self::try_begin_sample)
    /// and deliver the batch
    pub async fn process(self: Arc<Self>, frame: CameraFrame) {
        let recognizer = Arc::clone(&self.recognizer);
        let objects = tokio::task::spawn_blocking(move || recognizer.recognize(&frame))
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Recognition task panicked");
                Vec::new()
            });

        self.deliver(objects);
        self.busy.store(false, Ordering::Release);
    }

    /// Filter a batch to the watched formats and hand it to the delegate
    pub fn deliver(&self, objects: Vec<MetadataObject>) {
        let (types, delegate) = {
            let state = self.lock();
            (state.object_types.clone(), state.delegate.clone())
        };

        let objects: Vec<MetadataObject> = objects
            .into_iter()
            .filter(|object| object.format().is_none_or(|format| types.contains(&format)))
            .collect();

        if objects.is_empty() {
            return;
        }

        match delegate {
            Some(delegate) => {
                trace!(count = objects.len(), "Delivering metadata objects");
                delegate.metadata_output(objects);
            }
            None => trace!("No delegate registered, dropping metadata objects"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::frame_processor::FrameRegion;

    struct NullRecognizer;

    impl SymbolRecognizer for NullRecognizer {
        fn supported_formats(&self) -> &[SymbolFormat] {
            &[SymbolFormat::Qr]
        }

        fn recognize(&self, _frame: &CameraFrame) -> Vec<MetadataObject> {
            Vec::new()
        }
    }

    #[derive(Default)]
    struct Collect(Mutex<Vec<Vec<MetadataObject>>>);

    impl MetadataObjectsDelegate for Collect {
        fn metadata_output(&self, objects: Vec<MetadataObject>) {
            self.0.lock().unwrap().push(objects);
        }
    }

    fn output() -> MetadataOutput {
        MetadataOutput::new(Arc::new(NullRecognizer), Duration::from_millis(100))
    }

    #[test]
    fn test_unsupported_formats_are_not_watched() {
        let output = output();
        output.set_object_types(&[SymbolFormat::Aztec, SymbolFormat::Qr, SymbolFormat::Qr]);
        assert_eq!(output.object_types(), vec![SymbolFormat::Qr]);
    }

    #[test]
    fn test_sampling_respects_interval_and_busy_flag() {
        let output = output();
        output.set_object_types(&[SymbolFormat::Qr]);
        let now = Instant::now();

        // No delegate yet
        assert!(!output.try_begin_sample(now));

        output.set_delegate(Arc::new(Collect::default()));
        assert!(output.try_begin_sample(now));
        // Still busy
        assert!(!output.try_begin_sample(now + Duration::from_millis(500)));

        output.busy.store(false, Ordering::Release);
        assert!(!output.try_begin_sample(now + Duration::from_millis(50)));
        assert!(output.try_begin_sample(now + Duration::from_millis(150)));
    }

    #[test]
    fn test_deliver_filters_unwatched_formats_and_keeps_order() {
        let output = output();
        output.set_object_types(&[SymbolFormat::Qr]);
        let delegate = Arc::new(Collect::default());
        output.set_delegate(delegate.clone());

        output.deliver(vec![
            MetadataObject::code(SymbolFormat::Aztec, FrameRegion::default(), "skip"),
            MetadataObject::code(SymbolFormat::Qr, FrameRegion::default(), "first"),
            MetadataObject::code(SymbolFormat::Qr, FrameRegion::default(), "second"),
        ]);
        output.deliver(Vec::new());

        let batches = delegate.0.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0][0].decoded_string(), Some("first"));
        assert_eq!(batches[0][1].decoded_string(), Some("second"));
    }

    #[test]
    fn test_cleared_delegate_receives_nothing() {
        let output = output();
        output.set_object_types(&[SymbolFormat::Qr]);
        let delegate = Arc::new(Collect::default());
        output.set_delegate(delegate.clone());
        output.clear_delegate();

        output.deliver(vec![MetadataObject::code(
            SymbolFormat::Qr,
            FrameRegion::default(),
            "late",
        )]);
        assert!(delegate.0.lock().unwrap().is_empty());
        assert!(!output.has_delegate());
    }
}
