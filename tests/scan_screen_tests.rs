// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the scanning screen lifecycle
//!
//! Fakes stand in for the camera, the authorization provider and the
//! recognizer so no hardware is needed.

use code_scanner::app::frame_processor::{
    FrameRegion, MetadataObject, SymbolFormat, SymbolRecognizer,
};
use code_scanner::backends::authorization::{
    AuthorizationStatus, CameraAuthorization, StaticAuthorization,
};
use code_scanner::backends::camera::{
    BackendError, BackendResult, CameraDevice, CameraFrame, CaptureBackend, CaptureInput,
    DeviceKind, FrameSender,
};
use code_scanner::{
    AppError, CameraError, Config, Message, PermissionError, ResultPolicy, ScanScreen, ScreenState,
};
use futures::FutureExt;
use futures::future::BoxFuture;
use ratatui::{Terminal, backend::TestBackend};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Debug, Default)]
struct Counts {
    opened: usize,
    starts: usize,
    stops: usize,
}

struct FakeBackend {
    device: Option<CameraDevice>,
    fail_open: bool,
    counts: Arc<Mutex<Counts>>,
}

impl FakeBackend {
    fn with_camera() -> Self {
        Self {
            device: Some(CameraDevice {
                name: "Fake Camera".into(),
                path: "/dev/video0".into(),
                kind: DeviceKind::V4l2,
                device_info: None,
            }),
            fail_open: false,
            counts: Arc::default(),
        }
    }

    fn without_camera() -> Self {
        Self {
            device: None,
            ..Self::with_camera()
        }
    }
}

impl CaptureBackend for FakeBackend {
    fn default_device(&self) -> Option<CameraDevice> {
        self.device.clone()
    }

    fn open_input(&self, device: &CameraDevice) -> BackendResult<Box<dyn CaptureInput>> {
        if self.fail_open {
            return Err(BackendError::InitializationFailed("busy".into()));
        }
        self.counts.lock().unwrap().opened += 1;
        Ok(Box::new(FakeInput {
            device: device.clone(),
            sender: None,
            counts: self.counts.clone(),
        }))
    }
}

struct FakeInput {
    device: CameraDevice,
    sender: Option<FrameSender>,
    counts: Arc<Mutex<Counts>>,
}

impl CaptureInput for FakeInput {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn start(&mut self, frames: FrameSender) -> BackendResult<()> {
        self.sender = Some(frames);
        self.counts.lock().unwrap().starts += 1;
        Ok(())
    }

    fn stop(&mut self) -> BackendResult<()> {
        self.sender = None;
        self.counts.lock().unwrap().stops += 1;
        Ok(())
    }
}

/// Never reports anything; batches are injected directly
struct SilentRecognizer;

impl SymbolRecognizer for SilentRecognizer {
    fn supported_formats(&self) -> &[SymbolFormat] {
        &[SymbolFormat::Qr]
    }

    fn recognize(&self, _frame: &CameraFrame) -> Vec<MetadataObject> {
        Vec::new()
    }
}

/// The user never answers the prompt
struct UnansweredAuthorization;

impl CameraAuthorization for UnansweredAuthorization {
    fn current_status(&self) -> AuthorizationStatus {
        AuthorizationStatus::NotDetermined
    }

    fn request_access(&self) -> BoxFuture<'static, bool> {
        futures::future::pending().boxed()
    }
}

fn screen_with(
    config: Config,
    authorization: impl CameraAuthorization + 'static,
    backend: FakeBackend,
) -> (ScanScreen, UnboundedReceiver<Message>, Arc<Mutex<Counts>>) {
    let counts = backend.counts.clone();
    let (screen, messages) = ScanScreen::new(
        config,
        Handle::current(),
        Arc::new(authorization),
        Arc::new(backend),
        Arc::new(SilentRecognizer),
    );
    (screen, messages, counts)
}

fn authorized_screen(config: Config) -> (ScanScreen, UnboundedReceiver<Message>, Arc<Mutex<Counts>>) {
    let (mut screen, messages, counts) = screen_with(
        config,
        StaticAuthorization::authorized(),
        FakeBackend::with_camera(),
    );
    screen.update(Message::ScreenWillAppear);
    (screen, messages, counts)
}

fn code(value: &str) -> MetadataObject {
    MetadataObject::code(SymbolFormat::Qr, FrameRegion::default(), value)
}

#[tokio::test]
async fn test_denied_or_restricted_never_builds_a_session() {
    for (status, error) in [
        (AuthorizationStatus::Denied, PermissionError::Denied),
        (AuthorizationStatus::Restricted, PermissionError::Restricted),
    ] {
        let (mut screen, _messages, counts) = screen_with(
            Config::default(),
            StaticAuthorization::new(status, false),
            FakeBackend::with_camera(),
        );

        screen.update(Message::ScreenWillAppear);
        screen.update(Message::ScreenWillDisappear);
        screen.update(Message::ScreenWillAppear);

        assert!(screen.session().is_none());
        assert_eq!(screen.sessions_created(), 0);
        assert_eq!(counts.lock().unwrap().opened, 0);
        assert_eq!(screen.state(), ScreenState::PermissionFailed);
        assert_eq!(screen.failures_shown(), 1);
        assert!(screen.failure().is_some());
        assert_eq!(screen.last_error(), Some(&AppError::Permission(error)));
    }
}

#[tokio::test]
async fn test_authorized_builds_one_running_session() {
    let (screen, _messages, counts) = authorized_screen(Config::default());

    let session = screen.session().expect("session");
    assert!(session.is_running());
    assert_eq!(session.input_count(), 1);
    assert!(session.metadata_output().is_some());
    // Preview plus metadata
    assert_eq!(session.output_count(), 2);
    assert_eq!(screen.sessions_created(), 1);
    assert_eq!(screen.state(), ScreenState::SessionActive);
    assert_eq!(counts.lock().unwrap().starts, 1);

    // Aztec is configured but the recognizer only reports QR
    let metadata = screen.metadata_output().expect("metadata output");
    assert_eq!(metadata.object_types(), vec![SymbolFormat::Qr]);
    assert!(metadata.has_delegate());
    assert!(screen.failure().is_none());
}

#[tokio::test]
async fn test_hide_and_show_pause_and_resume_the_same_session() {
    let (mut screen, _messages, counts) = authorized_screen(Config::default());

    screen.update(Message::ScreenWillDisappear);
    assert!(!screen.session().unwrap().is_running());
    assert_eq!(screen.state(), ScreenState::Paused);

    screen.update(Message::ScreenWillAppear);
    assert!(screen.session().unwrap().is_running());
    assert_eq!(screen.state(), ScreenState::SessionActive);

    assert_eq!(screen.sessions_created(), 1);
    let counts = counts.lock().unwrap();
    assert_eq!(counts.opened, 1);
    assert_eq!(counts.starts, 2);
    assert_eq!(counts.stops, 1);
}

#[tokio::test]
async fn test_only_first_object_of_a_batch_is_used() {
    let (mut screen, _messages, _counts) = authorized_screen(Config::default());

    screen.update(Message::MetadataDetected(vec![code("first"), code("second")]));
    assert_eq!(screen.alert().map(|a| a.message.as_str()), Some("first"));
    screen.update(Message::CloseAlert);

    let unusable_first = MetadataObject::Other {
        kind: "face".into(),
        bounds: FrameRegion::default(),
    };
    screen.update(Message::MetadataDetected(vec![unusable_first, code("second")]));
    assert!(screen.alert().is_none());

    screen.update(Message::MetadataDetected(vec![code(""), code("second")]));
    assert!(screen.alert().is_none());
    assert_eq!(screen.alerts_presented(), 1);
}

#[tokio::test]
async fn test_hello_shows_one_alert_and_close_keeps_scanning() {
    let (mut screen, _messages, counts) = authorized_screen(Config::default());

    screen.update(Message::MetadataDetected(vec![code("HELLO")]));
    let alert = screen.alert().expect("alert");
    assert_eq!(alert.title, "Found a data matrix");
    assert_eq!(alert.message, "HELLO");
    assert_eq!(alert.actions.len(), 1);
    assert_eq!(alert.actions[0].label, "Close");
    assert_eq!(screen.alerts_presented(), 1);
    assert_eq!(screen.state(), ScreenState::ResultShown);
    assert!(screen.session().unwrap().is_running());

    screen.update(Message::CloseAlert);
    assert!(screen.alert().is_none());
    assert_eq!(screen.state(), ScreenState::SessionActive);
    assert_eq!(screen.sessions_created(), 1);
    assert_eq!(counts.lock().unwrap().opened, 1);
}

#[tokio::test]
async fn test_batches_reach_the_screen_through_the_delegate() {
    let (mut screen, mut messages, _counts) = authorized_screen(Config::default());

    let metadata = screen.metadata_output().unwrap().clone();
    metadata.deliver(vec![code("HELLO")]);

    let message = tokio::time::timeout(Duration::from_secs(5), messages.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(message, Message::MetadataDetected(_)));
    screen.update(message);
    assert_eq!(screen.alert().map(|a| a.message.as_str()), Some("HELLO"));
}

#[tokio::test]
async fn test_unanswered_permission_request_sets_nothing_up() {
    let (mut screen, mut messages, counts) = screen_with(
        Config::default(),
        UnansweredAuthorization,
        FakeBackend::with_camera(),
    );

    assert!(!screen.check_and_request_permission());
    assert!(screen.is_waiting_for_permission());

    screen.update(Message::ScreenWillAppear);
    assert!(screen.session().is_none());
    assert_eq!(screen.state(), ScreenState::RequestingPermission);
    assert_eq!(screen.permission(), Some(AuthorizationStatus::NotDetermined));
    assert_eq!(counts.lock().unwrap().opened, 0);
    assert!(screen.failure().is_none());

    let nothing = tokio::time::timeout(Duration::from_millis(50), messages.recv()).await;
    assert!(nothing.is_err());
}

#[tokio::test]
async fn test_late_grant_sets_up_the_session() {
    let (mut screen, mut messages, _counts) = screen_with(
        Config::default(),
        StaticAuthorization::new(AuthorizationStatus::NotDetermined, true),
        FakeBackend::with_camera(),
    );

    screen.update(Message::ScreenWillAppear);
    assert!(screen.session().is_none());

    let message = tokio::time::timeout(Duration::from_secs(5), messages.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(message, Message::PermissionResolved(true)));
    screen.update(message);

    assert!(screen.session().unwrap().is_running());
    assert_eq!(screen.state(), ScreenState::SessionActive);
    assert!(!screen.is_waiting_for_permission());
}

#[tokio::test]
async fn test_grant_while_hidden_waits_for_the_screen() {
    let (mut screen, _messages, _counts) = screen_with(
        Config::default(),
        StaticAuthorization::new(AuthorizationStatus::NotDetermined, true),
        FakeBackend::with_camera(),
    );

    screen.update(Message::ScreenWillAppear);
    screen.update(Message::ScreenWillDisappear);
    screen.update(Message::PermissionResolved(true));
    assert!(screen.session().is_none());

    screen.update(Message::ScreenWillAppear);
    assert!(screen.session().unwrap().is_running());
}

#[tokio::test]
async fn test_late_refusal_shows_failure() {
    let (mut screen, mut messages, _counts) = screen_with(
        Config::default(),
        StaticAuthorization::new(AuthorizationStatus::NotDetermined, false),
        FakeBackend::with_camera(),
    );

    screen.update(Message::ScreenWillAppear);
    let message = tokio::time::timeout(Duration::from_secs(5), messages.recv())
        .await
        .unwrap()
        .unwrap();
    screen.update(message);

    assert!(screen.session().is_none());
    assert_eq!(screen.state(), ScreenState::PermissionFailed);
    assert_eq!(screen.failures_shown(), 1);
}

#[tokio::test]
async fn test_missing_camera_is_a_typed_failure() {
    let (mut screen, _messages, _counts) = screen_with(
        Config::default(),
        StaticAuthorization::authorized(),
        FakeBackend::without_camera(),
    );

    assert_eq!(screen.setup_session(), Err(CameraError::NoCameraFound));

    screen.update(Message::ScreenWillAppear);
    assert!(screen.session().is_none());
    assert_eq!(screen.state(), ScreenState::CameraUnavailable);
    assert_eq!(
        screen.last_error(),
        Some(&AppError::Camera(CameraError::NoCameraFound))
    );
    assert_eq!(screen.failures_shown(), 1);
}

#[tokio::test]
async fn test_unopenable_camera_is_input_unavailable() {
    let backend = FakeBackend {
        fail_open: true,
        ..FakeBackend::with_camera()
    };
    let (mut screen, _messages, _counts) =
        screen_with(Config::default(), StaticAuthorization::authorized(), backend);

    screen.update(Message::ScreenWillAppear);
    assert!(matches!(
        screen.last_error(),
        Some(AppError::Camera(CameraError::InputUnavailable(_)))
    ));
    assert!(screen.session().is_none());
    assert!(screen.metadata_output().is_none());
}

#[tokio::test]
async fn test_results_are_suppressed_while_an_alert_is_open() {
    let (mut screen, _messages, _counts) = authorized_screen(Config::default());

    screen.update(Message::MetadataDetected(vec![code("one")]));
    screen.update(Message::MetadataDetected(vec![code("two")]));

    assert_eq!(screen.alert().map(|a| a.message.as_str()), Some("one"));
    assert_eq!(screen.alerts_presented(), 1);
}

#[tokio::test]
async fn test_results_replace_the_open_alert_when_configured() {
    let config = Config {
        result_policy: ResultPolicy::Replace,
        ..Config::default()
    };
    let (mut screen, _messages, _counts) = authorized_screen(config);

    screen.update(Message::MetadataDetected(vec![code("one")]));
    screen.update(Message::MetadataDetected(vec![code("two")]));

    assert_eq!(screen.alert().map(|a| a.message.as_str()), Some("two"));
    assert_eq!(screen.alerts_presented(), 1);
}

#[tokio::test]
async fn test_batches_are_ignored_while_paused() {
    let (mut screen, _messages, _counts) = authorized_screen(Config::default());

    screen.update(Message::ScreenWillDisappear);
    screen.update(Message::MetadataDetected(vec![code("HELLO")]));
    assert!(screen.alert().is_none());
}

#[tokio::test]
async fn test_discard_tears_down_and_unregisters() {
    let (mut screen, _messages, counts) = authorized_screen(Config::default());
    let metadata = screen.metadata_output().unwrap().clone();

    screen.update(Message::Discard);

    assert!(screen.session().is_none());
    assert!(!metadata.has_delegate());
    assert_eq!(counts.lock().unwrap().stops, 1);
}

#[tokio::test]
async fn test_resize_lays_the_preview_out_above_the_status_line() {
    let (mut screen, _messages, _counts) = authorized_screen(Config::default());
    assert_eq!(screen.preview().bounds(), None);

    screen.update(Message::Resize {
        width: 80,
        height: 24,
    });
    assert_eq!(screen.preview().bounds(), Some((80, 23)));
}

#[tokio::test]
async fn test_result_alert_draws_in_a_narrow_terminal() {
    let (mut screen, _messages, _counts) = authorized_screen(Config::default());
    screen.update(Message::Resize {
        width: 20,
        height: 6,
    });
    screen.update(Message::MetadataDetected(vec![code("HELLO")]));

    let mut terminal = Terminal::new(TestBackend::new(20, 6)).unwrap();
    terminal.draw(|f| screen.view(f, Instant::now())).unwrap();

    let drawn: String = terminal
        .backend()
        .buffer()
        .content()
        .iter()
        .map(|cell| cell.symbol())
        .collect();
    assert!(drawn.contains("HELLO"));
}

#[tokio::test]
async fn test_animation_stops_once_nothing_moves() {
    let now = Instant::now();
    let (mut screen, _messages, _counts) = authorized_screen(Config::default());
    // Live preview
    assert!(screen.is_animating(now));

    screen.update(Message::ScreenWillDisappear);
    assert!(!screen.is_animating(now));

    let (mut failed, _messages, _counts) = screen_with(
        Config::default(),
        StaticAuthorization::authorized(),
        FakeBackend::without_camera(),
    );
    let started = Instant::now();
    failed.update(Message::ScreenWillAppear);
    assert!(failed.is_animating(started));
    assert!(!failed.is_animating(started + Duration::from_secs(2)));
}
