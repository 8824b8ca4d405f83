// SPDX-License-Identifier: GPL-3.0-only

//! Terminal host for the scanning screen
//!
//! Owns the UI loop: drains the screen's message queue, draws it with
//! ratatui, and turns key, focus and resize events into messages. Focus loss
//! stands in for the screen being hidden.

use crate::app::frame_processor::QrRecognizer;
use crate::app::{Message, ScanScreen};
use crate::backends::authorization::{
    CameraAuthorization, PortalAuthorization, StaticAuthorization,
};
use crate::backends::camera::{CaptureBackend, DeviceKind, GstBackend};
use crate::config::Config;
use crate::constants::timing;

use crossterm::{
    event::{
        self, DisableFocusChange, EnableFocusChange, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

/// What a key press does
#[derive(Debug, Clone)]
pub enum KeyOutcome {
    Quit,
    Send(Message),
    Ignore,
}

/// Run the scanning screen in the terminal
///
/// With `source` set, that file is streamed instead of a camera and no
/// permission is needed.
pub fn run(config: Config, source: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("code-scanner")
        .build()?;
    gstreamer::init()?;

    let (backend, authorization): (Arc<dyn CaptureBackend>, Arc<dyn CameraAuthorization>) =
        match source {
            Some(path) => {
                info!(path = %path.display(), "Using file source");
                (
                    Arc::new(GstBackend::with_file_source(path)),
                    Arc::new(StaticAuthorization::authorized()),
                )
            }
            None => {
                let backend = GstBackend::new(config.last_camera_path.clone());
                let device_path = backend.default_device().map(|d| PathBuf::from(d.path));
                (
                    Arc::new(backend),
                    Arc::new(PortalAuthorization::new(device_path)),
                )
            }
        };
    let recognizer = Arc::new(QrRecognizer::with_max_dimension(config.max_dimension));

    let (mut screen, mut messages) = ScanScreen::new(
        config.clone(),
        runtime.handle().clone(),
        authorization,
        backend,
        recognizer,
    );

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_screen(&mut terminal, &mut screen, &mut messages);

    let used_camera = screen
        .session()
        .and_then(|session| session.device())
        .filter(|device| device.kind == DeviceKind::V4l2)
        .map(|device| device.path.clone());
    screen.update(Message::Discard);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    // The run's config carries CLI overrides; only the camera is stored
    if let Some(path) = used_camera
        && let Err(e) = Config::remember_camera(&path)
    {
        warn!(error = %e, "Failed to remember camera");
    }

    result
}

fn run_screen(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    screen: &mut ScanScreen,
    messages: &mut UnboundedReceiver<Message>,
) -> Result<(), Box<dyn std::error::Error>> {
    let size = terminal.size()?;
    screen.update(Message::Resize {
        width: size.width,
        height: size.height,
    });
    screen.update(Message::ScreenWillAppear);

    loop {
        while let Ok(message) = messages.try_recv() {
            screen.update(message);
        }

        let now = Instant::now();
        terminal.draw(|f| screen.view(f, now))?;

        // Redraw at frame rate only while something moves
        let timeout = if screen.is_animating(now) {
            timing::UI_POLL_INTERVAL
        } else {
            timing::IDLE_POLL_INTERVAL
        };
        if !event::poll(timeout)? {
            continue;
        }
        let message = match event::read()? {
            Event::Key(key) => match map_key(screen, key) {
                KeyOutcome::Quit => break,
                KeyOutcome::Send(message) => message,
                KeyOutcome::Ignore => continue,
            },
            Event::FocusLost => Message::ScreenWillDisappear,
            Event::FocusGained => Message::ScreenWillAppear,
            Event::Resize(width, height) => Message::Resize { width, height },
            _ => continue,
        };
        screen.update(message);
    }

    Ok(())
}

/// Translate a key press for the current screen state
pub fn map_key(screen: &ScanScreen, key: KeyEvent) -> KeyOutcome {
    if key.kind != KeyEventKind::Press {
        return KeyOutcome::Ignore;
    }

    // Ctrl+C to quit
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return KeyOutcome::Quit;
    }

    match key.code {
        KeyCode::Char('q') => KeyOutcome::Quit,
        KeyCode::Enter | KeyCode::Esc | KeyCode::Char('c') if screen.alert().is_some() => {
            KeyOutcome::Send(Message::CloseAlert)
        }
        KeyCode::Char('h') if screen.is_visible() => {
            KeyOutcome::Send(Message::ScreenWillDisappear)
        }
        KeyCode::Char('h') => KeyOutcome::Send(Message::ScreenWillAppear),
        _ => KeyOutcome::Ignore,
    }
}
