// SPDX-License-Identifier: GPL-3.0-only

//! Terminal rendering of the scanning screen
//!
//! The camera feed is drawn with Unicode half-block characters: each cell
//! shows two vertical pixels, the upper one as foreground and the lower one
//! as background.

use crate::app::animation::FailureOverlay;
use crate::app::state::{Alert, ScanScreen, ScreenState};
use crate::backends::camera::types::CameraFrame;
use crate::constants::strings;
use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Widget, Wrap},
};
use std::time::Instant;

impl ScanScreen {
    /// Draw the whole screen
    pub fn view(&self, f: &mut Frame, now: Instant) {
        let area = f.area();

        // Reserve bottom line for status
        let screen_area = Rect {
            height: area.height.saturating_sub(1),
            ..area
        };
        let status_area = Rect {
            y: area.y + area.height.saturating_sub(1),
            height: area.height.min(1),
            ..area
        };

        match &self.failure {
            Some(overlay) => f.render_widget(FailureWidget { overlay, now }, screen_area),
            None => {
                let preview_area = match self.preview.bounds() {
                    Some(bounds) => fit_within(screen_area, bounds),
                    None => screen_area,
                };
                let frame = self.preview.latest_frame();
                let placeholder = if self.permission_request_pending {
                    strings::WAITING_FOR_PERMISSION
                } else {
                    strings::WAITING_FOR_CAMERA
                };
                f.render_widget(
                    PreviewWidget {
                        frame: frame.as_ref(),
                        mirrored: self.preview.is_mirrored(),
                        placeholder,
                    },
                    preview_area,
                );
            }
        }

        if let Some(alert) = &self.alert {
            f.render_widget(AlertWidget { alert }, screen_area);
        }

        let message = self.status_message();
        f.render_widget(StatusBar { message: &message }, status_area);
    }

    /// Whether the next draw differs without any new message
    pub fn is_animating(&self, now: Instant) -> bool {
        self.failure.is_some_and(|overlay| !overlay.is_settled(now))
            || self.session.as_ref().is_some_and(|s| s.is_running())
    }

    fn status_message(&self) -> String {
        match self.state() {
            ScreenState::Init | ScreenState::RequestingPermission => {
                strings::WAITING_FOR_PERMISSION.to_string() + " | 'q' quit"
            }
            ScreenState::SessionActive => {
                let formats: Vec<String> = self
                    .metadata_output
                    .as_ref()
                    .map(|m| m.object_types().iter().map(|f| f.to_string()).collect())
                    .unwrap_or_default();
                if formats.is_empty() {
                    "Preview only | 'h' hide | 'q' quit".to_string()
                } else {
                    format!("Scanning for {} | 'h' hide | 'q' quit", formats.join(", "))
                }
            }
            ScreenState::Paused => "Paused | 'h' show | 'q' quit".to_string(),
            ScreenState::ResultShown => "Enter/Esc close | 'q' quit".to_string(),
            ScreenState::PermissionFailed | ScreenState::CameraUnavailable => {
                match &self.last_error {
                    Some(e) => format!("{} | 'q' quit", e),
                    None => "'q' quit".to_string(),
                }
            }
        }
    }
}

/// Centre a `(columns, rows)` box inside `area`, clipped to it
fn fit_within(area: Rect, bounds: (u16, u16)) -> Rect {
    let width = bounds.0.min(area.width);
    let height = bounds.1.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Renders the latest camera frame, aspect preserved and centred
struct PreviewWidget<'a> {
    frame: Option<&'a CameraFrame>,
    mirrored: bool,
    placeholder: &'a str,
}

impl Widget for PreviewWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = self.frame.filter(|f| f.width > 0 && f.height > 0) else {
            let x = area.x + (area.width.saturating_sub(self.placeholder.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, self.placeholder, Style::default());
            }
            return;
        };
        if area.width == 0 || area.height == 0 {
            return;
        }

        let frame_aspect = frame.width as f64 / frame.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64; // *2 because half-blocks

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            // Terminal is wider - fit to height
            let h = term_height;
            let w = h * frame_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            let h = w / frame_aspect;
            (w as u16, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;
                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let mut src_x = (tx as f64 * x_scale) as u32;
                if self.mirrored {
                    src_x = frame.width.saturating_sub(1).saturating_sub(src_x);
                }
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let (r, g, b) = frame.rgb_at(src_x, src_y_top);
                let top = Color::Rgb(r, g, b);
                let (r, g, b) = frame.rgb_at(src_x, src_y_bottom);
                let bottom = Color::Rgb(r, g, b);

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }
    }
}

/// Full-screen failure indication
struct FailureWidget<'a> {
    overlay: &'a FailureOverlay,
    now: Instant,
}

impl Widget for FailureWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (r, g, b) = self.overlay.background(self.now);
        let background = Color::Rgb(r, g, b);
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_char(' ');
                    cell.set_bg(background);
                }
            }
        }

        if !self.overlay.label_visible(self.now) || area.height == 0 {
            return;
        }
        let (r, g, b) = self.overlay.label_color(self.now);
        let label = strings::FAILURE_MESSAGE;
        let x = area.x + (area.width.saturating_sub(label.len() as u16)) / 2;
        let y = area.y + area.height / 2;
        buf.set_string(
            x,
            y,
            label,
            Style::default()
                .fg(Color::Rgb(r, g, b))
                .bg(background)
                .add_modifier(Modifier::BOLD),
        );
    }
}

/// Modal alert centred over the screen
struct AlertWidget<'a> {
    alert: &'a Alert,
}

impl Widget for AlertWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let content_width = self
            .alert
            .message
            .lines()
            .map(|line| line.chars().count())
            .chain(std::iter::once(self.alert.title.chars().count()))
            .max()
            .unwrap_or(0) as u16;
        // Narrow terminals lower the 30 column minimum to what fits
        let max_width = area.width.saturating_sub(2).max(1);
        let width = content_width
            .saturating_add(4)
            .max(30.min(max_width))
            .min(max_width);
        let inner_width = width.saturating_sub(2).max(1) as usize;
        let message_rows: usize = self
            .alert
            .message
            .lines()
            .map(|line| line.chars().count().div_ceil(inner_width).max(1))
            .sum::<usize>()
            .max(1);
        // Border, message, blank line, actions
        let height = (message_rows as u16 + 4).min(area.height);

        let popup = Rect {
            x: area.x + (area.width.saturating_sub(width)) / 2,
            y: area.y + (area.height.saturating_sub(height)) / 2,
            width: width.min(area.width),
            height,
        };

        let actions = self
            .alert
            .actions
            .iter()
            .map(|action| format!("[ {} ]", action.label))
            .collect::<Vec<_>>()
            .join("  ");

        let mut text = Text::from(self.alert.message.as_str());
        text.push_line(Line::default());
        text.push_line(Line::styled(
            actions,
            Style::default().add_modifier(Modifier::BOLD),
        ));

        Clear.render(popup, buf);
        Paragraph::new(text)
            .block(
                Block::bordered()
                    .title(self.alert.title.as_str())
                    .title_alignment(Alignment::Center),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: false })
            .render(popup, buf);
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn solid_frame(rgb: (u8, u8, u8)) -> CameraFrame {
        let mut image = image::RgbaImage::new(4, 4);
        for pixel in image.pixels_mut() {
            *pixel = image::Rgba([rgb.0, rgb.1, rgb.2, 255]);
        }
        CameraFrame::from_rgba_image(&image)
    }

    #[test]
    fn test_preview_draws_half_blocks() {
        let frame = solid_frame((10, 20, 30));
        let area = Rect::new(0, 0, 8, 4);
        let mut buf = Buffer::empty(area);
        PreviewWidget {
            frame: Some(&frame),
            mirrored: false,
            placeholder: strings::WAITING_FOR_CAMERA,
        }
        .render(area, &mut buf);

        let cell = &buf[(4, 2)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(10, 20, 30));
        assert_eq!(cell.bg, Color::Rgb(10, 20, 30));
    }

    #[test]
    fn test_preview_placeholder_without_frame() {
        let area = Rect::new(0, 0, 40, 3);
        let mut buf = Buffer::empty(area);
        PreviewWidget {
            frame: None,
            mirrored: false,
            placeholder: strings::WAITING_FOR_CAMERA,
        }
        .render(area, &mut buf);

        let row: String = (0..area.width).map(|x| buf[(x, 1)].symbol()).collect();
        assert!(row.contains(strings::WAITING_FOR_CAMERA));
    }

    #[test]
    fn test_failure_label_appears_after_delay() {
        let start = Instant::now();
        let overlay = FailureOverlay::start(start);
        let area = Rect::new(0, 0, 40, 5);

        let mut early = Buffer::empty(area);
        FailureWidget {
            overlay: &overlay,
            now: start + Duration::from_millis(100),
        }
        .render(area, &mut early);
        let row: String = (0..area.width).map(|x| early[(x, 2)].symbol()).collect();
        assert!(!row.contains(strings::FAILURE_MESSAGE));

        let mut late = Buffer::empty(area);
        FailureWidget {
            overlay: &overlay,
            now: start + Duration::from_secs(1),
        }
        .render(area, &mut late);
        let row: String = (0..area.width).map(|x| late[(x, 2)].symbol()).collect();
        assert!(row.contains(strings::FAILURE_MESSAGE));
        assert_eq!(late[(0, 0)].bg, Color::Rgb(255, 59, 48));
    }

    #[test]
    fn test_alert_shows_title_body_and_action() {
        let alert = Alert::result("HELLO");
        let area = Rect::new(0, 0, 60, 12);
        let mut buf = Buffer::empty(area);
        AlertWidget { alert: &alert }.render(area, &mut buf);

        let all: String = (0..area.height)
            .flat_map(|y| (0..area.width).map(move |x| (x, y)))
            .map(|pos| buf[pos].symbol().to_string())
            .collect();
        assert!(all.contains("Found a data matrix"));
        assert!(all.contains("HELLO"));
        assert!(all.contains("[ Close ]"));
    }

    #[test]
    fn test_alert_fits_a_narrow_terminal() {
        let alert = Alert::result("HELLO");
        let area = Rect::new(0, 0, 20, 6);
        let mut buf = Buffer::empty(area);
        AlertWidget { alert: &alert }.render(area, &mut buf);

        let all: String = (0..area.height)
            .flat_map(|y| (0..area.width).map(move |x| (x, y)))
            .map(|pos| buf[pos].symbol().to_string())
            .collect();
        assert!(all.contains("HELLO"));
        // One column of margin on each side
        assert_eq!(buf[(0, 2)].symbol(), " ");
        assert_eq!(buf[(1, 0)].symbol(), "┌");
    }

    #[test]
    fn test_alert_skips_an_empty_area() {
        let alert = Alert::result("HELLO");
        let mut buf = Buffer::empty(Rect::new(0, 0, 1, 1));
        AlertWidget { alert: &alert }.render(Rect::new(0, 0, 0, 0), &mut buf);
        assert_eq!(buf[(0, 0)].symbol(), " ");
    }

    #[test]
    fn test_preview_is_centred_within_its_bounds() {
        let screen = Rect::new(0, 0, 80, 23);
        assert_eq!(fit_within(screen, (40, 11)), Rect::new(20, 6, 40, 11));
        assert_eq!(fit_within(screen, (80, 23)), screen);
        // Stale bounds larger than the screen are clipped
        assert_eq!(fit_within(screen, (200, 60)), screen);
    }

    #[test]
    fn test_preview_frame_stays_inside_its_bounds() {
        let frame = solid_frame((10, 20, 30));
        let screen = Rect::new(0, 0, 20, 10);
        let area = fit_within(screen, (8, 4));
        let mut buf = Buffer::empty(screen);
        PreviewWidget {
            frame: Some(&frame),
            mirrored: false,
            placeholder: strings::WAITING_FOR_CAMERA,
        }
        .render(area, &mut buf);

        assert_eq!(buf[(10, 5)].symbol(), "▀");
        assert_eq!(buf[(0, 0)].symbol(), " ");
        assert_eq!(buf[(19, 9)].symbol(), " ");
    }
}
