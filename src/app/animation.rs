// SPDX-License-Identifier: GPL-3.0-only

//! Time-based animations
//!
//! Animations are pure functions of a start instant, so the view samples them
//! on each draw and nothing has to be scheduled.

use crate::constants::{animation, colors};
use std::time::{Duration, Instant};

/// A single timeline: waits `delay`, then runs for `duration`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Animation {
    start: Instant,
    delay: Duration,
    duration: Duration,
}

impl Animation {
    pub fn new(start: Instant, delay: Duration, duration: Duration) -> Self {
        Self {
            start,
            delay,
            duration,
        }
    }

    /// Linear progress in 0.0..=1.0
    pub fn progress(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.start);
        let Some(running) = elapsed.checked_sub(self.delay) else {
            return 0.0;
        };
        if self.duration.is_zero() {
            return 1.0;
        }
        (running.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.start) >= self.delay + self.duration
    }
}

/// Smoothstep easing
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn lerp_channel(from: u8, to: u8, t: f32) -> u8 {
    (from as f32 + (to as f32 - from as f32) * t).round() as u8
}

fn lerp_rgb(from: (u8, u8, u8), to: (u8, u8, u8), t: f32) -> (u8, u8, u8) {
    (
        lerp_channel(from.0, to.0, t),
        lerp_channel(from.1, to.1, t),
        lerp_channel(from.2, to.2, t),
    )
}

/// Camera failure indication
///
/// Two independent timelines started together: the background recolour runs
/// immediately, the label fades in after its own delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureOverlay {
    recolor: Animation,
    label: Animation,
}

impl FailureOverlay {
    pub fn start(now: Instant) -> Self {
        Self {
            recolor: Animation::new(now, Duration::ZERO, animation::RECOLOR_DURATION),
            label: Animation::new(now, animation::LABEL_DELAY, animation::LABEL_DURATION),
        }
    }

    pub fn background(&self, now: Instant) -> (u8, u8, u8) {
        lerp_rgb(
            colors::BACKGROUND,
            colors::FAILURE_BACKGROUND,
            ease_in_out(self.recolor.progress(now)),
        )
    }

    pub fn label_opacity(&self, now: Instant) -> f32 {
        ease_in_out(self.label.progress(now))
    }

    pub fn label_visible(&self, now: Instant) -> bool {
        self.label_opacity(now) > 0.0
    }

    /// Label colour blended over the current background
    pub fn label_color(&self, now: Instant) -> (u8, u8, u8) {
        lerp_rgb(
            self.background(now),
            colors::FAILURE_LABEL,
            self.label_opacity(now),
        )
    }

    pub fn recolor_finished(&self, now: Instant) -> bool {
        self.recolor.is_finished(now)
    }

    /// Both timelines done; the view can stop redrawing for it
    pub fn is_settled(&self, now: Instant) -> bool {
        self.recolor.is_finished(now) && self.label.is_finished(now)
    }
}
