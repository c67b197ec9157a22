// src/ui/button.rs
//! Touch buttons with explicit press-edge detection
//!
//! A [`Button`] is only a touch target: it owns a rectangle and the little
//! bit of state needed to tell a fresh press from a held finger, plus the
//! timestamp that drives the short "pressed" highlight. Drawing the button
//! is up to the application that owns it.
//!
//! # Hit testing
//!
//! [`Button::check_press`] is pure. It answers "is this point on me" and may
//! be called any number of times per tick; a still-held touch keeps returning
//! `true`.
//!
//! # Edge detection
//!
//! [`Button::poll`] compares the current hit state with the one from the
//! previous poll:
//!
//! | previous | now  | edge                  |
//! |----------|------|-----------------------|
//! | miss     | hit  | [`PressEdge::Pressed`]  |
//! | hit      | hit  | [`PressEdge::Held`]     |
//! | hit      | miss | [`PressEdge::Released`] |
//! | miss     | miss | [`PressEdge::Idle`]     |
//!
//! Only `Pressed` records a press timestamp. The timestamp is dropped again
//! once its highlight window has passed, so a wrapped tick counter can never
//! bring an old press back.

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::config::PRESS_FEEDBACK_MS;
use crate::scheduler::Tick;
use crate::touch::{RawTouch, TouchCalibration, TouchPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressEdge {
    Idle,
    Pressed,
    Held,
    Released,
}

impl PressEdge {
    pub fn is_press(self) -> bool {
        self == PressEdge::Pressed
    }
}

#[derive(Debug, Clone)]
pub struct Button {
    bounds: Rectangle,
    time_pressed: Option<Tick>,
    feedback_shown: bool,
    was_hit: bool,
}

impl Button {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self::from_rect(Rectangle::new(Point::new(x, y), Size::new(width, height)))
    }

    pub const fn from_rect(bounds: Rectangle) -> Self {
        Self {
            bounds,
            time_pressed: None,
            feedback_shown: false,
            was_hit: false,
        }
    }

    pub fn bounds(&self) -> Rectangle {
        self.bounds
    }

    /// Inclusive on all four edges: `x <= px <= x + w`, `y <= py <= y + h`.
    pub fn contains(&self, point: TouchPoint) -> bool {
        let (top_left, size) = (self.bounds.top_left, self.bounds.size);
        (top_left.x..=top_left.x + size.width as i32).contains(&point.x)
            && (top_left.y..=top_left.y + size.height as i32).contains(&point.y)
    }

    /// Pure hit test. An absent touch never hits.
    pub fn check_press(&self, touch: Option<TouchPoint>) -> bool {
        touch.is_some_and(|point| self.contains(point))
    }

    /// Hit test straight from a raw controller sample.
    pub fn check_raw_press(&self, raw: Option<RawTouch>, calibration: &TouchCalibration) -> bool {
        self.check_press(raw.map(|raw| calibration.map(raw)))
    }

    /// Evaluate the touch against the previous poll and report the edge.
    pub fn poll(&mut self, touch: Option<TouchPoint>, now: Tick) -> PressEdge {
        self.expire_feedback(now);
        let hit = self.check_press(touch);
        let edge = match (self.was_hit, hit) {
            (false, true) => PressEdge::Pressed,
            (true, true) => PressEdge::Held,
            (true, false) => PressEdge::Released,
            (false, false) => PressEdge::Idle,
        };
        self.was_hit = hit;

        if edge == PressEdge::Pressed {
            self.record_press(now);
        }
        edge
    }

    pub fn record_press(&mut self, now: Tick) {
        self.time_pressed = Some(now);
    }

    /// Forget the last press once its highlight window is over.
    pub fn expire_feedback(&mut self, now: Tick) {
        if self
            .time_pressed
            .is_some_and(|pressed| now.has_elapsed(pressed, PRESS_FEEDBACK_MS))
        {
            self.time_pressed = None;
        }
    }

    pub fn time_pressed(&self) -> Option<Tick> {
        self.time_pressed
    }

    /// Whether the press highlight should be visible at `now`.
    pub fn feedback_active(&self, now: Tick) -> bool {
        self.time_pressed
            .is_some_and(|pressed| !now.has_elapsed(pressed, PRESS_FEEDBACK_MS))
    }

    /// Highlight state as it was last drawn.
    pub fn feedback_shown(&self) -> bool {
        self.feedback_shown
    }

    pub fn set_feedback_shown(&mut self, shown: bool) {
        self.feedback_shown = shown;
    }

    /// True when what is on screen no longer matches [`feedback_active`](Self::feedback_active).
    pub fn feedback_stale(&self, now: Tick) -> bool {
        self.feedback_shown != self.feedback_active(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(x: i32, y: i32) -> Option<TouchPoint> {
        Some(Point::new(x, y))
    }

    #[test]
    fn test_hit_test_inclusive_on_all_edges() {
        let button = Button::new(170, 40, 40, 40);
        for (x, y) in [(170, 40), (210, 40), (170, 80), (210, 80), (190, 60)] {
            assert!(button.check_press(touch(x, y)), "({x}, {y}) should hit");
        }
        for (x, y) in [(169, 60), (211, 60), (190, 39), (190, 81)] {
            assert!(!button.check_press(touch(x, y)), "({x}, {y}) should miss");
        }
        assert!(!button.check_press(None));
    }

    #[test]
    fn test_hit_test_translation_invariant() {
        let base = Button::new(0, 0, 70, 25);
        for (dx, dy) in [(5, 5), (100, 37), (250, 200)] {
            let moved = Button::new(dx, dy, 70, 25);
            for (x, y) in [(0, 0), (70, 25), (71, 10), (35, 26), (-1, 3)] {
                assert_eq!(
                    base.check_press(touch(x, y)),
                    moved.check_press(touch(x + dx, y + dy))
                );
            }
        }
    }

    #[test]
    fn test_check_press_is_idempotent_while_held() {
        let button = Button::new(225, 45, 70, 20);
        for _ in 0..5 {
            assert!(button.check_press(touch(230, 50)));
        }
        assert_eq!(button.time_pressed(), None);
    }

    #[test]
    fn test_raw_press_maps_through_calibration() {
        let calibration = TouchCalibration::CYD;
        let menu = Button::new(0, 0, 70, 25);
        // Calibration minimum lands on (1, 1)
        assert!(menu.check_raw_press(Some(RawTouch::new(200, 240, 1000)), &calibration));
        assert!(!menu.check_raw_press(Some(RawTouch::new(3700, 3800, 1000)), &calibration));
        assert!(!menu.check_raw_press(None, &calibration));

        let tile = Button::new(170, 90, 40, 40);
        let raw = calibration.unmap(Point::new(190, 110));
        assert!(tile.check_raw_press(Some(raw), &calibration));
    }

    #[test]
    fn test_poll_edges() {
        let mut button = Button::new(0, 0, 70, 25);
        assert_eq!(button.poll(None, Tick(0)), PressEdge::Idle);
        assert_eq!(button.poll(touch(10, 10), Tick(10)), PressEdge::Pressed);
        assert_eq!(button.poll(touch(12, 10), Tick(20)), PressEdge::Held);
        // Sliding off the button counts as a release
        assert_eq!(button.poll(touch(200, 10), Tick(30)), PressEdge::Released);
        assert_eq!(button.poll(None, Tick(40)), PressEdge::Idle);
        assert_eq!(button.time_pressed(), Some(Tick(10)));

        assert_eq!(button.poll(touch(1, 1), Tick(50)), PressEdge::Pressed);
        assert_eq!(button.time_pressed(), Some(Tick(50)));
    }

    #[test]
    fn test_feedback_window() {
        let mut button = Button::new(0, 0, 70, 25);
        assert!(!button.feedback_active(Tick(0)));

        button.poll(touch(5, 5), Tick(1_000));
        assert!(button.feedback_active(Tick(1_000)));
        assert!(button.feedback_active(Tick(1_099)));
        assert!(!button.feedback_active(Tick(1_100)));

        assert!(button.feedback_stale(Tick(1_000)));
        button.set_feedback_shown(true);
        assert!(!button.feedback_stale(Tick(1_050)));
        assert!(button.feedback_stale(Tick(1_100)));
        button.set_feedback_shown(false);
        assert!(!button.feedback_stale(Tick(1_200)));
    }

    #[test]
    fn test_expired_press_stays_off_after_counter_wraps() {
        let mut button = Button::new(0, 0, 70, 25);
        button.poll(touch(5, 5), Tick(1_000));
        button.poll(None, Tick(1_010));

        button.expire_feedback(Tick(1_050));
        assert_eq!(button.time_pressed(), Some(Tick(1_000)));
        button.poll(None, Tick(1_100));
        assert_eq!(button.time_pressed(), None);

        // One full counter period after the press
        let wrapped = Tick(1_000).add_millis(u32::MAX).add_millis(1);
        assert_eq!(wrapped, Tick(1_000));
        for now in [wrapped, wrapped.add_millis(50), wrapped.add_millis(99)] {
            assert!(!button.feedback_active(now), "highlighted again at {:?}", now);
            assert!(!button.feedback_stale(now));
        }
    }
}
