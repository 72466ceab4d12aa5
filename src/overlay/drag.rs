//! Drag controller - pointer gestures to clamped window moves and double-taps

use super::geometry::{ScreenMetrics, to_fraction, usable_range};
use std::time::{Duration, Instant};

pub const DEFAULT_DOUBLE_TAP: Duration = Duration::from_millis(300);

/// Pointer location in screen pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub start_window_x: i32,
    pub start_window_y: i32,
    pub start_pointer_x: f64,
    pub start_pointer_y: f64,
    pub pressed_at: Instant,
}

/// Result of a pointer move: new clamped origin and its normalized fraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragMove {
    pub x: i32,
    pub y: i32,
    pub position_x: f64,
    pub position_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// Pointer-up without an open session
    None,
    Tap,
    DoubleTap,
}

#[derive(Debug)]
pub struct DragController {
    session: Option<DragSession>,
    pending_tap: Option<Instant>,
    double_tap: Duration,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new(DEFAULT_DOUBLE_TAP)
    }
}

impl DragController {
    pub fn new(double_tap: Duration) -> Self {
        Self {
            session: None,
            pending_tap: None,
            double_tap,
        }
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Open a session, replacing any stray one left by a lost pointer-up.
    pub fn pointer_down(
        &mut self,
        pointer: PointerPosition,
        window_origin: (i32, i32),
        now: Instant,
    ) {
        self.session = Some(DragSession {
            start_window_x: window_origin.0,
            start_window_y: window_origin.1,
            start_pointer_x: pointer.x,
            start_pointer_y: pointer.y,
            pressed_at: now,
        });
    }

    /// Translate the pointer delta into a clamped window origin.
    pub fn pointer_move(
        &self,
        pointer: PointerPosition,
        widget_size: (i32, i32),
        screen: &ScreenMetrics,
    ) -> Option<DragMove> {
        let session = self.session.as_ref()?;
        let (widget_w, widget_h) = widget_size;

        let dx = (pointer.x - session.start_pointer_x).round() as i32;
        let dy = (pointer.y - session.start_pointer_y).round() as i32;
        let x = session
            .start_window_x
            .saturating_add(dx)
            .clamp(0, usable_range(screen.width, widget_w));
        let y = session
            .start_window_y
            .saturating_add(dy)
            .clamp(0, usable_range(screen.height, widget_h));

        Some(DragMove {
            x,
            y,
            position_x: to_fraction(x, screen.width, widget_w),
            position_y: to_fraction(y, screen.height, widget_h),
        })
    }

    /// Close the session and classify the press.
    ///
    /// Two presses less than the threshold apart form a double-tap. The pair is
    /// consumed so a third quick press starts a new pair.
    pub fn pointer_up(&mut self) -> TapOutcome {
        let Some(session) = self.session.take() else {
            return TapOutcome::None;
        };
        let pressed = session.pressed_at;

        match self.pending_tap.take() {
            Some(previous) if pressed.saturating_duration_since(previous) < self.double_tap => {
                TapOutcome::DoubleTap
            }
            _ => {
                self.pending_tap = Some(pressed);
                TapOutcome::Tap
            }
        }
    }

    /// Drop the session and tap history without emitting anything.
    pub fn cancel(&mut self) {
        self.session = None;
        self.pending_tap = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> ScreenMetrics {
        ScreenMetrics::new(1000, 2000, 1.0)
    }

    fn tap(drag: &mut DragController, at: Instant) -> TapOutcome {
        drag.pointer_down(PointerPosition::new(10.0, 10.0), (0, 0), at);
        drag.pointer_up()
    }

    #[test]
    fn move_without_session_is_ignored() {
        let drag = DragController::default();
        assert!(
            drag.pointer_move(PointerPosition::new(5.0, 5.0), (132, 144), &screen())
                .is_none()
        );
    }

    #[test]
    fn move_applies_delta_from_session_start() {
        let mut drag = DragController::default();
        let t0 = Instant::now();
        drag.pointer_down(PointerPosition::new(500.0, 500.0), (434, 928), t0);
        let mv = drag
            .pointer_move(PointerPosition::new(520.0, 490.0), (132, 144), &screen())
            .unwrap();
        assert_eq!((mv.x, mv.y), (454, 918));
        assert!((mv.position_x - 454.0 / 868.0).abs() < 1e-12);
        assert!((mv.position_y - 918.0 / 1856.0).abs() < 1e-12);
    }

    #[test]
    fn far_pointer_is_clamped_to_screen() {
        let mut drag = DragController::default();
        drag.pointer_down(PointerPosition::new(0.0, 0.0), (434, 928), Instant::now());

        let mv = drag
            .pointer_move(PointerPosition::new(1e7, -1e7), (132, 144), &screen())
            .unwrap();
        assert_eq!((mv.x, mv.y), (868, 0));
        assert_eq!((mv.position_x, mv.position_y), (1.0, 0.0));
    }

    #[test]
    fn degenerate_range_centers_fraction() {
        let mut drag = DragController::default();
        let tiny = ScreenMetrics::new(132, 144, 1.0);
        drag.pointer_down(PointerPosition::new(0.0, 0.0), (0, 0), Instant::now());
        let mv = drag
            .pointer_move(PointerPosition::new(40.0, 40.0), (132, 144), &tiny)
            .unwrap();
        assert_eq!((mv.x, mv.y), (0, 0));
        assert_eq!((mv.position_x, mv.position_y), (0.5, 0.5));
    }

    #[test]
    fn pointer_down_replaces_stray_session() {
        let mut drag = DragController::default();
        let t0 = Instant::now();
        drag.pointer_down(PointerPosition::new(1.0, 1.0), (10, 10), t0);
        drag.pointer_down(PointerPosition::new(2.0, 2.0), (20, 20), t0);
        let session = drag.session().unwrap();
        assert_eq!(session.start_window_x, 20);
        assert_eq!(session.start_pointer_x, 2.0);
    }

    #[test]
    fn up_without_session_is_none() {
        let mut drag = DragController::default();
        assert_eq!(drag.pointer_up(), TapOutcome::None);
    }

    #[test]
    fn quick_pair_fires_once() {
        let mut drag = DragController::default();
        let t0 = Instant::now();
        assert_eq!(tap(&mut drag, t0), TapOutcome::Tap);
        assert_eq!(
            tap(&mut drag, t0 + Duration::from_millis(100)),
            TapOutcome::DoubleTap
        );
    }

    #[test]
    fn gap_equal_to_threshold_is_not_a_double_tap() {
        let mut drag = DragController::default();
        let t0 = Instant::now();
        assert_eq!(tap(&mut drag, t0), TapOutcome::Tap);
        assert_eq!(tap(&mut drag, t0 + DEFAULT_DOUBLE_TAP), TapOutcome::Tap);
    }

    #[test]
    fn triple_tap_fires_once() {
        let mut drag = DragController::default();
        let t0 = Instant::now();
        let outcomes: Vec<_> = [0, 100, 200]
            .iter()
            .map(|ms| tap(&mut drag, t0 + Duration::from_millis(*ms)))
            .collect();
        assert_eq!(
            outcomes,
            vec![TapOutcome::Tap, TapOutcome::DoubleTap, TapOutcome::Tap]
        );
    }

    #[test]
    fn quadruple_tap_fires_twice() {
        let mut drag = DragController::default();
        let t0 = Instant::now();
        let fired = [0, 100, 200, 300]
            .iter()
            .map(|ms| tap(&mut drag, t0 + Duration::from_millis(*ms)))
            .filter(|o| *o == TapOutcome::DoubleTap)
            .count();
        assert_eq!(fired, 2);
    }

    #[test]
    fn slow_taps_never_fire() {
        let mut drag = DragController::default();
        let t0 = Instant::now();
        for i in 0..4 {
            let outcome = tap(&mut drag, t0 + Duration::from_millis(i * 301));
            assert_eq!(outcome, TapOutcome::Tap);
        }
    }

    #[test]
    fn threshold_is_configurable() {
        let mut drag = DragController::new(Duration::from_millis(50));
        let t0 = Instant::now();
        tap(&mut drag, t0);
        assert_eq!(
            tap(&mut drag, t0 + Duration::from_millis(80)),
            TapOutcome::Tap
        );
    }

    #[test]
    fn cancel_forgets_session_and_pending_tap() {
        let mut drag = DragController::default();
        let t0 = Instant::now();
        tap(&mut drag, t0);
        drag.pointer_down(PointerPosition::new(0.0, 0.0), (0, 0), t0);
        drag.cancel();
        assert!(!drag.is_dragging());
        assert_eq!(
            tap(&mut drag, t0 + Duration::from_millis(50)),
            TapOutcome::Tap
        );
    }
}
