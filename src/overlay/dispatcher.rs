//! Command dispatcher - routes commands and pointer input to the controller
//!
//! Runs on the owner thread. Update commands that arrive while no surface
//! exists are dropped, not queued. Lifecycle and drag results are published
//! on a broadcast channel for subscribers.

use super::command::{Command, RawCommand};
use super::controller::OverlayController;
use super::drag::{PointerPosition, TapOutcome};
use super::surface::{SurfaceId, Windowing};
use crate::error::OverlayError;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, warn};

const EVENT_CAPACITY: usize = 64;

/// How a successfully handled command was treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Applied,
    /// Arrived while Absent and was discarded
    Dropped,
}

/// Outward notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OverlayEvent {
    Created {
        surface_id: SurfaceId,
    },
    Stopped,
    /// Published once per drag, on release
    PositionChanged {
        position_x: f64,
        position_y: f64,
        x: i32,
        y: i32,
    },
    ForegroundRequested,
    SurfaceLost {
        reason: String,
    },
}

pub struct Dispatcher<H> {
    controller: OverlayController<H>,
    events: broadcast::Sender<OverlayEvent>,
}

impl<H> Default for Dispatcher<H> {
    fn default() -> Self {
        Self::new(super::drag::DEFAULT_DOUBLE_TAP)
    }
}

impl<H> Dispatcher<H> {
    pub fn new(double_tap: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            controller: OverlayController::new(double_tap),
            events,
        }
    }

    pub fn controller(&self) -> &OverlayController<H> {
        &self.controller
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OverlayEvent> {
        self.events.subscribe()
    }

    /// Sender half, for handing to the IPC server
    pub fn event_sender(&self) -> broadcast::Sender<OverlayEvent> {
        self.events.clone()
    }

    pub fn dispatch<W>(&mut self, ws: &mut W, raw: &RawCommand) -> Result<Outcome, OverlayError>
    where
        W: Windowing<Handle = H>,
    {
        let command = Command::parse(raw).inspect_err(|e| warn!("{e}"))?;
        self.apply(ws, command)
    }

    pub fn apply<W>(&mut self, ws: &mut W, command: Command) -> Result<Outcome, OverlayError>
    where
        W: Windowing<Handle = H>,
    {
        let name = command.name();
        let was_active = self.controller.is_active();

        if !was_active && !matches!(command, Command::Create { .. }) {
            debug!("{name} dropped, no surface");
            return Ok(Outcome::Dropped);
        }
        debug!("{name}");

        let result = match command {
            Command::Create { settings, signal } => {
                self.controller.create(ws, settings, signal).map(|surface_id| {
                    self.publish(OverlayEvent::Created { surface_id });
                })
            }
            Command::UpdateState(signal) => self.controller.update_state(ws, signal),
            Command::UpdateSettings(settings) => self.controller.update_settings(ws, settings),
            Command::UpdatePosition {
                position_x,
                position_y,
            } => self.controller.update_position(ws, position_x, position_y),
            Command::Stop => {
                self.controller.stop(ws);
                self.publish(OverlayEvent::Stopped);
                Ok(())
            }
        };

        if let Err(e) = &result {
            warn!("{name} failed: {e}");
            self.note_loss(was_active, e);
        }
        result.map(|()| Outcome::Applied)
    }

    pub fn pointer_down(&mut self, pointer: PointerPosition, now: Instant) {
        if !self.controller.pointer_down(pointer, now) {
            debug!("pointer down ignored, no surface");
        }
    }

    pub fn pointer_move<W>(&mut self, ws: &mut W, pointer: PointerPosition)
    where
        W: Windowing<Handle = H>,
    {
        let was_active = self.controller.is_active();
        if let Err(e) = self.controller.pointer_move(ws, pointer) {
            warn!("drag failed: {e}");
            self.note_loss(was_active, &e);
        }
    }

    pub fn pointer_up<W>(&mut self, ws: &mut W) -> TapOutcome
    where
        W: Windowing<Handle = H>,
    {
        let release = self.controller.pointer_up(ws);
        if let Some(mv) = release.moved {
            self.publish(OverlayEvent::PositionChanged {
                position_x: mv.position_x,
                position_y: mv.position_y,
                x: mv.x,
                y: mv.y,
            });
        }
        if release.tap == TapOutcome::DoubleTap {
            self.publish(OverlayEvent::ForegroundRequested);
        }
        release.tap
    }

    /// Stop the surface on shutdown without publishing.
    pub fn shutdown<W>(&mut self, ws: &mut W)
    where
        W: Windowing<Handle = H>,
    {
        self.controller.stop(ws);
    }

    fn note_loss(&self, was_active: bool, err: &OverlayError) {
        if !was_active || self.controller.is_active() {
            return;
        }
        if let OverlayError::SurfaceAttachFailure(reason) = err {
            self.publish(OverlayEvent::SurfaceLost {
                reason: reason.clone(),
            });
        }
    }

    fn publish(&self, event: OverlayEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessHandle, HeadlessWindowing};
    use crate::overlay::command::CommandParams;
    use crate::overlay::geometry::ScreenMetrics;
    use crate::overlay::surface::SurfaceError;
    use crate::settings::SignalColor;

    fn setup() -> (Dispatcher<HeadlessHandle>, HeadlessWindowing) {
        (
            Dispatcher::default(),
            HeadlessWindowing::new(ScreenMetrics::new(1000, 2000, 1.0)),
        )
    }

    fn cmd(action: &str) -> RawCommand {
        RawCommand::new(action, CommandParams::default())
    }

    fn drain(rx: &mut broadcast::Receiver<OverlayEvent>) -> Vec<OverlayEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    #[test]
    fn updates_before_create_are_dropped() {
        let (mut d, mut ws) = setup();
        for action in ["updateState", "updateSettings", "updatePosition", "stop"] {
            assert_eq!(d.dispatch(&mut ws, &cmd(action)), Ok(Outcome::Dropped));
        }
        assert_eq!(ws.live_surfaces(), 0);
    }

    #[test]
    fn update_state_after_create_applies() {
        let (mut d, mut ws) = setup();
        d.dispatch(&mut ws, &cmd("create")).unwrap();
        let raw = RawCommand::new(
            "updateState",
            CommandParams {
                color: Some("yellow".into()),
                countdown: Some(12),
                ..Default::default()
            },
        );
        assert_eq!(d.dispatch(&mut ws, &raw), Ok(Outcome::Applied));
        assert_eq!(d.controller().signal().color, SignalColor::Yellow);
    }

    #[test]
    fn unsupported_action_keeps_state() {
        let (mut d, mut ws) = setup();
        d.dispatch(&mut ws, &cmd("create")).unwrap();
        assert_eq!(
            d.dispatch(&mut ws, &cmd("explode")),
            Err(OverlayError::UnsupportedCommand("explode".into()))
        );
        assert!(d.controller().is_active());
    }

    #[test]
    fn create_while_active_reports_already_active() {
        let (mut d, mut ws) = setup();
        d.dispatch(&mut ws, &cmd("create")).unwrap();
        assert_eq!(
            d.dispatch(&mut ws, &cmd("create")),
            Err(OverlayError::AlreadyActive)
        );
        assert_eq!(ws.live_surfaces(), 1);
    }

    #[test]
    fn lifecycle_events_are_published() {
        let (mut d, mut ws) = setup();
        let mut rx = d.subscribe();
        d.dispatch(&mut ws, &cmd("create")).unwrap();
        d.dispatch(&mut ws, &cmd("stop")).unwrap();
        d.dispatch(&mut ws, &cmd("stop")).unwrap();

        let events = drain(&mut rx);
        assert!(matches!(events[0], OverlayEvent::Created { .. }));
        assert_eq!(events[1], OverlayEvent::Stopped);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn drag_release_publishes_position() {
        let (mut d, mut ws) = setup();
        d.dispatch(&mut ws, &cmd("create")).unwrap();
        let mut rx = d.subscribe();

        d.pointer_down(PointerPosition::new(0.0, 0.0), Instant::now());
        d.pointer_move(&mut ws, PointerPosition::new(-1000.0, 10.0));
        d.pointer_move(&mut ws, PointerPosition::new(-2000.0, 10.0));
        assert!(drain(&mut rx).is_empty());
        d.pointer_up(&mut ws);

        assert_eq!(
            drain(&mut rx),
            vec![OverlayEvent::PositionChanged {
                position_x: 0.0,
                position_y: 938.0 / 1856.0,
                x: 0,
                y: 938,
            }]
        );
    }

    #[test]
    fn tap_without_move_publishes_nothing() {
        let (mut d, mut ws) = setup();
        d.dispatch(&mut ws, &cmd("create")).unwrap();
        let mut rx = d.subscribe();
        d.pointer_down(PointerPosition::new(3.0, 3.0), Instant::now());
        assert_eq!(d.pointer_up(&mut ws), TapOutcome::Tap);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn double_tap_publishes_foreground_request() {
        let (mut d, mut ws) = setup();
        d.dispatch(&mut ws, &cmd("create")).unwrap();
        let mut rx = d.subscribe();
        let t0 = Instant::now();
        d.pointer_down(PointerPosition::new(3.0, 3.0), t0);
        d.pointer_up(&mut ws);
        d.pointer_down(PointerPosition::new(3.0, 3.0), t0 + Duration::from_millis(90));
        assert_eq!(d.pointer_up(&mut ws), TapOutcome::DoubleTap);
        assert_eq!(drain(&mut rx), vec![OverlayEvent::ForegroundRequested]);
    }

    #[test]
    fn backend_failure_publishes_surface_lost() {
        let (mut d, mut ws) = setup();
        d.dispatch(&mut ws, &cmd("create")).unwrap();
        let mut rx = d.subscribe();
        ws.fail_next(SurfaceError::Lost);

        let result = d.dispatch(&mut ws, &cmd("updateState"));
        assert!(matches!(result, Err(OverlayError::SurfaceAttachFailure(_))));
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [OverlayEvent::SurfaceLost { .. }]
        ));

        // Subsequent updates are dropped until the next create
        assert_eq!(d.dispatch(&mut ws, &cmd("updateState")), Ok(Outcome::Dropped));
    }

    #[test]
    fn event_wire_shape() {
        let json = serde_json::to_string(&OverlayEvent::PositionChanged {
            position_x: 0.25,
            position_y: 1.0,
            x: 10,
            y: 20,
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"event":"position_changed","position_x":0.25,"position_y":1.0,"x":10,"y":20}"#
        );
        let outcome = serde_json::to_string(&Outcome::Dropped).unwrap();
        assert_eq!(outcome, r#""dropped""#);
    }
}
