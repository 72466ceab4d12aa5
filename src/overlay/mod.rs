//! Overlay window lifecycle and geometry engine
//!
//! - geometry.rs: size fraction and screen metrics to pixel layout
//! - drag.rs: pointer gestures to clamped moves, double-tap detection
//! - render.rs: signal state to visual descriptor
//! - surface.rs: `Windowing` backend trait
//! - controller.rs: Absent/Active surface lifecycle
//! - command.rs: wire commands, defaults and clamping
//! - dispatcher.rs: command routing, drop-while-absent, outward events

pub mod command;
pub mod controller;
pub mod dispatcher;
pub mod drag;
pub mod geometry;
pub mod render;
pub mod surface;

pub use command::{Command, CommandParams, RawCommand};
pub use controller::{ActiveSurface, OverlayController, PointerRelease};
pub use dispatcher::{Dispatcher, Outcome, OverlayEvent};
pub use drag::{DragController, DragMove, DragSession, PointerPosition, TapOutcome};
pub use geometry::{Geometry, LayoutSpec, ScreenMetrics, compute_layout, effective_size};
pub use render::{Light, VisualDescriptor, render};
pub use surface::{SurfaceError, SurfaceFrame, SurfaceId, Windowing};
