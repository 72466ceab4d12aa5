//! Overlay UI - gpui backend for the traffic-light surface
//!
//! Architecture:
//! - `Engine` entity owns the dispatcher and runs on the gpui main thread,
//!   which is the owner thread for every surface mutation
//! - Commands arrive from the IPC server over an mpsc channel and are applied
//!   one at a time by a task spawned on the engine
//! - `TrafficLightView` keeps its own snapshot of what to draw and never
//!   reads the engine while rendering
//! - traffic_light.rs: element tree for the widget
//! - windowing.rs: `Windowing` implementation over gpui windows

pub(crate) mod traffic_light;
mod windowing;

pub use windowing::{GpuiHandle, GpuiWindowing};

use crate::config::Config;
use crate::error::OverlayError;
use crate::overlay::{
    Dispatcher, LayoutSpec, Outcome, PointerPosition, RawCommand, VisualDescriptor,
};
use crate::server::Envelope;
use gpui::{
    App, AppContext, Application, Context, InteractiveElement, IntoElement, Menu, MenuItem,
    ParentElement, Render, StatefulInteractiveElement, Styled, WeakEntity, Window, actions, div,
};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info};

actions!(stoplight, [Quit]);

/// Owner of the dispatcher on the gpui main thread
pub struct Engine {
    dispatcher: Dispatcher<GpuiHandle>,
    config: Config,
}

impl Engine {
    fn with_windowing<R>(
        &mut self,
        cx: &mut Context<Self>,
        f: impl FnOnce(&mut Dispatcher<GpuiHandle>, &mut GpuiWindowing<'_>) -> R,
    ) -> R {
        let engine = cx.weak_entity();
        let Self { dispatcher, config } = self;
        let mut ws = GpuiWindowing::new(cx, engine, config);
        f(dispatcher, &mut ws)
    }

    fn dispatch(
        &mut self,
        command: &RawCommand,
        cx: &mut Context<Self>,
    ) -> Result<Outcome, OverlayError> {
        self.with_windowing(cx, |dispatcher, ws| dispatcher.dispatch(ws, command))
    }

    fn pointer_down(&mut self, pointer: PointerPosition) {
        self.dispatcher.pointer_down(pointer, Instant::now());
    }

    /// Report where the user's drag ended, then release.
    fn pointer_release(&mut self, pointer: PointerPosition, cx: &mut Context<Self>) {
        self.with_windowing(cx, |dispatcher, ws| {
            dispatcher.pointer_move(ws, pointer);
            dispatcher.pointer_up(ws);
        });
    }

    fn shutdown(&mut self, cx: &mut Context<Self>) {
        self.with_windowing(cx, |dispatcher, ws| dispatcher.shutdown(ws));
    }

    /// Apply envelopes from the IPC server in arrival order.
    fn listen(&mut self, mut commands: mpsc::Receiver<Envelope>, cx: &mut Context<Self>) {
        cx.spawn(async move |this, cx| {
            while let Some(envelope) = commands.recv().await {
                let Ok(result) =
                    this.update(cx, |engine, cx| engine.dispatch(&envelope.command, cx))
                else {
                    break;
                };
                // Client may have hung up
                let _ = envelope.reply.send(result);
            }
            debug!("command channel closed");
        })
        .detach();
    }
}

/// The overlay window's view
pub struct TrafficLightView {
    engine: WeakEntity<Engine>,
    visual: VisualDescriptor,
    layout: LayoutSpec,
    alpha: f32,
}

impl TrafficLightView {
    fn new(
        engine: WeakEntity<Engine>,
        visual: VisualDescriptor,
        layout: LayoutSpec,
        alpha: f32,
    ) -> Self {
        Self {
            engine,
            visual,
            layout,
            alpha,
        }
    }

    /// Same content for a reopened window
    fn relocated(&self, layout: LayoutSpec) -> Self {
        Self {
            engine: self.engine.clone(),
            visual: self.visual.clone(),
            layout,
            alpha: self.alpha,
        }
    }
}

/// Window origin as a pointer position relative to the primary display.
///
/// The OS moves the window during a drag, so the window origin stands in for
/// the pointer: its delta is exactly the drag delta.
fn origin_as_pointer(window: &Window, app: &App) -> PointerPosition {
    let (x, y) = windowing::relative_origin(window.bounds().origin, windowing::display_origin(app));
    PointerPosition::new(x as f64, y as f64)
}

impl Render for TrafficLightView {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        div()
            .id("traffic-light")
            .size_full()
            .cursor(gpui::CursorStyle::OpenHand)
            .on_mouse_down(
                gpui::MouseButton::Left,
                cx.listener(|this, _event: &gpui::MouseDownEvent, window, cx| {
                    let pointer = origin_as_pointer(window, cx);
                    let engine = this.engine.clone();
                    // Engine may be mid-update; apply after this event
                    cx.defer(move |app| {
                        let _ = engine.update(app, |engine, _cx| engine.pointer_down(pointer));
                    });
                    window.start_window_move();
                }),
            )
            .on_click(cx.listener(|this, _event: &gpui::ClickEvent, window, cx| {
                let pointer = origin_as_pointer(window, cx);
                let engine = this.engine.clone();
                cx.defer(move |app| {
                    let _ = engine.update(app, |engine, cx| engine.pointer_release(pointer, cx));
                });
            }))
            .child(traffic_light::render(&self.visual, &self.layout, self.alpha))
    }
}

/// Run the overlay on the gpui main thread until quit.
pub fn run_overlay(
    config: Config,
    dispatcher: Dispatcher<GpuiHandle>,
    commands: mpsc::Receiver<Envelope>,
) {
    Application::new().run(move |app: &mut App| {
        let engine = app.new(|_cx| Engine { dispatcher, config });

        let engine_for_quit = engine.clone();
        app.on_action(move |_: &Quit, cx: &mut App| {
            engine_for_quit.update(cx, |engine, cx| engine.shutdown(cx));
            cx.quit();
        });
        app.set_menus(vec![Menu {
            name: "Stoplight".into(),
            items: vec![MenuItem::action("Quit", Quit)],
        }]);

        engine.update(app, |engine, cx| engine.listen(commands, cx));
        info!("overlay engine ready");
    });
}
