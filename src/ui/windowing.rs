//! gpui windowing backend
//!
//! The overlay is a transparent, unfocused popup window. gpui can resize a
//! window but cannot move one programmatically, so a move that does not
//! come from the user's own drag reopens the window at the new origin.
//! Surface identity lives in the controller's `SurfaceId`, not the window.

use super::{Engine, TrafficLightView};
use crate::config::Config;
use crate::overlay::{
    Geometry, LayoutSpec, ScreenMetrics, SurfaceError, SurfaceFrame, VisualDescriptor, Windowing,
};
use gpui::{
    App, AppContext, Bounds, Pixels, Point, WeakEntity, WindowBackgroundAppearance, WindowBounds,
    WindowHandle, WindowKind, WindowOptions, point, px, size,
};
use tracing::{debug, info, warn};

/// Window and the geometry it was last placed at
pub struct GpuiHandle {
    window: WindowHandle<TrafficLightView>,
    geometry: Geometry,
}

/// Per-call view of the gpui app. Built by the engine for each command.
pub struct GpuiWindowing<'a> {
    app: &'a mut App,
    engine: WeakEntity<Engine>,
    config: &'a Config,
}

impl<'a> GpuiWindowing<'a> {
    pub fn new(app: &'a mut App, engine: WeakEntity<Engine>, config: &'a Config) -> Self {
        Self {
            app,
            engine,
            config,
        }
    }

    fn open(
        &mut self,
        view: TrafficLightView,
        geometry: Geometry,
    ) -> Result<GpuiHandle, SurfaceError> {
        let bounds = window_bounds(geometry, display_origin(self.app));
        let window = self
            .app
            .open_window(
                WindowOptions {
                    window_bounds: Some(WindowBounds::Windowed(bounds)),
                    titlebar: None,
                    focus: false,
                    show: true,
                    kind: WindowKind::PopUp,
                    is_movable: true,
                    is_resizable: false,
                    window_background: WindowBackgroundAppearance::Transparent,
                    ..Default::default()
                },
                |_window, app| app.new(|_cx| view),
            )
            .map_err(|e| SurfaceError::Backend(e.to_string()))?;
        Ok(GpuiHandle { window, geometry })
    }

    /// Where the window actually is, relative to the primary display.
    fn current_origin(&mut self, handle: &GpuiHandle) -> Result<(i32, i32), SurfaceError> {
        let display = display_origin(self.app);
        handle
            .window
            .update(self.app, |_view, window, _cx| {
                relative_origin(window.bounds().origin, display)
            })
            .map_err(|_| SurfaceError::Lost)
    }
}

impl Windowing for GpuiWindowing<'_> {
    type Handle = GpuiHandle;

    fn screen(&self) -> ScreenMetrics {
        let density = self.config.density_or(1.0);
        match self.app.primary_display() {
            Some(display) => {
                let extent = display.bounds().size;
                ScreenMetrics::new(
                    f32::from(extent.width) as i32,
                    f32::from(extent.height) as i32,
                    density,
                )
            }
            None => ScreenMetrics::new(
                self.config.screen_width,
                self.config.screen_height,
                density,
            ),
        }
    }

    fn attach(&mut self, frame: &SurfaceFrame) -> Result<GpuiHandle, SurfaceError> {
        let view = TrafficLightView::new(
            self.engine.clone(),
            frame.visual.clone(),
            frame.layout,
            frame.transparency as f32,
        );
        let handle = self.open(view, frame.geometry)?;
        info!("overlay window opened at {:?}", frame.geometry);
        Ok(handle)
    }

    fn render(
        &mut self,
        handle: &mut GpuiHandle,
        visual: &VisualDescriptor,
    ) -> Result<(), SurfaceError> {
        handle
            .window
            .update(self.app, |view, _window, cx| {
                view.visual = visual.clone();
                cx.notify();
            })
            .map_err(|_| SurfaceError::Lost)
    }

    fn reshape(
        &mut self,
        handle: &mut GpuiHandle,
        geometry: Geometry,
        layout: &LayoutSpec,
    ) -> Result<(), SurfaceError> {
        let origin = self.current_origin(handle)?;
        let layout = *layout;

        if origin == (geometry.x, geometry.y) {
            // Already there, either unchanged or moved by the user's drag
            handle
                .window
                .update(self.app, |view, window, cx| {
                    view.layout = layout;
                    window.resize(size(px(geometry.width as f32), px(geometry.height as f32)));
                    cx.notify();
                })
                .map_err(|_| SurfaceError::Lost)?;
            handle.geometry = geometry;
            return Ok(());
        }

        debug!("reopening overlay window at ({}, {})", geometry.x, geometry.y);
        let view = handle
            .window
            .read(self.app)
            .map(|view| view.relocated(layout))
            .map_err(|_| SurfaceError::Lost)?;
        let old = std::mem::replace(handle, self.open(view, geometry)?);
        self.detach(old);
        Ok(())
    }

    fn set_transparency(
        &mut self,
        handle: &mut GpuiHandle,
        alpha: f64,
    ) -> Result<(), SurfaceError> {
        handle
            .window
            .update(self.app, |view, _window, cx| {
                view.alpha = alpha as f32;
                cx.notify();
            })
            .map_err(|_| SurfaceError::Lost)
    }

    fn detach(&mut self, handle: GpuiHandle) {
        let _ = handle.window.update(self.app, |_view, window, _cx| {
            window.remove_window();
        });
        debug!("overlay window removed from {:?}", handle.geometry);
    }

    fn bring_host_to_foreground(&mut self) {
        let Some((program, args)) = self
            .config
            .foreground_command
            .as_deref()
            .and_then(|argv| argv.split_first())
        else {
            self.app.activate(true);
            return;
        };
        match std::process::Command::new(program).args(args).spawn() {
            Ok(_) => info!("foreground command started: {}", program),
            Err(e) => warn!("Failed to run foreground command {}: {}", program, e),
        }
    }
}

/// Top-left of the primary display in global coordinates
pub(crate) fn display_origin(app: &App) -> Point<Pixels> {
    app.primary_display()
        .map(|display| display.bounds().origin)
        .unwrap_or_else(|| point(px(0.0), px(0.0)))
}

/// Convert a display-relative geometry into global window bounds.
pub(crate) fn window_bounds(geometry: Geometry, display: Point<Pixels>) -> Bounds<Pixels> {
    Bounds {
        origin: point(
            display.x + px(geometry.x as f32),
            display.y + px(geometry.y as f32),
        ),
        size: size(px(geometry.width as f32), px(geometry.height as f32)),
    }
}

/// Global window origin to whole pixels relative to the display.
pub(crate) fn relative_origin(origin: Point<Pixels>, display: Point<Pixels>) -> (i32, i32) {
    (
        f32::from(origin.x - display.x).round() as i32,
        f32::from(origin.y - display.y).round() as i32,
    )
}
