//! Overlay window controller - the Absent/Active lifecycle of the one surface
//!
//! Owns settings, signal state and the drag controller, and is the only code
//! that calls into a `Windowing` backend. Any backend failure while Active
//! detaches the surface and returns to Absent.

use super::drag::{DragController, DragMove, PointerPosition, TapOutcome};
use super::geometry::{
    Geometry, LayoutSpec, ScreenMetrics, clamp_origin, compute_layout, place, to_fraction,
};
use super::render::render;
use super::surface::{SurfaceError, SurfaceFrame, SurfaceId, Windowing};
use crate::error::OverlayError;
use crate::settings::{OverlaySettings, SignalState};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The live surface and where it currently sits
#[derive(Debug)]
pub struct ActiveSurface<H> {
    pub id: SurfaceId,
    pub handle: H,
    pub geometry: Geometry,
    pub layout: LayoutSpec,
}

/// What a pointer-up produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerRelease {
    pub tap: TapOutcome,
    /// Final normalized and absolute position if the drag moved the surface
    pub moved: Option<DragMove>,
}

#[derive(Debug)]
pub struct OverlayController<H> {
    surface: Option<ActiveSurface<H>>,
    settings: OverlaySettings,
    signal: SignalState,
    /// Position most recently sent by the external controller
    requested_position: (f64, f64),
    /// Set when a drag moved the surface after the last explicit request
    user_moved: bool,
    drag: DragController,
    next_id: u64,
}

impl<H> Default for OverlayController<H> {
    fn default() -> Self {
        Self::new(super::drag::DEFAULT_DOUBLE_TAP)
    }
}

impl<H> OverlayController<H> {
    pub fn new(double_tap: Duration) -> Self {
        let settings = OverlaySettings::default();
        Self {
            surface: None,
            settings,
            signal: SignalState::default(),
            requested_position: (settings.position_x, settings.position_y),
            user_moved: false,
            drag: DragController::new(double_tap),
            next_id: 1,
        }
    }

    pub fn is_active(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface(&self) -> Option<&ActiveSurface<H>> {
        self.surface.as_ref()
    }

    pub fn surface_id(&self) -> Option<SurfaceId> {
        self.surface.as_ref().map(|s| s.id)
    }

    pub fn geometry(&self) -> Option<Geometry> {
        self.surface.as_ref().map(|s| s.geometry)
    }

    pub fn settings(&self) -> &OverlaySettings {
        &self.settings
    }

    pub fn signal(&self) -> &SignalState {
        &self.signal
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Absent -> Active.
    pub fn create<W>(
        &mut self,
        ws: &mut W,
        settings: OverlaySettings,
        signal: SignalState,
    ) -> Result<SurfaceId, OverlayError>
    where
        W: Windowing<Handle = H>,
    {
        if let Some(surface) = &self.surface {
            debug!("create ignored, {} is live", surface.id);
            return Err(OverlayError::AlreadyActive);
        }
        if !ws.may_draw_overlay() {
            warn!("overlay permission not granted");
            return Err(SurfaceError::PermissionDenied.into());
        }

        let settings = settings.clamped();
        let screen = ws.screen();
        let layout = layout_for(&settings, &screen)?;
        let geometry = place(settings.position_x, settings.position_y, &layout, &screen);
        let frame = SurfaceFrame {
            geometry,
            layout,
            transparency: settings.transparency,
            visual: render(&signal),
        };

        let handle = ws.attach(&frame).map_err(|e| {
            warn!("attach failed: {e}");
            OverlayError::from(e)
        })?;

        let id = SurfaceId(self.next_id);
        self.next_id += 1;
        self.surface = Some(ActiveSurface {
            id,
            handle,
            geometry,
            layout,
        });
        self.settings = settings;
        self.signal = signal;
        self.requested_position = (settings.position_x, settings.position_y);
        self.user_moved = false;

        info!(
            "created {id} at ({}, {}) size {}x{}",
            geometry.x, geometry.y, geometry.width, geometry.height
        );
        Ok(id)
    }

    /// Re-render only. Geometry is untouched.
    pub fn update_state<W>(&mut self, ws: &mut W, signal: SignalState) -> Result<(), OverlayError>
    where
        W: Windowing<Handle = H>,
    {
        let surface = self.surface.as_mut().ok_or(OverlayError::NotActive)?;
        let visual = render(&signal);
        if let Err(e) = ws.render(&mut surface.handle, &visual) {
            return Err(self.lose(ws, e));
        }
        self.signal = signal;
        debug!(
            "state {} {}s",
            signal.color.as_str(),
            signal.countdown_seconds
        );
        Ok(())
    }

    /// Resize and re-place.
    ///
    /// A re-sent position after a drag keeps the dragged origin, clamped to the
    /// new size. Any other position is an explicit move to that fraction.
    pub fn update_settings<W>(
        &mut self,
        ws: &mut W,
        settings: OverlaySettings,
    ) -> Result<(), OverlayError>
    where
        W: Windowing<Handle = H>,
    {
        let Some(surface) = self.surface.as_ref() else {
            return Err(OverlayError::NotActive);
        };
        let mut settings = settings.clamped();
        let screen = ws.screen();
        let layout = layout_for(&settings, &screen)?;

        let requested = (settings.position_x, settings.position_y);
        let keep_origin = self.user_moved && requested == self.requested_position;
        let geometry = if keep_origin {
            let (x, y) = clamp_origin(surface.geometry.x, surface.geometry.y, &layout, &screen);
            settings.position_x = to_fraction(x, screen.width, layout.widget_width);
            settings.position_y = to_fraction(y, screen.height, layout.widget_height);
            Geometry {
                x,
                y,
                width: layout.widget_width,
                height: layout.widget_height,
            }
        } else {
            place(settings.position_x, settings.position_y, &layout, &screen)
        };

        self.reshape(ws, geometry, layout)?;
        self.apply_transparency(ws, settings.transparency)?;

        self.settings = settings;
        if !keep_origin {
            self.requested_position = requested;
            self.user_moved = false;
        }
        debug!(
            "settings applied, size {:.2} at ({}, {}){}",
            settings.size_fraction,
            geometry.x,
            geometry.y,
            if keep_origin { " (kept dragged origin)" } else { "" }
        );
        Ok(())
    }

    /// Move to a normalized position. Size is unchanged.
    pub fn update_position<W>(
        &mut self,
        ws: &mut W,
        position_x: f64,
        position_y: f64,
    ) -> Result<(), OverlayError>
    where
        W: Windowing<Handle = H>,
    {
        if self.surface.is_none() {
            return Err(OverlayError::NotActive);
        }
        let requested = OverlaySettings {
            position_x,
            position_y,
            ..self.settings
        }
        .clamped();
        let screen = ws.screen();
        // Re-derive in case the screen changed since the last geometry pass
        let layout = layout_for(&self.settings, &screen)?;
        let geometry = place(requested.position_x, requested.position_y, &layout, &screen);

        self.reshape(ws, geometry, layout)?;
        self.settings.position_x = requested.position_x;
        self.settings.position_y = requested.position_y;
        self.requested_position = (requested.position_x, requested.position_y);
        self.user_moved = false;
        debug!("moved to ({}, {})", geometry.x, geometry.y);
        Ok(())
    }

    /// Active -> Absent. Returns false when already Absent.
    pub fn stop<W>(&mut self, ws: &mut W) -> bool
    where
        W: Windowing<Handle = H>,
    {
        self.drag.cancel();
        match self.surface.take() {
            Some(surface) => {
                ws.detach(surface.handle);
                info!("stopped {}", surface.id);
                true
            }
            None => false,
        }
    }

    /// Open a drag session at the surface's current origin.
    ///
    /// Ignored while Absent.
    pub fn pointer_down(&mut self, pointer: PointerPosition, now: Instant) -> bool {
        let Some(surface) = &self.surface else {
            return false;
        };
        self.drag
            .pointer_down(pointer, (surface.geometry.x, surface.geometry.y), now);
        true
    }

    /// Follow the pointer, clamped to the screen.
    pub fn pointer_move<W>(
        &mut self,
        ws: &mut W,
        pointer: PointerPosition,
    ) -> Result<Option<DragMove>, OverlayError>
    where
        W: Windowing<Handle = H>,
    {
        let Some(surface) = &self.surface else {
            return Ok(None);
        };
        let screen = ws.screen();
        let size = (surface.geometry.width, surface.geometry.height);
        let layout = surface.layout;
        let Some(mv) = self.drag.pointer_move(pointer, size, &screen) else {
            return Ok(None);
        };

        if (mv.x, mv.y) != (surface.geometry.x, surface.geometry.y) {
            let geometry = Geometry {
                x: mv.x,
                y: mv.y,
                ..surface.geometry
            };
            self.reshape(ws, geometry, layout)?;
            self.user_moved = true;
        }
        self.settings.position_x = mv.position_x;
        self.settings.position_y = mv.position_y;
        Ok(Some(mv))
    }

    /// Close the drag session. A double-tap asks the host to come forward.
    pub fn pointer_up<W>(&mut self, ws: &mut W) -> PointerRelease
    where
        W: Windowing<Handle = H>,
    {
        let moved = match (self.drag.session(), &self.surface) {
            (Some(session), Some(surface))
                if (session.start_window_x, session.start_window_y)
                    != (surface.geometry.x, surface.geometry.y) =>
            {
                Some(DragMove {
                    x: surface.geometry.x,
                    y: surface.geometry.y,
                    position_x: self.settings.position_x,
                    position_y: self.settings.position_y,
                })
            }
            _ => None,
        };

        let tap = self.drag.pointer_up();
        if tap == TapOutcome::DoubleTap && self.surface.is_some() {
            info!("double tap, bringing host forward");
            ws.bring_host_to_foreground();
        }
        PointerRelease { tap, moved }
    }

    fn reshape<W>(
        &mut self,
        ws: &mut W,
        geometry: Geometry,
        layout: LayoutSpec,
    ) -> Result<(), OverlayError>
    where
        W: Windowing<Handle = H>,
    {
        let surface = self.surface.as_mut().ok_or(OverlayError::NotActive)?;
        if surface.geometry == geometry && surface.layout == layout {
            return Ok(());
        }
        if let Err(e) = ws.reshape(&mut surface.handle, geometry, &layout) {
            return Err(self.lose(ws, e));
        }
        surface.geometry = geometry;
        surface.layout = layout;
        Ok(())
    }

    fn apply_transparency<W>(&mut self, ws: &mut W, alpha: f64) -> Result<(), OverlayError>
    where
        W: Windowing<Handle = H>,
    {
        let surface = self.surface.as_mut().ok_or(OverlayError::NotActive)?;
        if let Err(e) = ws.set_transparency(&mut surface.handle, alpha) {
            return Err(self.lose(ws, e));
        }
        Ok(())
    }

    /// Detach after a backend failure and fall back to Absent.
    fn lose<W>(&mut self, ws: &mut W, err: SurfaceError) -> OverlayError
    where
        W: Windowing<Handle = H>,
    {
        self.drag.cancel();
        if let Some(surface) = self.surface.take() {
            warn!("{} lost: {err}", surface.id);
            ws.detach(surface.handle);
        }
        err.into()
    }
}

fn layout_for(
    settings: &OverlaySettings,
    screen: &ScreenMetrics,
) -> Result<LayoutSpec, OverlayError> {
    compute_layout(
        settings.size_fraction,
        screen.width,
        screen.height,
        screen.density,
    )
}
