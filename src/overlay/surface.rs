//! Windowing service seam
//!
//! The controller is the only caller. Backends own the platform window and
//! hand back an opaque handle; every method runs on the owner thread.

use super::geometry::{Geometry, LayoutSpec, ScreenMetrics};
use super::render::VisualDescriptor;
use crate::error::OverlayError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Controller-issued identity of one surface lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    #[error("overlay permission denied")]
    PermissionDenied,
    #[error("surface no longer exists")]
    Lost,
    #[error("{0}")]
    Backend(String),
}

impl From<SurfaceError> for OverlayError {
    fn from(err: SurfaceError) -> Self {
        OverlayError::SurfaceAttachFailure(err.to_string())
    }
}

/// Initial state handed to `Windowing::attach`.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceFrame {
    pub geometry: Geometry,
    pub layout: LayoutSpec,
    pub transparency: f64,
    pub visual: VisualDescriptor,
}

pub trait Windowing {
    type Handle;

    /// Primary display metrics, read fresh on each call.
    fn screen(&self) -> ScreenMetrics;

    /// Whether the host currently holds the draw-over-other-apps capability.
    fn may_draw_overlay(&self) -> bool {
        true
    }

    fn attach(&mut self, frame: &SurfaceFrame) -> Result<Self::Handle, SurfaceError>;

    fn render(
        &mut self,
        handle: &mut Self::Handle,
        visual: &VisualDescriptor,
    ) -> Result<(), SurfaceError>;

    fn reshape(
        &mut self,
        handle: &mut Self::Handle,
        geometry: Geometry,
        layout: &LayoutSpec,
    ) -> Result<(), SurfaceError>;

    fn set_transparency(&mut self, handle: &mut Self::Handle, alpha: f64)
    -> Result<(), SurfaceError>;

    /// Remove the surface. Never fails; a surface that is already gone is fine.
    fn detach(&mut self, handle: Self::Handle);

    /// Ask the host application to come to the foreground (double-tap).
    fn bring_host_to_foreground(&mut self) {}
}
