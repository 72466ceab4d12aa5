//! Error taxonomy for the overlay engine
//!
//! None of these are fatal to the daemon. Each maps to a stable wire code so
//! clients can react without parsing messages.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OverlayError {
    /// Non-positive screen extents, bad density, or a size fraction outside (0, 1]
    #[error("invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("overlay is already active")]
    AlreadyActive,
    #[error("overlay is not active")]
    NotActive,
    #[error("unsupported command: {0}")]
    UnsupportedCommand(String),
    /// The windowing service refused to add or update the surface
    #[error("surface attach failure: {0}")]
    SurfaceAttachFailure(String),
}

impl OverlayError {
    /// Stable snake_case identifier sent to IPC clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidDimension(_) => "invalid_dimension",
            Self::AlreadyActive => "already_active",
            Self::NotActive => "not_active",
            Self::UnsupportedCommand(_) => "unsupported_command",
            Self::SurfaceAttachFailure(_) => "surface_attach_failure",
        }
    }
}
