//! Stoplight - floating traffic-light overlay engine

pub mod client;
pub mod config;
pub mod error;
pub mod headless;
pub mod ipc;
pub mod overlay;
pub mod server;
pub mod settings;
#[cfg(feature = "gui")]
pub mod ui;

pub use error::OverlayError;
pub use settings::{OverlaySettings, SignalColor, SignalState};
