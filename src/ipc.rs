//! IPC message protocol between clients and the daemon
//!
//! Newline-delimited JSON over a Unix socket, one message per line.

use crate::error::OverlayError;
use crate::overlay::{Outcome, OverlayEvent, RawCommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Socket name for IPC communication
pub const SOCKET_NAME: &str = "stoplight.sock";

/// Get the socket path for IPC communication
///
/// Uses XDG_RUNTIME_DIR if available, falls back to the temp dir
pub fn socket_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir());
    runtime_dir.join(SOCKET_NAME)
}

/// Message from client to daemon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "msg", rename_all = "snake_case")]
pub enum IpcMessage {
    /// Overlay command for the owner thread
    Command(RawCommand),
    /// Ping to check if daemon is alive
    Ping,
    /// Switch this connection to the event stream
    Subscribe,
}

/// Response from daemon to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "msg", rename_all = "snake_case")]
pub enum IpcResponse {
    Ok { outcome: Outcome },
    Pong,
    Error { code: String, message: String },
    /// Pushed to subscribed connections
    Event(OverlayEvent),
}

impl IpcResponse {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<Result<Outcome, OverlayError>> for IpcResponse {
    fn from(result: Result<Outcome, OverlayError>) -> Self {
        match result {
            Ok(outcome) => Self::Ok { outcome },
            Err(e) => Self::error(e.code(), e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::CommandParams;

    #[test]
    fn socket_path_ends_with_socket_name() {
        let path = socket_path();
        assert!(path.ends_with(SOCKET_NAME));
    }

    #[test]
    fn command_message_is_flat() {
        let json = concat!(
            r#"{"msg":"command","action":"create","#,
            r#""params":{"sizeFraction":0.5,"color":"green"}}"#
        );
        let parsed: IpcMessage = serde_json::from_str(json).unwrap();
        match parsed {
            IpcMessage::Command(raw) => {
                assert_eq!(raw.action, "create");
                assert_eq!(raw.params.size_fraction, Some(0.5));
                assert_eq!(raw.params.color.as_deref(), Some("green"));
            }
            other => panic!("Expected Command, got {other:?}"),
        }
    }

    #[test]
    fn command_without_params() {
        let parsed: IpcMessage =
            serde_json::from_str(r#"{"msg":"command","action":"stop"}"#).unwrap();
        assert_eq!(
            parsed,
            IpcMessage::Command(RawCommand::new("stop", CommandParams::default()))
        );
    }

    #[test]
    fn ping_and_subscribe_serialization() {
        assert_eq!(serde_json::to_string(&IpcMessage::Ping).unwrap(), r#"{"msg":"ping"}"#);
        let parsed: IpcMessage = serde_json::from_str(r#"{"msg":"subscribe"}"#).unwrap();
        assert_eq!(parsed, IpcMessage::Subscribe);
    }

    #[test]
    fn ok_response_carries_outcome() {
        let resp = IpcResponse::from(Ok(Outcome::Dropped));
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"msg":"ok","outcome":"dropped"}"#);
    }

    #[test]
    fn error_response_carries_code() {
        let resp = IpcResponse::from(Err(OverlayError::AlreadyActive));
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains(r#""msg":"error""#));
        assert!(json.contains(r#""code":"already_active""#));

        let parsed: IpcResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, resp);
    }

    #[test]
    fn event_response_round_trip() {
        let resp = IpcResponse::Event(OverlayEvent::Stopped);
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"msg":"event","event":"stopped"}"#);
        let parsed: IpcResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, resp);
    }
}
