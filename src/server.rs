//! Unix socket server for receiving overlay commands
//!
//! Listens on `ipc::socket_path()` for newline-delimited JSON `IpcMessage`s.
//! Commands are forwarded to the owner thread and the reply is written back
//! on the same connection. A `subscribe` message turns the connection into an
//! event stream.

use crate::error::OverlayError;
use crate::ipc::{IpcMessage, IpcResponse};
use crate::overlay::{Outcome, OverlayEvent, RawCommand};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, trace, warn};

/// Bounded queue depth between the server and the owner thread
pub const COMMAND_QUEUE: usize = 64;

/// Longest accepted request line in bytes, excluding the newline
pub const MAX_LINE: usize = 64 * 1024;

/// A command on its way to the owner thread, with the reply slot
#[derive(Debug)]
pub struct Envelope {
    pub command: RawCommand,
    pub reply: oneshot::Sender<Result<Outcome, OverlayError>>,
}

/// Start the Unix socket server.
///
/// Removes any stale socket file, binds to the path, and accepts connections
/// until the process exits.
pub async fn start(
    path: &Path,
    commands: mpsc::Sender<Envelope>,
    events: broadcast::Sender<OverlayEvent>,
) {
    // Remove stale socket if it exists
    if path.exists()
        && let Err(e) = std::fs::remove_file(path)
    {
        warn!("Failed to remove stale socket {}: {}", path.display(), e);
        return;
    }

    let listener = match UnixListener::bind(path) {
        Ok(l) => l,
        Err(e) => {
            warn!("Failed to bind Unix socket {}: {}", path.display(), e);
            return;
        }
    };

    info!("IPC server listening on {}", path.display());
    serve(listener, commands, events).await;
}

/// Accept loop on an already bound listener.
pub async fn serve(
    listener: UnixListener,
    commands: mpsc::Sender<Envelope>,
    events: broadcast::Sender<OverlayEvent>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let commands = commands.clone();
                let events = events.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, commands, events).await {
                        debug!("connection closed: {}", e);
                    }
                });
            }
            Err(e) => {
                warn!("Failed to accept socket connection: {}", e);
            }
        }
    }
}

async fn handle_connection(
    stream: UnixStream,
    commands: mpsc::Sender<Envelope>,
    events: broadcast::Sender<OverlayEvent>,
) -> std::io::Result<()> {
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let n = (&mut reader)
            .take(MAX_LINE as u64 + 1)
            .read_until(b'\n', &mut buf)
            .await?;
        if n == 0 {
            break;
        }
        if buf.last() != Some(&b'\n') && n > MAX_LINE {
            warn!("IPC request exceeds {} bytes, closing connection", MAX_LINE);
            let message = format!("request longer than {MAX_LINE} bytes");
            return send(&mut write, &IpcResponse::error("message_too_long", message)).await;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let message = match serde_json::from_str::<IpcMessage>(line) {
            Ok(message) => message,
            Err(e) => {
                trace!("Failed to parse IPC message: {} (line: {})", e, line);
                let response = IpcResponse::error("invalid_message", e.to_string());
                send(&mut write, &response).await?;
                continue;
            }
        };

        match message {
            IpcMessage::Ping => send(&mut write, &IpcResponse::Pong).await?,
            IpcMessage::Command(command) => {
                debug!(action = %command.action, "ipc command");
                let response = forward(&commands, command).await;
                send(&mut write, &response).await?;
            }
            IpcMessage::Subscribe => {
                debug!("ipc subscriber attached");
                return stream_events(&mut write, events.subscribe()).await;
            }
        }
    }
    Ok(())
}

/// Hand one command to the owner thread and wait for its reply.
async fn forward(commands: &mpsc::Sender<Envelope>, command: RawCommand) -> IpcResponse {
    let (reply, reply_rx) = oneshot::channel();
    if commands.send(Envelope { command, reply }).await.is_err() {
        return IpcResponse::error("shutting_down", "overlay owner is gone");
    }
    match reply_rx.await {
        Ok(result) => result.into(),
        Err(_) => IpcResponse::error("shutting_down", "overlay owner dropped the command"),
    }
}

async fn stream_events<W>(
    write: &mut W,
    mut rx: broadcast::Receiver<OverlayEvent>,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    loop {
        match rx.recv().await {
            Ok(event) => send(write, &IpcResponse::Event(event)).await?,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("event subscriber lagged, skipped {}", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => return Ok(()),
        }
    }
}

async fn send<W>(write: &mut W, response: &IpcResponse) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_string(response).map_err(std::io::Error::other)?;
    line.push('\n');
    write.write_all(line.as_bytes()).await
}
