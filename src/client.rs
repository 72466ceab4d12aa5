//! Blocking client for the daemon socket, used by the CLI subcommands

use crate::ipc::{IpcMessage, IpcResponse};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

/// Upper bound on waiting for a single reply
const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// Send one message and read one reply line.
pub fn request(path: &Path, message: &IpcMessage) -> std::io::Result<IpcResponse> {
    let mut stream = UnixStream::connect(path)?;
    stream.set_read_timeout(Some(REPLY_TIMEOUT))?;
    write_message(&mut stream, message)?;

    let mut line = String::new();
    BufReader::new(stream).read_line(&mut line)?;
    if line.is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "daemon closed the connection",
        ));
    }
    serde_json::from_str(&line).map_err(std::io::Error::other)
}

/// Subscribe and hand every pushed response to `on_event` until the daemon
/// closes the connection or `on_event` returns false.
pub fn watch(path: &Path, mut on_event: impl FnMut(IpcResponse) -> bool) -> std::io::Result<()> {
    let mut stream = UnixStream::connect(path)?;
    write_message(&mut stream, &IpcMessage::Subscribe)?;

    for line in BufReader::new(stream).lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let response = serde_json::from_str(&line).map_err(std::io::Error::other)?;
        if !on_event(response) {
            break;
        }
    }
    Ok(())
}

fn write_message(stream: &mut UnixStream, message: &IpcMessage) -> std::io::Result<()> {
    let json = serde_json::to_string(message).map_err(std::io::Error::other)?;
    writeln!(stream, "{json}")?;
    stream.flush()
}
