use std::io::{self, BufRead, BufReader, ErrorKind};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::device::CommandSink;
use crate::dispatch::{self, DispatchError};

pub const DEFAULT_PORT: u16 = 666;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    PeerClosed,
    IdleTimeout,
}

/// Accept one client at a time and feed its lines to the dispatcher. A
/// closed or idle session sends the relay back to accepting; only listener
/// failures escape.
pub fn run(listener: TcpListener, idle_timeout: Duration, sink: &mut dyn CommandSink) -> Result<()> {
    eprintln!("[relay] listening on {}", listener.local_addr()?);
    loop {
        let (stream, peer) = listener.accept().context("accepting relay client")?;
        eprintln!("[relay] client connected: {peer}");
        match serve_session(stream, idle_timeout, sink) {
            Ok(SessionEnd::PeerClosed) => eprintln!("[relay] {peer} disconnected"),
            Ok(SessionEnd::IdleTimeout) => {
                eprintln!("[relay] {peer} idle for {idle_timeout:?}, dropping session")
            }
            Err(e) => eprintln!("[relay] session with {peer} failed: {e}"),
        }
    }
}

/// Serve one connected client until it closes or goes idle. Malformed lines
/// and per-command transport failures are logged and the session continues.
pub fn serve_session(
    stream: TcpStream,
    idle_timeout: Duration,
    sink: &mut dyn CommandSink,
) -> io::Result<SessionEnd> {
    stream.set_read_timeout(Some(idle_timeout))?;
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => return Ok(SessionEnd::PeerClosed),
            Ok(_) => dispatch_line(line.trim_end(), sink),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                return Ok(SessionEnd::IdleTimeout);
            }
            Err(e) => return Err(e),
        }
    }
}

fn dispatch_line(line: &str, sink: &mut dyn CommandSink) {
    let command = match dispatch::parse_line(line) {
        Ok(c) => c,
        Err(DispatchError::Empty) => return,
        Err(e) => {
            eprintln!("[relay] rejected {line:?}: {e}");
            return;
        }
    };
    if let Err(e) = sink.send(&command) {
        eprintln!("[relay] send failed for {line:?}: {e}");
    }
}
