//! Runs one operation end to end.
//!
//! ```text
//! open file -> encode (size checks) -> connect -> send frames [+ payload]
//!           -> close connection -> close file
//! ```
//!
//! Any failure returns immediately; the connection and the file are owned
//! locals, so both are released on every path, connection first.

use tracing::{debug, info};
use ulti_proto::Action;

use crate::Result;
use crate::conn::{ConnectOptions, Connector, TcpConnector, Transport};
use crate::error::ValidationError;
use crate::file::{FileSource, MappedFiles, Payload};
use crate::request::OperationRequest;

/// Summary of a completed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct Report {
    /// Device action that was sent.
    pub action: Action,
    /// Number of command frames sent.
    pub frames: usize,
    /// Payload bytes sent after the frame headers.
    pub payload_bytes: u64,
}

/// Executes [`OperationRequest`]s against a device.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher<C = TcpConnector, F = MappedFiles> {
    /// Opens one connection per operation.
    connector: C,
    /// Opens payload files.
    files: F,
}

impl Dispatcher {
    /// Creates a dispatcher using TCP and memory-mapped files.
    pub const fn new(opts: ConnectOptions) -> Self {
        Self::with(TcpConnector::new(opts), MappedFiles)
    }
}

impl<C: Connector, F: FileSource> Dispatcher<C, F> {
    /// Creates a dispatcher from explicit connection and file sources.
    pub const fn with(connector: C, files: F) -> Self {
        Self { connector, files }
    }

    /// Runs `req` to completion.
    ///
    /// Size limits are checked before connecting, so an oversized file never
    /// results in a partial send. A failure while sending aborts the
    /// remaining frames.
    pub fn run(&self, req: &OperationRequest) -> Result<Report> {
        let action = req.operation().action();

        let file = req
            .operation()
            .file()
            .map(|path| self.files.open(path))
            .transpose()?;
        let size = file.as_ref().map(Payload::size);

        let frames = ulti_proto::encode(action, size).map_err(ValidationError::from)?;
        let payload = file.as_ref().map_or(&[][..], Payload::bytes);

        let mut conn = self.connector.connect(req.host())?;
        for frame in &frames {
            debug!(opcode = ?frame.opcode(), header = ?frame.header(), "sending frame");
            conn.send(frame.header())?;
            if frame.carries_payload() {
                conn.send(payload)?;
            }
        }
        drop(conn);
        drop(file);

        let report = Report {
            action,
            frames: frames.len(),
            payload_bytes: size.unwrap_or(0),
        };
        info!(host = req.host(), %action, frames = report.frames, bytes = report.payload_bytes, "done");
        Ok(report)
    }
}
