//! TCP connection to the device command port.
//!
//! One [`Connection`] carries one operation. It is shut down in both
//! directions and closed when dropped, whether the operation finished or
//! bailed out halfway through a frame.

use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, warn};
use ulti_proto::COMMAND_PORT;

use crate::error::ConnectionError;

/// A byte sink that delivers frames to the device.
pub trait Transport {
    /// Sends all of `bytes`. Any failure is fatal for the operation.
    fn send(&mut self, bytes: &[u8]) -> Result<(), ConnectionError>;
}

/// Opens a fresh [`Transport`] per operation.
pub trait Connector {
    /// Connection type; released when dropped.
    type Conn: Transport;

    /// Connects to the command port of `host`.
    fn connect(&self, host: &str) -> Result<Self::Conn, ConnectionError>;
}

/// Socket settings for reaching the device.
///
/// Without timeouts every call blocks until the OS gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Command port.
    port: u16,
    /// Per-address connect timeout.
    connect_timeout: Option<Duration>,
    /// Timeout for each write.
    write_timeout: Option<Duration>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectOptions {
    /// Default options: port [`COMMAND_PORT`], no timeouts.
    pub const fn new() -> Self {
        Self {
            port: COMMAND_PORT,
            connect_timeout: None,
            write_timeout: None,
        }
    }

    /// Overrides the command port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Applies `timeout` to both connecting and writing.
    ///
    /// A zero duration is treated as no timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Option<Duration>) -> Self {
        let timeout = match timeout {
            Some(t) if t.is_zero() => None,
            other => other,
        };
        self.connect_timeout = timeout;
        self.write_timeout = timeout;
        self
    }

    /// Configured command port.
    pub const fn command_port(&self) -> u16 {
        self.port
    }
}

/// An open connection to the device.
#[derive(Debug)]
pub struct Connection {
    /// Connected stream.
    stream: TcpStream,
    /// Address that accepted the connection.
    peer: SocketAddr,
}

impl Connection {
    /// Resolves `host` and connects to the first address that accepts.
    ///
    /// Each candidate is tried once, in resolver order.
    pub fn connect(host: &str, opts: &ConnectOptions) -> Result<Self, ConnectionError> {
        let addrs: Vec<SocketAddr> = (host, opts.port)
            .to_socket_addrs()
            .map_err(|source| ConnectionError::ResolutionFailed {
                host: host.to_owned(),
                source,
            })?
            .collect();

        if addrs.is_empty() {
            return Err(ConnectionError::ResolutionFailed {
                host: host.to_owned(),
                source: io::Error::new(io::ErrorKind::NotFound, "no addresses found"),
            });
        }
        debug!(host, port = opts.port, candidates = addrs.len(), "resolved");

        Self::connect_addrs(host, &addrs, opts)
    }

    /// Connects to the first of `addrs` that accepts, trying each once.
    fn connect_addrs(
        host: &str,
        addrs: &[SocketAddr],
        opts: &ConnectOptions,
    ) -> Result<Self, ConnectionError> {
        let mut last_err = None;
        for &addr in addrs {
            let attempt = match opts.connect_timeout {
                Some(t) => TcpStream::connect_timeout(&addr, t),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    stream.set_write_timeout(opts.write_timeout).map_err(|source| {
                        ConnectionError::ConnectFailed {
                            host: host.to_owned(),
                            source,
                        }
                    })?;
                    debug!(%addr, "connected");
                    return Ok(Self { stream, peer: addr });
                }
                Err(e) => {
                    warn!(%addr, error = %e, "connect failed");
                    last_err = Some(e);
                }
            }
        }

        Err(ConnectionError::ConnectFailed {
            host: host.to_owned(),
            source: last_err
                .unwrap_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "no address tried")),
        })
    }

    /// Address of the device end.
    const fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl Transport for Connection {
    fn send(&mut self, bytes: &[u8]) -> Result<(), ConnectionError> {
        self.stream
            .write_all(bytes)
            .and_then(|()| self.stream.flush())
            .map_err(ConnectionError::SendFailed)
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // The peer may already have gone away; the descriptor is closed
        // regardless when `stream` drops.
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            debug!(peer = %self.peer_addr(), error = %e, "shutdown failed");
        }
        debug!(peer = %self.peer_addr(), "closed connection");
    }
}

/// [`Connector`] that opens real TCP connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector {
    /// Socket settings applied to every connection.
    opts: ConnectOptions,
}

impl TcpConnector {
    /// Creates a connector with the given options.
    pub const fn new(opts: ConnectOptions) -> Self {
        Self { opts }
    }
}

impl Connector for TcpConnector {
    type Conn = Connection;

    fn connect(&self, host: &str) -> Result<Connection, ConnectionError> {
        Connection::connect(host, &self.opts)
    }
}
