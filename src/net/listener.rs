//! Listening socket construction.
//!
//! One-time setup: socket creation, reuse-option configuration, bind, and
//! listen are each a distinct failure stage. Any failure is logged and
//! returned immediately; callers treat it as a fatal configuration error,
//! so there is no retry logic here.

use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{AddrParseError, Ipv4Addr, SocketAddr, SocketAddrV4, TcpListener};
use tracing::error;

/// Accept queue depth for newly created listeners.
const BACKLOG: i32 = 1024;

/// Address-reuse policy applied before binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReuseMode {
    /// `SO_REUSEADDR`: allow rebinding while a previous socket lingers in
    /// TIME_WAIT.
    Address,
    /// `SO_REUSEPORT`: allow multiple live listeners on the same address for
    /// kernel-side load balancing.
    Port,
}

/// Failure stage of listener construction.
///
/// Each syscall stage carries its OS error so callers and tests can tell
/// exactly where setup broke down.
#[derive(Debug)]
pub enum ListenError {
    /// The IPv4 address string did not parse.
    Addr(AddrParseError),
    /// `socket()` failed.
    Create(io::Error),
    /// `setsockopt()` for the reuse option failed.
    ConfigureReuse(io::Error),
    /// `bind()` failed.
    Bind(io::Error),
    /// `listen()` failed.
    Listen(io::Error),
}

impl ListenError {
    /// The underlying OS error, if this stage made a syscall.
    pub fn os_error(&self) -> Option<&io::Error> {
        match self {
            ListenError::Addr(_) => None,
            ListenError::Create(e)
            | ListenError::ConfigureReuse(e)
            | ListenError::Bind(e)
            | ListenError::Listen(e) => Some(e),
        }
    }
}

impl std::fmt::Display for ListenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenError::Addr(e) => write!(f, "invalid listen address: {e}"),
            ListenError::Create(e) => write!(f, "socket creation failed: {e}"),
            ListenError::ConfigureReuse(e) => write!(f, "reuse option failed: {e}"),
            ListenError::Bind(e) => write!(f, "bind failed: {e}"),
            ListenError::Listen(e) => write!(f, "listen failed: {e}"),
        }
    }
}

impl std::error::Error for ListenError {}

/// Create a TCP listener bound to `ip:port` with the given reuse policy.
///
/// The listener comes back in blocking mode and with backlog [`BACKLOG`];
/// callers feeding it to [`accept_pending`](super::accept_pending) must set
/// it non-blocking first. Ownership of the socket transfers to the caller.
pub fn bind_listener(ip: &str, port: u16, reuse: ReuseMode) -> Result<TcpListener, ListenError> {
    let ip: Ipv4Addr = ip.parse().map_err(|e| {
        error!(ip, "invalid listen address");
        ListenError::Addr(e)
    })?;
    let addr = SocketAddr::V4(SocketAddrV4::new(ip, port));

    let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP)).map_err(|e| {
        error!(error = %e, "socket creation failed");
        ListenError::Create(e)
    })?;

    let configured = match reuse {
        ReuseMode::Address => socket.set_reuse_address(true),
        ReuseMode::Port => socket.set_reuse_port(true),
    };
    configured.map_err(|e| {
        error!(error = %e, mode = ?reuse, "reuse option failed");
        ListenError::ConfigureReuse(e)
    })?;

    socket.bind(&addr.into()).map_err(|e| {
        error!(error = %e, addr = %addr, "bind failed");
        ListenError::Bind(e)
    })?;

    socket.listen(BACKLOG).map_err(|e| {
        error!(error = %e, addr = %addr, "listen failed");
        ListenError::Listen(e)
    })?;

    Ok(socket.into())
}
