//! Blocking network core.
//!
//! Three pieces, independent of each other:
//! - `listener`: bound, listening socket construction with a reuse policy
//! - `acceptor`: bounded draining of pending connections from a
//!   non-blocking listener
//! - `transport`: one complete framed message per call over a blocking
//!   socket, with retry-on-interrupt semantics
//!
//! Plus the socket configuration helpers callers use around them.

mod acceptor;
mod listener;
mod transport;

pub use acceptor::accept_pending;
pub use listener::{bind_listener, ListenError, ReuseMode};
pub use transport::{recv_msg, send_msg};

use socket2::SockRef;
use std::os::fd::AsFd;
use std::time::Duration;

/// Put a socket into non-blocking mode.
///
/// OS failure here means a broken precondition (a bad or closed descriptor),
/// not a transient runtime condition, and aborts the process.
pub fn set_nonblocking<S: AsFd>(sock: &S) {
    if let Err(e) = SockRef::from(sock).set_nonblocking(true) {
        panic!("set_nonblocking failed: {e}");
    }
}

/// Set both the receive and send timeout on a socket.
///
/// A zero timeout clears any previously configured bound. Like
/// [`set_nonblocking`], OS failure is treated as unrecoverable
/// misconfiguration and aborts the process.
pub fn set_rw_timeout<S: AsFd>(sock: &S, secs: u64, usecs: u32) {
    let timeout = Duration::new(secs, usecs.saturating_mul(1_000));
    let timeout = if timeout.is_zero() { None } else { Some(timeout) };
    let sock = SockRef::from(sock);
    if let Err(e) = sock.set_read_timeout(timeout) {
        panic!("set_read_timeout failed: {e}");
    }
    if let Err(e) = sock.set_write_timeout(timeout) {
        panic!("set_write_timeout failed: {e}");
    }
}

/// Number of processing units available, for external worker-pool sizing.
pub fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
