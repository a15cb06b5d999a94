//! Bounded draining of pending connections.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use tracing::error;

/// Accept up to `max_conn` pending connections from `listener`, invoking
/// `on_accept` once per connection with the stream and peer address.
/// Returns the number of connections accepted this pass.
///
/// "Nothing pending" (`WouldBlock`) and `Interrupted` end the pass silently;
/// any other accept error is logged and ends the pass without propagating,
/// so the caller's scheduling loop can simply retry on its next round.
///
/// The listener must already be non-blocking; a blocking listener will stall
/// the calling thread inside `accept`. Bounding the per-pass count keeps one
/// drain from monopolizing the caller's loop under an accept burst.
pub fn accept_pending<F>(listener: &TcpListener, max_conn: usize, mut on_accept: F) -> usize
where
    F: FnMut(TcpStream, SocketAddr),
{
    let mut accepted = 0;
    while accepted < max_conn {
        match listener.accept() {
            Ok((stream, peer)) => {
                on_accept(stream, peer);
                accepted += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => break,
            Err(e) => {
                error!(error = %e, "accept failed");
                break;
            }
        }
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn nonblocking_listener() -> TcpListener {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        listener
    }

    #[test]
    fn test_no_pending_connections() {
        let listener = nonblocking_listener();

        let mut calls = 0;
        let accepted = accept_pending(&listener, 8, |_stream, _peer| calls += 1);
        assert_eq!(accepted, 0);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_max_conn_zero_accepts_nothing() {
        let listener = nonblocking_listener();
        let addr = listener.local_addr().unwrap();
        let _client = TcpStream::connect(addr).unwrap();
        std::thread::sleep(Duration::from_millis(20));

        let mut calls = 0;
        let accepted = accept_pending(&listener, 0, |_stream, _peer| calls += 1);
        assert_eq!(accepted, 0);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_max_conn_bounds_one_pass() {
        let listener = nonblocking_listener();
        let addr = listener.local_addr().unwrap();

        let _clients: Vec<TcpStream> =
            (0..3).map(|_| TcpStream::connect(addr).unwrap()).collect();
        // Give the kernel a beat to finish the loopback handshakes
        std::thread::sleep(Duration::from_millis(20));

        let mut calls = 0;
        let accepted = accept_pending(&listener, 2, |_stream, _peer| calls += 1);
        assert_eq!(accepted, 2);
        assert_eq!(calls, 2);

        // Remaining connection drains on the next pass
        let accepted = accept_pending(&listener, 2, |_stream, _peer| calls += 1);
        assert_eq!(accepted, 1);
        assert_eq!(calls, 3);
    }
}
