//! Framed message exchange over blocking sockets.
//!
//! One complete message per call in both directions: `send_msg` never
//! reports success on a partially written packet, and `recv_msg` never
//! surfaces a partial message. Interruption by a signal is retried
//! transparently; every other I/O failure is logged and fails the call.
//!
//! Both functions are generic over `io::Write`/`io::Read` so the retry and
//! accumulation loops can be driven by in-memory stubs in tests; in the
//! server they run against `TcpStream`s, optionally bounded by a socket
//! timeout set via [`set_rw_timeout`](super::set_rw_timeout).

use crate::codec::Codec;
use std::io::{self, Read, Write};
use tracing::error;

/// Read chunk size for the receive loop.
const READ_CHUNK: usize = 4 * 1024;

/// Encode `message` via `codec` and write the full packet to `conn`.
///
/// Partial writes accumulate until the packet is exhausted. Returns `Ok`
/// if and only if every byte of the encoded packet was written; there is no
/// partial-success return and no resumable state.
pub fn send_msg<W, C>(conn: &mut W, codec: &C, message: &str) -> io::Result<()>
where
    W: Write,
    C: Codec,
{
    let pkt = codec.encode(message);
    let mut sent = 0;
    while sent < pkt.len() {
        match conn.write(&pkt[sent..]) {
            Ok(0) => {
                let e = io::Error::new(io::ErrorKind::WriteZero, "write returned zero");
                error!(error = %e, sent, total = pkt.len(), "send failed");
                return Err(e);
            }
            Ok(n) => sent += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                error!(error = %e, sent, total = pkt.len(), "write failed");
                return Err(e);
            }
        }
    }
    Ok(())
}

/// Read from `conn` until `codec` reassembles one complete message.
///
/// Reads up to 4096 bytes per syscall and feeds everything into the codec's
/// incremental state, so messages larger than one chunk accumulate across
/// reads. A message already buffered in the codec from a previous call is
/// returned without touching the socket. A zero-length read (peer close
/// mid-message) fails the call; partial messages never reach the caller.
pub fn recv_msg<R, C>(conn: &mut R, codec: &mut C) -> io::Result<String>
where
    R: Read,
    C: Codec,
{
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        if let Some(message) = codec.take_message() {
            return Ok(message);
        }
        match conn.read(&mut chunk) {
            Ok(0) => {
                let e = io::Error::new(io::ErrorKind::UnexpectedEof, "peer closed");
                error!(error = %e, "receive failed");
                return Err(e);
            }
            Ok(n) => codec.feed(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                error!(error = %e, "read failed");
                return Err(e);
            }
        }
    }
}
