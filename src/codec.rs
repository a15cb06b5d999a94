//! Message framing boundary.
//!
//! The blocking transport is codec-agnostic: anything that can turn a string
//! into a wire packet and reassemble discrete messages from a raw byte stream
//! plugs in through the `Codec` trait. `LengthPrefixCodec` is the reference
//! framing used by the echo server.

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Framing codec consumed by the blocking transport.
///
/// One codec instance per connection: `feed` accumulates raw input across
/// calls, so bytes of a following message that arrive early stay buffered for
/// the next `take_message`.
pub trait Codec {
    /// Encode a message into a complete wire packet.
    fn encode(&self, message: &str) -> Bytes;

    /// Feed raw bytes into the incremental reassembly state.
    fn feed(&mut self, bytes: &[u8]);

    /// Take one fully reassembled message, if framing is complete.
    fn take_message(&mut self) -> Option<String>;
}

/// Length of the payload-length header in bytes.
const HEADER_LEN: usize = 4;

/// Reference framing: a 4-byte big-endian payload length followed by the
/// UTF-8 payload.
#[derive(Debug, Default)]
pub struct LengthPrefixCodec {
    buf: BytesMut,
}

impl LengthPrefixCodec {
    /// Create a codec with empty reassembly state.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Codec for LengthPrefixCodec {
    fn encode(&self, message: &str) -> Bytes {
        let payload = message.as_bytes();
        let mut pkt = BytesMut::with_capacity(HEADER_LEN + payload.len());
        pkt.put_u32(payload.len() as u32);
        pkt.put_slice(payload);
        pkt.freeze()
    }

    fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn take_message(&mut self) -> Option<String> {
        if self.buf.len() < HEADER_LEN {
            return None;
        }
        let len =
            u32::from_be_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]]) as usize;
        if self.buf.len() < HEADER_LEN + len {
            return None;
        }
        self.buf.advance(HEADER_LEN);
        let payload = self.buf.split_to(len);
        Some(String::from_utf8_lossy(&payload).into_owned())
    }
}
