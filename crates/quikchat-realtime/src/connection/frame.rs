//! Transport-neutral WebSocket frames.

use bytes::Bytes;

/// A frame as seen by the connection pumps.
///
/// The HTTP layer maps its socket messages to and from this type so the
/// pumps can be driven by any stream and sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 text frame carrying a JSON envelope.
    Text(String),
    /// Keep-alive probe.
    Ping(Bytes),
    /// Keep-alive reply.
    Pong(Bytes),
    /// Close handshake.
    Close,
}
