use thiserror::Error;

use super::layout::Layout;

/// Reasons a buffer could not be decoded into a packet.
///
/// Every variant means the same thing to callers: no packet was produced
/// for this buffer.
///
/// # Examples
/// ```
/// use forzadata_core::{Layout, MalformedPacket, decode_packet};
///
/// let err = decode_packet(&[0u8; 10], Layout::Sled).unwrap_err();
/// assert!(matches!(err, MalformedPacket::LengthMismatch { expected: 232, .. }));
/// assert!(err.to_string().starts_with("malformed packet"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedPacket {
    #[error("malformed packet: {layout} layout needs exactly {expected} bytes, got {actual}")]
    LengthMismatch {
        layout: Layout,
        expected: usize,
        actual: usize,
    },
    #[error(
        "malformed packet: field `{field}` needs {needed} bytes at offset {offset}, got {available}"
    )]
    Truncated {
        field: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("malformed packet: {remaining} bytes left after the last {layout} field")]
    TrailingBytes { layout: Layout, remaining: usize },
}
