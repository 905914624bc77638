//! forzadata core library: decoding of racing-simulator "Data Out"
//! telemetry datagrams.
//!
//! The crate is organised like a small pipeline: datagram sources (live UDP
//! socket or PCAP/PCAPNG replay) feed a session loop, which runs every
//! payload through the packet decoder (layout/reader/parser) and hands the
//! decoded packets to a record sink. Decoding is byte-oriented and free of
//! side effects; all I/O is isolated in `source` and `session`.
//!
//! Invariants:
//! - A packet's keys are exactly its layout's field names, in layout order.
//! - The layout is chosen by the caller and never guessed from a buffer.
//! - Any buffer whose length differs from the layout's is rejected whole.
//!
//! # Examples
//! ```
//! use forzadata_core::{Layout, Value, decode_packet};
//!
//! let mut buffer = vec![0u8; Layout::Dash.byte_len()];
//! buffer[0..4].copy_from_slice(&[0x01, 0x00, 0x00, 0x00]);
//! buffer[4..8].copy_from_slice(&[0xE8, 0x03, 0x00, 0x00]);
//!
//! let packet = decode_packet(&buffer, Layout::Dash)?;
//! assert_eq!(packet.get("timestamp_ms"), Some(Value::U32(1000)));
//! assert!(packet.to_json()?.starts_with(r#"{"is_race_on":1,"timestamp_ms":1000,"#));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod packet;
mod session;
mod source;

pub use packet::{
    FieldDescriptor, FieldKind, Layout, MalformedPacket, Packet, PacketIter, UnknownLayout, Value,
    decode_packet,
};
pub use session::{
    JsonLinesSink, RecordSink, SessionError, SessionOptions, SessionSummary, SinkError,
    decode_capture_file, run_session,
};
pub use source::{
    CaptureSource, Datagram, DatagramSource, MAX_DATAGRAM_LEN, PacketEvent, PacketSource,
    PcapFileSource, SourceError, UdpSource,
};

/// Default UDP port of the receive loop.
pub const DEFAULT_PORT: u16 = 1024;
/// Default bind address of the receive loop.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
