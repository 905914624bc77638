//! Telemetry packet decoding.
//!
//! The decoder follows a layered structure:
//! - `layout`: field order, wire types and packet sizes (source of truth)
//! - `reader`: bounds-checked little-endian reads
//! - `parser`: walks a layout and builds a [`Packet`]
//! - `record`: the decoded packet and its JSON form
//! - `error`: the single `MalformedPacket` error kind
//!
//! Decoding is pure: no I/O, no shared state. Layout tables are `const`, so
//! packets may be decoded from any number of threads at once.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;
pub mod record;

pub use error::MalformedPacket;
pub use layout::{FieldDescriptor, FieldKind, Layout, UnknownLayout};
pub use parser::decode_packet;
pub use record::{Packet, PacketIter, Value};
