//! PCAP/PCAPNG capture reading.
//!
//! Yields raw link-layer frames with their capture timestamp and linktype.
//! UDP extraction happens one layer up in `frame`.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::PcapFileSource;
