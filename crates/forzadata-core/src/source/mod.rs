//! Datagram sources feeding the decoder.
//!
//! A source yields raw UDP payloads, one per call, and knows nothing about
//! packet layouts. Two implementations exist: a live socket bound to the
//! simulator's "Data Out" port, and an offline PCAP/PCAPNG capture replay.

mod capture;
mod frame;
mod pcap;
mod udp_socket;

pub use capture::CaptureSource;
pub use pcap::PcapFileSource;
pub use udp_socket::{MAX_DATAGRAM_LEN, UdpSource};

use std::net::SocketAddr;

use pcap_parser::Linktype;
use thiserror::Error;

/// One received UDP payload.
#[derive(Debug, Clone)]
pub struct Datagram {
    /// Receive or capture time in seconds since the Unix epoch.
    pub ts: Option<f64>,
    pub src: Option<SocketAddr>,
    pub payload: Vec<u8>,
}

/// Producer of raw datagrams. `Ok(None)` means the source is exhausted.
pub trait DatagramSource {
    fn next_datagram(&mut self) -> Result<Option<Datagram>, SourceError>;
}

/// Raw link-layer frame read from a capture file.
#[derive(Debug, Clone)]
pub struct PacketEvent {
    pub ts: Option<f64>,
    pub linktype: Linktype,
    pub data: Vec<u8>,
}

pub trait PacketSource {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PCAP parse error: {0}")]
    Pcap(String),
}

impl From<pcap::error::PcapSourceError> for SourceError {
    fn from(value: pcap::error::PcapSourceError) -> Self {
        match value {
            pcap::error::PcapSourceError::Io(err) => SourceError::Io(err),
            pcap::error::PcapSourceError::Pcap { context, message } => {
                SourceError::Pcap(format!("{context}: {message}"))
            }
        }
    }
}
