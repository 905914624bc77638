use std::path::Path;

use tracing::{debug, trace};

use super::frame::parse_udp_frame;
use super::{Datagram, DatagramSource, PacketEvent, PacketSource, PcapFileSource, SourceError};

/// UDP datagrams replayed from a capture file.
///
/// Frames that are not UDP, do not slice cleanly, or target another port
/// are skipped.
pub struct CaptureSource<S = PcapFileSource> {
    frames: S,
    port: Option<u16>,
}

impl CaptureSource<PcapFileSource> {
    /// Open a `.pcap`/`.pcapng` file, keeping datagrams sent to `port`
    /// (every UDP datagram when `None`).
    pub fn open(path: &Path, port: Option<u16>) -> Result<Self, SourceError> {
        Ok(Self::new(PcapFileSource::open(path)?, port))
    }
}

impl<S: PacketSource> CaptureSource<S> {
    pub fn new(frames: S, port: Option<u16>) -> Self {
        Self { frames, port }
    }
}

impl<S: PacketSource> DatagramSource for CaptureSource<S> {
    fn next_datagram(&mut self) -> Result<Option<Datagram>, SourceError> {
        while let Some(PacketEvent { ts, linktype, data }) = self.frames.next_packet()? {
            let udp = match parse_udp_frame(linktype, &data) {
                Ok(Some(udp)) => udp,
                Ok(None) => {
                    trace!("skipping non-UDP frame");
                    continue;
                }
                Err(err) => {
                    debug!(error = %err, "skipping unparseable frame");
                    continue;
                }
            };
            if self.port.is_some_and(|port| port != udp.dst.port()) {
                trace!(dst = %udp.dst, "skipping datagram for another port");
                continue;
            }
            return Ok(Some(Datagram {
                ts,
                src: Some(udp.src),
                payload: udp.payload.to_vec(),
            }));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use etherparse::PacketBuilder;
    use pcap_parser::Linktype;

    use super::CaptureSource;
    use crate::source::{DatagramSource, PacketEvent, PacketSource, SourceError};

    struct VecSource(VecDeque<PacketEvent>);

    impl PacketSource for VecSource {
        fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError> {
            Ok(self.0.pop_front())
        }
    }

    fn udp_event(ts: f64, dst_port: u16, payload: &[u8]) -> PacketEvent {
        let builder = PacketBuilder::ethernet2([1; 6], [2; 6])
            .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
            .udp(40000, dst_port);
        let mut data = Vec::with_capacity(builder.size(payload.len()));
        builder.write(&mut data, payload).unwrap();
        PacketEvent {
            ts: Some(ts),
            linktype: Linktype::ETHERNET,
            data,
        }
    }

    #[test]
    fn filters_by_destination_port_and_skips_garbage() {
        let events = VecDeque::from(vec![
            udp_event(1.0, 9999, &[1]),
            PacketEvent {
                ts: Some(1.5),
                linktype: Linktype::ETHERNET,
                data: vec![0xFF; 3],
            },
            udp_event(2.0, 5300, &[2, 2]),
        ]);
        let mut source = CaptureSource::new(VecSource(events), Some(5300));

        let datagram = source.next_datagram().unwrap().unwrap();
        assert_eq!(datagram.payload, vec![2, 2]);
        assert_eq!(datagram.ts, Some(2.0));
        assert_eq!(datagram.src.map(|addr| addr.port()), Some(40000));
        assert!(source.next_datagram().unwrap().is_none());
    }

    #[test]
    fn no_port_keeps_every_udp_datagram() {
        let events = VecDeque::from(vec![udp_event(1.0, 1, &[1]), udp_event(2.0, 2, &[2])]);
        let mut source = CaptureSource::new(VecSource(events), None);
        assert!(source.next_datagram().unwrap().is_some());
        assert!(source.next_datagram().unwrap().is_some());
        assert!(source.next_datagram().unwrap().is_none());
    }
}
