use std::net::{IpAddr, SocketAddr};

use etherparse::{NetSlice, SlicedPacket, TransportSlice};
use pcap_parser::Linktype;

use super::error::FrameError;
use super::reader::UdpSegmentReader;

/// UDP payload borrowed from a captured frame, with both endpoints.
pub struct UdpDatagram<'a> {
    pub src: SocketAddr,
    pub dst: SocketAddr,
    pub payload: &'a [u8],
}

/// Slice a link-layer frame down to its UDP payload.
///
/// Returns `Ok(None)` for frames that are not UDP over IPv4/IPv6, or whose
/// linktype is neither Ethernet nor raw IP.
pub fn parse_udp_frame(
    linktype: Linktype,
    data: &[u8],
) -> Result<Option<UdpDatagram<'_>>, FrameError> {
    let sliced = match linktype {
        Linktype::ETHERNET => {
            SlicedPacket::from_ethernet(data).map_err(|e| FrameError::Slice(e.to_string()))?
        }
        Linktype::RAW | Linktype::IPV4 | Linktype::IPV6 => {
            SlicedPacket::from_ip(data).map_err(|e| FrameError::Slice(e.to_string()))?
        }
        _ => return Ok(None),
    };

    let net = sliced.net.ok_or(FrameError::MissingNetworkLayer)?;
    let udp = match sliced.transport {
        Some(TransportSlice::Udp(udp)) => udp,
        _ => return Ok(None),
    };

    let (src_ip, dst_ip) = match net {
        NetSlice::Ipv4(ref ipv4) => (
            IpAddr::V4(ipv4.header().source_addr()),
            IpAddr::V4(ipv4.header().destination_addr()),
        ),
        NetSlice::Ipv6(ref ipv6) => (
            IpAddr::V6(ipv6.header().source_addr()),
            IpAddr::V6(ipv6.header().destination_addr()),
        ),
    };

    let ip_payload = net.ip_payload_ref().ok_or(FrameError::MissingIpPayload)?;
    let payload = UdpSegmentReader::new(ip_payload.payload).payload()?;

    Ok(Some(UdpDatagram {
        src: SocketAddr::new(src_ip, udp.source_port()),
        dst: SocketAddr::new(dst_ip, udp.destination_port()),
        payload,
    }))
}

#[cfg(test)]
mod tests {
    use super::parse_udp_frame;
    use crate::source::frame::error::FrameError;
    use etherparse::PacketBuilder;
    use pcap_parser::Linktype;

    #[test]
    fn parses_ethernet_udp() {
        let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
            .ipv4([192, 168, 0, 10], [192, 168, 0, 2], 64)
            .udp(50000, 5300);
        let payload = [9u8; 232];
        let mut frame = Vec::<u8>::with_capacity(builder.size(payload.len()));
        builder.write(&mut frame, &payload).unwrap();

        let parsed = parse_udp_frame(Linktype::ETHERNET, &frame).unwrap().unwrap();
        assert_eq!(parsed.src.to_string(), "192.168.0.10:50000");
        assert_eq!(parsed.dst.port(), 5300);
        assert_eq!(parsed.payload, payload);
    }

    #[test]
    fn parses_raw_ipv6_udp() {
        let builder = PacketBuilder::ipv6([1; 16], [2; 16], 32).udp(1024, 1024);
        let payload = [1u8, 2, 3];
        let mut frame = Vec::<u8>::with_capacity(builder.size(payload.len()));
        builder.write(&mut frame, &payload).unwrap();

        let parsed = parse_udp_frame(Linktype::RAW, &frame).unwrap().unwrap();
        assert!(parsed.src.is_ipv6());
        assert_eq!(parsed.payload, payload);
    }

    #[test]
    fn tcp_is_skipped() {
        let builder = PacketBuilder::ethernet2([1; 6], [2; 6])
            .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
            .tcp(1000, 1001, 0, 0);
        let payload = [0u8; 4];
        let mut frame = Vec::<u8>::with_capacity(builder.size(payload.len()));
        builder.write(&mut frame, &payload).unwrap();

        assert!(parse_udp_frame(Linktype::ETHERNET, &frame).unwrap().is_none());
    }

    #[test]
    fn unsupported_linktype_is_skipped() {
        assert!(parse_udp_frame(Linktype::NULL, &[0u8; 64]).unwrap().is_none());
    }

    #[test]
    fn empty_frame_is_a_slice_error() {
        let result = parse_udp_frame(Linktype::ETHERNET, &[]);
        assert!(matches!(result, Err(FrameError::Slice(_))));
    }
}
