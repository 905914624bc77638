use super::error::MalformedPacket;
use super::layout::Layout;
use super::reader::PacketReader;
use super::record::Packet;

/// Decode one telemetry datagram using the caller's layout.
///
/// The buffer must be exactly `layout.byte_len()` bytes. The layout is never
/// guessed from the buffer: a sled-sized buffer decoded as `Dash` fails.
///
/// # Errors
/// Returns [`MalformedPacket`] when the length does not match the layout.
/// No partial packet is ever returned.
pub fn decode_packet(payload: &[u8], layout: Layout) -> Result<Packet, MalformedPacket> {
    let mut reader = PacketReader::new(payload);
    reader.require_exact_len(layout)?;

    let mut values = Vec::with_capacity(layout.field_count());
    for field in layout.fields() {
        values.push(reader.read_field(field)?);
    }
    reader.skip_padding(layout)?;
    reader.finish(layout)?;

    Ok(Packet::new(layout, values))
}

#[cfg(test)]
mod tests {
    use super::decode_packet;
    use crate::packet::error::MalformedPacket;
    use crate::packet::layout::{Layout, SLED_LEN};
    use crate::packet::record::Value;

    fn put(buffer: &mut [u8], layout: Layout, name: &str, bytes: &[u8]) {
        let index = layout.position(name).unwrap();
        let offset: usize = layout
            .fields()
            .take(index)
            .map(|field| field.kind.width())
            .sum();
        buffer[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    #[test]
    fn race_flag_and_timestamp_scenario() {
        let mut buffer = vec![0u8; Layout::Dash.byte_len()];
        buffer[0..4].copy_from_slice(&[0x01, 0x00, 0x00, 0x00]);
        buffer[4..8].copy_from_slice(&[0xE8, 0x03, 0x00, 0x00]);

        let packet = decode_packet(&buffer, Layout::Dash).unwrap();
        assert_eq!(packet.layout(), Layout::Dash);
        assert_eq!(packet.get("is_race_on"), Some(Value::I32(1)));
        assert_eq!(packet.get("timestamp_ms"), Some(Value::U32(1000)));
        let rest: Vec<_> = packet.iter().skip(2).collect();
        assert_eq!(rest.len(), Layout::Dash.field_count() - 2);
        for (name, value) in rest {
            assert!(value.is_zero(), "{name} = {value}");
        }
    }

    #[test]
    fn float_one_decodes_exactly() {
        let mut buffer = vec![0u8; Layout::Sled.byte_len()];
        put(&mut buffer, Layout::Sled, "engine_max_rpm", &[0x00, 0x00, 0x80, 0x3F]);
        let packet = decode_packet(&buffer, Layout::Sled).unwrap();
        assert_eq!(packet.get("engine_max_rpm"), Some(Value::F32(1.0)));
    }

    #[test]
    fn all_ones_respects_signedness() {
        let mut buffer = vec![0u8; Layout::Sled.byte_len()];
        put(&mut buffer, Layout::Sled, "is_race_on", &[0xFF; 4]);
        put(&mut buffer, Layout::Sled, "timestamp_ms", &[0xFF; 4]);
        let packet = decode_packet(&buffer, Layout::Sled).unwrap();
        assert_eq!(packet.get("is_race_on"), Some(Value::I32(-1)));
        assert_eq!(packet.get("timestamp_ms"), Some(Value::U32(4_294_967_295)));
    }

    #[test]
    fn dash_tail_types() {
        let mut buffer = vec![0u8; Layout::Dash.byte_len()];
        put(&mut buffer, Layout::Dash, "lap_no", &513u16.to_le_bytes());
        put(&mut buffer, Layout::Dash, "gear", &[0xFF]);
        put(&mut buffer, Layout::Dash, "steer", &[0x81]);
        put(&mut buffer, Layout::Dash, "speed", &42.5f32.to_le_bytes());
        let packet = decode_packet(&buffer, Layout::Dash).unwrap();
        assert_eq!(packet.get("lap_no"), Some(Value::U16(513)));
        assert_eq!(packet.get("gear"), Some(Value::U8(255)));
        assert_eq!(packet.get("steer"), Some(Value::I8(-127)));
        assert_eq!(packet.get("speed"), Some(Value::F32(42.5)));
    }

    #[test]
    fn dash_padding_byte_is_ignored() {
        let mut buffer = vec![0u8; Layout::Dash.byte_len()];
        buffer[311] = 0x7F;
        let packet = decode_packet(&buffer, Layout::Dash).unwrap();
        assert_eq!(packet.len(), 85);
        assert_eq!(packet.keys().last(), Some("norm_ai_brake_diff"));
        assert_eq!(packet, decode_packet(&[0u8; 312], Layout::Dash).unwrap());
        assert!(decode_packet(&[0u8; 311], Layout::Dash).is_err());
    }

    #[test]
    fn layout_is_not_inferred_from_length() {
        let sled = vec![0u8; SLED_LEN];
        let err = decode_packet(&sled, Layout::Dash).unwrap_err();
        assert_eq!(
            err,
            MalformedPacket::LengthMismatch {
                layout: Layout::Dash,
                expected: 312,
                actual: 232,
            }
        );

        let dash = vec![0u8; Layout::Dash.byte_len()];
        assert!(decode_packet(&dash, Layout::Sled).is_err());
    }

    #[test]
    fn empty_and_off_by_one_buffers_fail() {
        for layout in Layout::ALL {
            for len in [0, layout.byte_len() - 1, layout.byte_len() + 1] {
                let buffer = vec![0u8; len];
                let err = decode_packet(&buffer, layout).unwrap_err();
                assert!(err.to_string().contains("malformed packet"));
            }
        }
    }
}
