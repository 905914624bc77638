use super::error::MalformedPacket;
use super::layout::{FieldDescriptor, FieldKind, Layout};
use super::record::Value;

/// Sequential little-endian reader over one packet buffer.
pub struct PacketReader<'a> {
    payload: &'a [u8],
    offset: usize,
}

impl<'a> PacketReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.payload.len().saturating_sub(self.offset)
    }

    pub fn require_exact_len(&self, layout: Layout) -> Result<(), MalformedPacket> {
        if self.payload.len() != layout.byte_len() {
            return Err(MalformedPacket::LengthMismatch {
                layout,
                expected: layout.byte_len(),
                actual: self.payload.len(),
            });
        }
        Ok(())
    }

    pub fn read_field(&mut self, field: &FieldDescriptor) -> Result<Value, MalformedPacket> {
        let value = match field.kind {
            FieldKind::I32 => Value::I32(i32::from_le_bytes(self.read_array(field.name)?)),
            FieldKind::U32 => Value::U32(u32::from_le_bytes(self.read_array(field.name)?)),
            FieldKind::F32 => Value::F32(f32::from_le_bytes(self.read_array(field.name)?)),
            FieldKind::U16 => Value::U16(u16::from_le_bytes(self.read_array(field.name)?)),
            FieldKind::U8 => Value::U8(u8::from_le_bytes(self.read_array(field.name)?)),
            FieldKind::I8 => Value::I8(i8::from_le_bytes(self.read_array(field.name)?)),
        };
        Ok(value)
    }

    fn read_array<const N: usize>(
        &mut self,
        field: &'static str,
    ) -> Result<[u8; N], MalformedPacket> {
        let truncated = MalformedPacket::Truncated {
            field,
            offset: self.offset,
            needed: N,
            available: self.remaining(),
        };
        let end = self.offset.checked_add(N).ok_or_else(|| truncated.clone())?;
        let bytes: [u8; N] = self
            .payload
            .get(self.offset..end)
            .and_then(|slice| slice.try_into().ok())
            .ok_or(truncated)?;
        self.offset = end;
        Ok(bytes)
    }

    /// Step over the unnamed bytes that close a layout.
    pub fn skip_padding(&mut self, layout: Layout) -> Result<(), MalformedPacket> {
        let needed = layout.padding_len();
        if self.remaining() < needed {
            return Err(MalformedPacket::Truncated {
                field: "padding",
                offset: self.offset,
                needed,
                available: self.remaining(),
            });
        }
        self.offset += needed;
        Ok(())
    }

    /// Fails unless every byte of the payload has been consumed.
    pub fn finish(&self, layout: Layout) -> Result<(), MalformedPacket> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(MalformedPacket::TrailingBytes { layout, remaining }),
        }
    }
}
