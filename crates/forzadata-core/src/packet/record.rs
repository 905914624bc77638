use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::layout::{FieldDescriptor, Fields, Layout};

/// One decoded field value, in its exact wire type.
///
/// Floats compare by bit pattern, so two decodes of the same bytes are
/// always equal (including NaN payloads).
#[derive(Debug, Clone, Copy)]
pub enum Value {
    I32(i32),
    U32(u32),
    F32(f32),
    U16(u16),
    U8(u8),
    I8(i8),
}

impl Value {
    /// Integer value widened to `i64`; `None` for floats.
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Value::I32(v) => Some(v.into()),
            Value::U32(v) => Some(v.into()),
            Value::U16(v) => Some(v.into()),
            Value::U8(v) => Some(v.into()),
            Value::I8(v) => Some(v.into()),
            Value::F32(_) => None,
        }
    }

    /// Numeric value widened to `f64` (lossless for every variant).
    pub fn as_f64(self) -> f64 {
        match self {
            Value::I32(v) => v.into(),
            Value::U32(v) => v.into(),
            Value::F32(v) => v.into(),
            Value::U16(v) => v.into(),
            Value::U8(v) => v.into(),
            Value::I8(v) => v.into(),
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Value::F32(v) => v == 0.0,
            other => other.as_i64() == Some(0),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I32(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Value::I32(v) => serializer.serialize_i32(v),
            Value::U32(v) => serializer.serialize_u32(v),
            Value::F32(v) => serializer.serialize_f32(v),
            Value::U16(v) => serializer.serialize_u16(v),
            Value::U8(v) => serializer.serialize_u8(v),
            Value::I8(v) => serializer.serialize_i8(v),
        }
    }
}

/// A decoded telemetry packet.
///
/// Holds one value per field of its layout, in layout order. Built only by
/// [`decode_packet`](crate::decode_packet) and never mutated afterwards.
///
/// # Examples
/// ```
/// use forzadata_core::{Layout, decode_packet};
///
/// let mut buffer = vec![0u8; Layout::Sled.byte_len()];
/// buffer[0..4].copy_from_slice(&1i32.to_le_bytes());
/// let packet = decode_packet(&buffer, Layout::Sled)?;
/// assert!(packet.is_race_on());
/// assert_eq!(packet.len(), 58);
/// # Ok::<(), forzadata_core::MalformedPacket>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    layout: Layout,
    values: Vec<Value>,
}

impl Packet {
    pub(crate) fn new(layout: Layout, values: Vec<Value>) -> Self {
        debug_assert_eq!(values.len(), layout.field_count());
        Self { layout, values }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Field names and values in layout order.
    pub fn iter(&self) -> PacketIter<'_> {
        PacketIter {
            fields: self.layout.fields(),
            values: self.values.iter(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.iter().map(|(name, _)| name)
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.layout
            .position(name)
            .and_then(|idx| self.values.get(idx).copied())
    }

    pub fn is_race_on(&self) -> bool {
        matches!(self.values.first(), Some(Value::I32(v)) if *v != 0)
    }

    pub fn timestamp_ms(&self) -> u32 {
        match self.values.get(1) {
            Some(Value::U32(v)) => *v,
            _ => 0,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl<'a> IntoIterator for &'a Packet {
    type Item = (&'static str, Value);
    type IntoIter = PacketIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct PacketIter<'a> {
    fields: Fields,
    values: std::slice::Iter<'a, Value>,
}

impl Iterator for PacketIter<'_> {
    type Item = (&'static str, Value);

    fn next(&mut self) -> Option<Self::Item> {
        let field: &FieldDescriptor = self.fields.next()?;
        let value = self.values.next()?;
        Some((field.name, *value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.values.size_hint()
    }
}

impl ExactSizeIterator for PacketIter<'_> {}

impl Serialize for Packet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}
