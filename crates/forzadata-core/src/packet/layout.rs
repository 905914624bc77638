use std::fmt;
use std::iter::Chain;
use std::slice::Iter;
use std::str::FromStr;

use serde::Serialize;

/// Primitive wire type of a single packet field.
///
/// Every multi-byte field is little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    I32,
    U32,
    F32,
    U16,
    U8,
    I8,
}

impl FieldKind {
    /// Width of the field on the wire, in bytes.
    pub const fn width(self) -> usize {
        match self {
            FieldKind::I32 | FieldKind::U32 | FieldKind::F32 => 4,
            FieldKind::U16 => 2,
            FieldKind::U8 | FieldKind::I8 => 1,
        }
    }
}

/// Name and wire type of one field, in layout order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

const fn field(name: &'static str, kind: FieldKind) -> FieldDescriptor {
    FieldDescriptor::new(name, kind)
}

use FieldKind::{F32, I8, I32, U8, U16, U32};

/// Fields shared by both layouts ("sled" data).
pub const SLED_FIELDS: &[FieldDescriptor] = &[
    field("is_race_on", I32),
    field("timestamp_ms", U32),
    field("engine_max_rpm", F32),
    field("engine_idle_rpm", F32),
    field("current_engine_rpm", F32),
    field("acceleration_x", F32),
    field("acceleration_y", F32),
    field("acceleration_z", F32),
    field("velocity_x", F32),
    field("velocity_y", F32),
    field("velocity_z", F32),
    field("angular_velocity_x", F32),
    field("angular_velocity_y", F32),
    field("angular_velocity_z", F32),
    field("yaw", F32),
    field("pitch", F32),
    field("roll", F32),
    field("norm_suspension_travel_FL", F32),
    field("norm_suspension_travel_FR", F32),
    field("norm_suspension_travel_RL", F32),
    field("norm_suspension_travel_RR", F32),
    field("tire_slip_ratio_FL", F32),
    field("tire_slip_ratio_FR", F32),
    field("tire_slip_ratio_RL", F32),
    field("tire_slip_ratio_RR", F32),
    field("wheel_rotation_speed_FL", F32),
    field("wheel_rotation_speed_FR", F32),
    field("wheel_rotation_speed_RL", F32),
    field("wheel_rotation_speed_RR", F32),
    field("wheel_on_rumble_strip_FL", F32),
    field("wheel_on_rumble_strip_FR", F32),
    field("wheel_on_rumble_strip_RL", F32),
    field("wheel_on_rumble_strip_RR", F32),
    field("wheel_in_puddle_FL", F32),
    field("wheel_in_puddle_FR", F32),
    field("wheel_in_puddle_RL", F32),
    field("wheel_in_puddle_RR", F32),
    field("surface_rumble_FL", F32),
    field("surface_rumble_FR", F32),
    field("surface_rumble_RL", F32),
    field("surface_rumble_RR", F32),
    field("tire_slip_angle_FL", F32),
    field("tire_slip_angle_FR", F32),
    field("tire_slip_angle_RL", F32),
    field("tire_slip_angle_RR", F32),
    field("tire_combined_slip_FL", F32),
    field("tire_combined_slip_FR", F32),
    field("tire_combined_slip_RL", F32),
    field("tire_combined_slip_RR", F32),
    field("suspension_travel_meters_FL", F32),
    field("suspension_travel_meters_FR", F32),
    field("suspension_travel_meters_RL", F32),
    field("suspension_travel_meters_RR", F32),
    field("car_ordinal", I32),
    field("car_class", I32),
    field("car_performance_index", I32),
    field("drivetrain_type", I32),
    field("num_cylinders", I32),
];

/// Fields appended after the sled data in the "dash" layout.
pub const DASH_EXTENSION_FIELDS: &[FieldDescriptor] = &[
    field("position_x", F32),
    field("position_y", F32),
    field("position_z", F32),
    field("speed", F32),
    field("power", F32),
    field("torque", F32),
    field("tire_temp_FL", F32),
    field("tire_temp_FR", F32),
    field("tire_temp_RL", F32),
    field("tire_temp_RR", F32),
    field("boost", F32),
    field("fuel", F32),
    field("dist_traveled", F32),
    field("best_lap_time", F32),
    field("last_lap_time", F32),
    field("cur_lap_time", F32),
    field("cur_race_time", F32),
    field("lap_no", U16),
    field("race_pos", U8),
    field("accel", U8),
    field("brake", U8),
    field("clutch", U8),
    field("handbrake", U8),
    field("gear", U8),
    field("steer", I8),
    field("norm_driving_line", I8),
    field("norm_ai_brake_diff", I8),
];

/// Unnamed bytes closing a dash packet after its last field.
pub const DASH_PADDING_LEN: usize = 1;

const fn total_len(fields: &[FieldDescriptor]) -> usize {
    let mut len = 0;
    let mut idx = 0;
    while idx < fields.len() {
        len += fields[idx].kind.width();
        idx += 1;
    }
    len
}

pub const SLED_LEN: usize = total_len(SLED_FIELDS);
pub const DASH_LEN: usize = SLED_LEN + total_len(DASH_EXTENSION_FIELDS) + DASH_PADDING_LEN;

const _: () = assert!(SLED_LEN == 232);
const _: () = assert!(DASH_LEN == 312);

/// Ordered field descriptors of a layout.
pub type Fields = Chain<Iter<'static, FieldDescriptor>, Iter<'static, FieldDescriptor>>;

/// Packet layout selected by the caller for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Basic telemetry, 232 bytes.
    Sled,
    /// Sled data followed by dashboard telemetry and one padding byte, 312 bytes.
    Dash,
}

impl Layout {
    pub const ALL: [Layout; 2] = [Layout::Sled, Layout::Dash];

    pub const fn name(self) -> &'static str {
        match self {
            Layout::Sled => "sled",
            Layout::Dash => "dash",
        }
    }

    /// Exact byte length a buffer must have to decode under this layout.
    pub const fn byte_len(self) -> usize {
        match self {
            Layout::Sled => SLED_LEN,
            Layout::Dash => DASH_LEN,
        }
    }

    pub const fn field_count(self) -> usize {
        match self {
            Layout::Sled => SLED_FIELDS.len(),
            Layout::Dash => SLED_FIELDS.len() + DASH_EXTENSION_FIELDS.len(),
        }
    }

    /// Bytes after the last field that carry no value.
    pub const fn padding_len(self) -> usize {
        match self {
            Layout::Sled => 0,
            Layout::Dash => DASH_PADDING_LEN,
        }
    }

    fn extension(self) -> &'static [FieldDescriptor] {
        match self {
            Layout::Sled => &[],
            Layout::Dash => DASH_EXTENSION_FIELDS,
        }
    }

    pub fn fields(self) -> Fields {
        SLED_FIELDS.iter().chain(self.extension().iter())
    }

    pub fn field(self, index: usize) -> Option<&'static FieldDescriptor> {
        match SLED_FIELDS.get(index) {
            Some(field) => Some(field),
            None => self.extension().get(index - SLED_FIELDS.len()),
        }
    }

    pub fn position(self, name: &str) -> Option<usize> {
        self.fields().position(|field| field.name == name)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a layout name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown packet layout '{0}' (expected 'sled' or 'dash')")]
pub struct UnknownLayout(pub String);

impl FromStr for Layout {
    type Err = UnknownLayout;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "sled" => Ok(Layout::Sled),
            "dash" => Ok(Layout::Dash),
            _ => Err(UnknownLayout(value.to_string())),
        }
    }
}
