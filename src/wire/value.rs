//! Field values
//!
//! Per-type zero-value test and encoding for every scalar field type.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::reader::WireReader;
use super::writer::WireWriter;
use crate::error::Result;

/// A scalar that can occupy a message field
pub trait WireValue: Sized {
    /// True when the value equals the type's zero value and is elided
    fn is_default(&self) -> bool;

    fn write_to(&self, w: &mut WireWriter) -> Result<()>;

    fn read_from(r: &mut WireReader<'_>) -> Result<Self>;
}

impl WireValue for i32 {
    fn is_default(&self) -> bool {
        *self == 0
    }

    fn write_to(&self, w: &mut WireWriter) -> Result<()> {
        w.write_i32(*self);
        Ok(())
    }

    fn read_from(r: &mut WireReader<'_>) -> Result<Self> {
        r.read_i32()
    }
}

impl WireValue for i64 {
    fn is_default(&self) -> bool {
        *self == 0
    }

    fn write_to(&self, w: &mut WireWriter) -> Result<()> {
        w.write_i64(*self);
        Ok(())
    }

    fn read_from(r: &mut WireReader<'_>) -> Result<Self> {
        r.read_i64()
    }
}

impl WireValue for f32 {
    /// `-0.0` compares equal to zero and is elided
    fn is_default(&self) -> bool {
        *self == 0.0
    }

    fn write_to(&self, w: &mut WireWriter) -> Result<()> {
        w.write_f32(*self);
        Ok(())
    }

    fn read_from(r: &mut WireReader<'_>) -> Result<Self> {
        r.read_f32()
    }
}

impl WireValue for f64 {
    fn is_default(&self) -> bool {
        *self == 0.0
    }

    fn write_to(&self, w: &mut WireWriter) -> Result<()> {
        w.write_f64(*self);
        Ok(())
    }

    fn read_from(r: &mut WireReader<'_>) -> Result<Self> {
        r.read_f64()
    }
}

impl WireValue for bool {
    fn is_default(&self) -> bool {
        !*self
    }

    fn write_to(&self, w: &mut WireWriter) -> Result<()> {
        w.write_bool(*self);
        Ok(())
    }

    fn read_from(r: &mut WireReader<'_>) -> Result<Self> {
        r.read_bool()
    }
}

impl WireValue for String {
    fn is_default(&self) -> bool {
        self.is_empty()
    }

    fn write_to(&self, w: &mut WireWriter) -> Result<()> {
        w.write_str(Some(self))
    }

    /// A null string decodes as empty
    fn read_from(r: &mut WireReader<'_>) -> Result<Self> {
        Ok(r.read_str()?.unwrap_or_default())
    }
}

// =============================================================================
// Vector3
// =============================================================================

/// Three `f32` components, encoded x, y, z
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl WireValue for Vector3 {
    fn is_default(&self) -> bool {
        *self == Vector3::ZERO
    }

    fn write_to(&self, w: &mut WireWriter) -> Result<()> {
        w.write_f32(self.x);
        w.write_f32(self.y);
        w.write_f32(self.z);
        Ok(())
    }

    fn read_from(r: &mut WireReader<'_>) -> Result<Self> {
        Ok(Vector3 {
            x: r.read_f32()?,
            y: r.read_f32()?,
            z: r.read_f32()?,
        })
    }
}

// =============================================================================
// Timestamp
// =============================================================================

/// Point in time as signed milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    pub millis: i64,
}

impl Timestamp {
    pub const EPOCH: Timestamp = Timestamp { millis: 0 };

    pub const fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Saturates outside the `i64` millisecond range
    pub fn from_system_time(time: SystemTime) -> Self {
        let millis = match time.duration_since(UNIX_EPOCH) {
            Ok(after) => i64::try_from(after.as_millis()).unwrap_or(i64::MAX),
            Err(before) => i64::try_from(before.duration().as_millis())
                .map(|m| -m)
                .unwrap_or(i64::MIN),
        };
        Self { millis }
    }

    pub fn to_system_time(self) -> SystemTime {
        let offset = Duration::from_millis(self.millis.unsigned_abs());
        if self.millis >= 0 {
            UNIX_EPOCH + offset
        } else {
            UNIX_EPOCH - offset
        }
    }
}

impl WireValue for Timestamp {
    fn is_default(&self) -> bool {
        self.millis == 0
    }

    fn write_to(&self, w: &mut WireWriter) -> Result<()> {
        w.write_i64(self.millis);
        Ok(())
    }

    fn read_from(r: &mut WireReader<'_>) -> Result<Self> {
        Ok(Timestamp {
            millis: r.read_i64()?,
        })
    }
}
