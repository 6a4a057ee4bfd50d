use crate::{C, DEGREES_PER_UNIT, SCALE};

/// A geographic coordinate in fixed point.
///
/// Note the axis naming: `x` carries the _latitude_ and `y` the
/// _longitude_, which is how grid blobs store their origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FixedPoint {
    pub x: i64,
    pub y: i64,
}

impl FixedPoint {
    /// Encodes degrees into fixed point.
    ///
    /// Scaled values are truncated toward zero, never rounded.
    #[allow(clippy::cast_possible_truncation)]
    pub fn encode(lat: C, lng: C) -> Self {
        Self {
            x: (lat * SCALE) as i64,
            y: (lng * SCALE) as i64,
        }
    }

    /// Returns `(lat, lng)` in degrees.
    #[allow(clippy::cast_precision_loss)]
    pub fn to_degrees(self) -> (C, C) {
        (self.x as C * DEGREES_PER_UNIT, self.y as C * DEGREES_PER_UNIT)
    }
}
