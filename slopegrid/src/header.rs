use crate::{SlopeGridError, HEADER_LEN, SCALED_UNIT_LIMIT};
use byteorder::{ByteOrder, LE};

/// Fixed layout metadata at the start of every grid blob.
///
/// All fields are little-endian:
///
/// | offset | field     | type  |
/// |--------|-----------|-------|
/// | 0..7   | reserved  |       |
/// | 7      | `unit`    | `u8`  |
/// | 8..16  | `start_y` | `i64` |
/// | 16..24 | `start_x` | `i64` |
/// | 24..28 | `unit_y`  | `i32` |
/// | 28..32 | `unit_x`  | `i32` |
/// | 32..34 | `rows`    | `u16` |
/// | 34..36 | `cols`    | `u16` |
///
/// Samples follow at byte 36.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridHeader {
    /// Resolution class of the stored samples.
    pub unit: u8,
    /// Fixed point longitude of the grid origin.
    pub start_y: i64,
    /// Fixed point latitude of the grid origin.
    pub start_x: i64,
    /// Fixed point cell height, along longitude.
    pub unit_y: i32,
    /// Fixed point cell width, along latitude.
    pub unit_x: i32,
    /// Number of rows (longitude steps) per column.
    pub rows: u16,
    /// Number of columns (latitude steps).
    pub cols: u16,
}

impl GridHeader {
    pub fn parse(buf: &[u8]) -> Result<Self, SlopeGridError> {
        if buf.len() < HEADER_LEN {
            return Err(SlopeGridError::MalformedHeader { len: buf.len() });
        }
        Ok(Self {
            unit: buf[7],
            start_y: LE::read_i64(&buf[8..16]),
            start_x: LE::read_i64(&buf[16..24]),
            unit_y: LE::read_i32(&buf[24..28]),
            unit_x: LE::read_i32(&buf[28..32]),
            rows: LE::read_u16(&buf[32..34]),
            cols: LE::read_u16(&buf[34..36]),
        })
    }

    /// Returns the regional preset matching this header's cell size.
    pub fn variant(&self) -> Option<Variant> {
        Variant::from_cell_size(self.unit_x, self.unit_y)
    }

    /// Returns `true` if samples are stored multiplied by 100.
    pub fn is_scaled(&self) -> bool {
        self.unit < SCALED_UNIT_LIMIT
    }

    /// Number of cells this header claims.
    pub fn len(&self) -> usize {
        usize::from(self.rows) * usize::from(self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Supported regional grid presets.
///
/// Cells are square, so a preset is identified by a single fixed
/// point cell size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
    /// 9259 units (~1/3 arcsecond) per cell.
    A,
    /// 4630 units (~1/6 arcsecond) per cell.
    B,
    /// 4545 units per cell.
    C,
    /// 5000 units per cell.
    D,
}

impl Variant {
    pub const ALL: [Self; 4] = [Self::A, Self::B, Self::C, Self::D];

    pub const fn cell_size(self) -> i32 {
        match self {
            Self::A => 9259,
            Self::B => 4630,
            Self::C => 4545,
            Self::D => 5000,
        }
    }

    pub fn from_cell_size(unit_x: i32, unit_y: i32) -> Option<Self> {
        if unit_x != unit_y {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|variant| variant.cell_size() == unit_x)
    }
}
