use crate::{
    geo::Coord, Grid, GridHeader, GridIndex, Miss, Policy, Raw, Slope, C, HEADER_LEN, NO_DATA,
    WATER_SLOPE,
};
use byteorder::{ByteOrder, LE};

/// A single grid cell.
pub struct Sample<'a> {
    /// The parent [Grid] this cell belongs to.
    pub(crate) grid: &'a Grid<'a>,
    pub(crate) index: GridIndex,
}

#[allow(clippy::must_use_candidate)]
impl<'a> Sample<'a> {
    /// Decoded slope of this cell.
    #[inline]
    pub fn slope(&self) -> Result<Slope, Miss> {
        self.grid.get(self.index)
    }

    /// This cell's (col, row) location in the parent grid.
    #[inline]
    pub fn index(&self) -> GridIndex {
        self.index
    }

    /// Geographic location of this cell's fixed point origin.
    #[inline]
    pub fn geo(&self) -> Coord<C> {
        self.grid.index_to_geo(self.index)
    }
}

impl<'a> std::cmp::PartialEq for Sample<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && std::ptr::eq(self.grid, other.grid)
    }
}

impl<'a> std::cmp::Eq for Sample<'a> {}

/// Column major iterator over a [Grid]'s cells.
pub struct Samples<'a> {
    grid: &'a Grid<'a>,
    next: GridIndex,
}

impl<'a> Samples<'a> {
    pub(crate) fn new(grid: &'a Grid<'a>) -> Self {
        Self {
            grid,
            next: GridIndex::default(),
        }
    }
}

impl<'a> Iterator for Samples<'a> {
    type Item = Sample<'a>;

    fn next(&mut self) -> Option<Sample<'a>> {
        let GridHeader { rows, cols, .. } = *self.grid.header();
        if rows == 0 || self.next.col >= i32::from(cols) {
            return None;
        }
        let index = self.next;
        self.next.row += 1;
        if self.next.row == i32::from(rows) {
            self.next = GridIndex::new(index.col + 1, 0);
        }
        Some(Sample {
            grid: self.grid,
            index,
        })
    }
}

/// Reads the raw sample `pos` bytes past the header and applies the
/// unit class's sentinel and scaling rules.
pub(crate) fn decode_sample(
    header: &GridHeader,
    buf: &[u8],
    pos: i32,
    policy: Policy,
) -> Result<Slope, Miss> {
    #[allow(clippy::cast_sign_loss)]
    let start = HEADER_LEN + pos as usize;
    let raw = buf
        .get(start..start + 2)
        .map(parse_sample)
        .ok_or(Miss::TruncatedSample { pos })?;

    if header.is_scaled() {
        #[allow(clippy::cast_sign_loss)]
        let water = if policy.water_as_u16 {
            raw as u16 == WATER_SLOPE
        } else {
            // Never true: a sign extended i16 can't reach WATER_SLOPE.
            Slope::from(raw) == Slope::from(WATER_SLOPE)
        };
        if water {
            return Err(Miss::Sentinel { raw });
        }
        Ok(Slope::from(raw) / 100)
    } else if Slope::from(raw) == NO_DATA {
        Err(Miss::Sentinel { raw })
    } else {
        Ok(Slope::from(raw))
    }
}

// Parses a little-endian sample from a slice of two bytes.
//
// # Panics
//
// Panics if the provided slice is less than two bytes in length.
fn parse_sample(src: &[u8]) -> Raw {
    LE::read_i16(src)
}
