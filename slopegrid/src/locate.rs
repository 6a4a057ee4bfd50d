use crate::{FixedPoint, GridHeader, Miss, Policy, HEADER_LEN};

/// A (column, row) cell address.
///
/// Columns step along latitude, rows along longitude. Coordinates
/// are signed because the locator can land before the grid origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GridIndex {
    pub col: i32,
    pub row: i32,
}

impl GridIndex {
    pub fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }
}

impl From<(i32, i32)> for GridIndex {
    fn from((col, row): (i32, i32)) -> Self {
        Self { col, row }
    }
}

impl GridHeader {
    /// Maps a fixed point coordinate to the cell containing it.
    ///
    /// Latitude grows toward _lower_ columns (the origin is the
    /// grid's northern edge), longitude toward higher rows.
    ///
    /// Note: only the truncated quotient or the next one up are ever
    /// considered. For negative offsets this is _not_ nearest-cell
    /// rounding, and existing data depends on that.
    pub fn locate(&self, fp: FixedPoint) -> GridIndex {
        let col = snap(self.start_x.wrapping_sub(fp.x), self.unit_x);
        let row = snap(fp.y.wrapping_sub(self.start_y), self.unit_y);
        GridIndex { col, row }
    }

    /// Validates `idx` and returns its byte position relative to the
    /// start of the sample array.
    pub fn position(&self, idx: GridIndex, buf_len: usize, policy: Policy) -> Result<i32, Miss> {
        let GridIndex { col, row } = idx;
        let (cols, rows) = (i32::from(self.cols), i32::from(self.rows));

        if col > cols || row > rows {
            return Err(Miss::OutOfGridBounds { col, row });
        }
        if policy.reject_negative_index && (col < 0 || row < 0) {
            return Err(Miss::OutOfGridBounds { col, row });
        }

        let pos = col.wrapping_mul(rows).wrapping_add(row).wrapping_mul(2);
        let limit = if policy.offset_includes_header {
            buf_len.saturating_sub(HEADER_LEN)
        } else {
            buf_len
        };
        if pos < 0 {
            return Err(Miss::OutOfBufferBounds { pos });
        }
        #[allow(clippy::cast_sign_loss)]
        let end = pos as usize + 2;
        if end > limit {
            return Err(Miss::OutOfBufferBounds { pos });
        }
        Ok(pos)
    }
}

/// Truncating division of `offset` by `unit`, bumped up by one when
/// the next multiple is strictly closer.
///
/// The quotient is taken on the full 64 bit offset and then narrowed;
/// the closeness test runs on the narrowed offset in wrapping 32 bit
/// arithmetic.
#[allow(clippy::cast_possible_truncation)]
fn snap(offset: i64, unit: i32) -> i32 {
    let mut n = offset.wrapping_div(i64::from(unit)) as i32;
    let offset = offset as i32;
    let below = offset.wrapping_sub(unit.wrapping_mul(n)).wrapping_abs();
    let above = offset
        .wrapping_sub(unit.wrapping_mul(n.wrapping_add(1)))
        .wrapping_abs();
    if below > above {
        n = n.wrapping_add(1);
    }
    n
}
