use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SlopeGridError {
    #[error("buffer of {len} bytes is too short for a 36 byte grid header")]
    MalformedHeader { len: usize },
}

/// Reasons a lookup produced no slope.
///
/// Every variant surfaces as [`NO_DATA`](crate::NO_DATA) through
/// [`decode`](crate::decode).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Miss {
    #[error("unsupported grid variant: unit_x {unit_x}, unit_y {unit_y}")]
    UnsupportedVariant { unit_x: i32, unit_y: i32 },

    #[error("cell (col {col}, row {row}) is outside the grid")]
    OutOfGridBounds { col: i32, row: i32 },

    #[error("sample position {pos} is outside the buffer")]
    OutOfBufferBounds { pos: i32 },

    /// The position passed the legacy length check, but the sample
    /// itself lies past the end of the buffer.
    #[error("sample at position {pos} is truncated")]
    TruncatedSample { pos: i32 },

    #[error("sentinel reading {raw}")]
    Sentinel { raw: i16 },
}
