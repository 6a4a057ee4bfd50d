// #![deny(missing_docs)]

//! Slope grid blob decoding.
//!
//! A slope grid blob is a 36 byte little-endian [header](GridHeader)
//! describing a regular grid in fixed point degrees, followed by one
//! `i16` sample per cell. Cells are stored column major: columns
//! step south from the origin's latitude, rows step east from its
//! longitude.
//!
//! Lookups never fail loudly. Any coordinate the grid can't answer
//! for resolves to [`NO_DATA`] through [`decode`], or to a [`Miss`]
//! explaining why through [`Grid::lookup`].

mod coord;
mod error;
mod header;
mod locate;
mod sample;
#[cfg(test)]
mod test_blob;

pub use crate::{
    coord::FixedPoint,
    error::{Miss, SlopeGridError},
    header::{GridHeader, Variant},
    locate::GridIndex,
    sample::{Sample, Samples},
};
pub use geo;
use geo::{
    geometry::{Coord, Polygon},
    polygon,
};
#[cfg(feature = "image")]
use image::{ImageBuffer, Luma};
use itertools::iproduct;
use log::{debug, trace};
#[cfg(feature = "image")]
use num_traits::AsPrimitive;

/// Base floating point type used for all coordinates.
pub type C = f64;

/// Decoded slope value.
pub type Slope = i32;

/// Bit representation of stored samples.
pub type Raw = i16;

/// Fixed point units per degree.
pub const SCALE: C = 100_000_000.0;

/// Degrees per fixed point unit.
pub const DEGREES_PER_UNIT: C = 0.000_000_01;

/// Returned by [`decode`] for every location without usable data.
pub const NO_DATA: Slope = -9999;

/// Water marker for grids with [scaled](GridHeader::is_scaled) samples.
pub const WATER_SLOPE: u16 = 48_676;

/// Length of the fixed header preceding the samples.
pub const HEADER_LEN: usize = 36;

/// Grids with a `unit` below this store samples multiplied by 100.
pub const SCALED_UNIT_LIMIT: u8 = 8;

/// Validation toggles.
///
/// [`Policy::LEGACY`] reproduces the checks deployed readers perform,
/// gaps included. [`Policy::STRICT`] closes them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Policy {
    /// Reject cells with a negative column or row.
    ///
    /// Without this, a negative column can alias a cell from another
    /// column as long as its byte position stays non-negative.
    pub reject_negative_index: bool,

    /// Check sample positions against the buffer length _minus_ the
    /// header.
    ///
    /// Without this, positions in the last 36 bytes pass the check and
    /// then fail to read as [`Miss::TruncatedSample`].
    pub offset_includes_header: bool,

    /// Match [`WATER_SLOPE`] against the sample's 16 bit pattern.
    ///
    /// Without this, water cells decode as `-168`.
    pub water_as_u16: bool,
}

impl Policy {
    pub const LEGACY: Self = Self {
        reject_negative_index: false,
        offset_includes_header: false,
        water_as_u16: false,
    };

    pub const STRICT: Self = Self {
        reject_negative_index: true,
        offset_includes_header: true,
        water_as_u16: true,
    };
}

impl Default for Policy {
    fn default() -> Self {
        Self::LEGACY
    }
}

/// Returns the slope at (`lat`, `lng`) or [`NO_DATA`].
///
/// # Errors
///
/// Fails only if `buf` can't hold a header.
pub fn decode(buf: &[u8], lat: C, lng: C) -> Result<Slope, SlopeGridError> {
    decode_with(buf, lat, lng, Policy::LEGACY)
}

/// Same as [`decode`], validating with `policy`.
///
/// # Errors
///
/// Fails only if `buf` can't hold a header.
pub fn decode_with(
    buf: &[u8],
    lat: C,
    lng: C,
    policy: Policy,
) -> Result<Slope, SlopeGridError> {
    let grid = Grid::new(buf)?.with_policy(policy);
    Ok(grid.lookup(lat, lng).unwrap_or(NO_DATA))
}

/// A parsed view over a caller owned grid blob.
pub struct Grid<'a> {
    header: GridHeader,
    buf: &'a [u8],
    policy: Policy,
}

/// One hit from [`Grid::samples_in`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AreaSample {
    pub lat: C,
    pub lng: C,
    pub slope: Slope,
}

impl<'a> Grid<'a> {
    /// Parses the header of `buf`, validating with [`Policy::LEGACY`].
    pub fn new(buf: &'a [u8]) -> Result<Self, SlopeGridError> {
        let header = GridHeader::parse(buf)?;
        debug!("parsed {} byte grid: {:?}", buf.len(), header);
        Ok(Self {
            header,
            buf,
            policy: Policy::default(),
        })
    }

    #[must_use]
    pub fn with_policy(self, policy: Policy) -> Self {
        Self { policy, ..self }
    }

    pub fn header(&self) -> &GridHeader {
        &self.header
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Returns this grid's regional preset, if supported.
    pub fn variant(&self) -> Option<Variant> {
        self.header.variant()
    }

    /// Returns the number of cells this grid claims.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.header.len()
    }

    /// Returns the slope at (`lat`, `lng`).
    pub fn lookup(&self, lat: C, lng: C) -> Result<Slope, Miss> {
        self.lookup_fixed(FixedPoint::encode(lat, lng))
    }

    /// Returns the slope at an already encoded coordinate.
    pub fn lookup_fixed(&self, fp: FixedPoint) -> Result<Slope, Miss> {
        self.check_variant()
            .and_then(|_| self.read(self.header.locate(fp)))
            .inspect_err(|miss| trace!("{fp:?}: {miss}"))
    }

    /// Returns the slope at `loc`.
    ///
    /// `loc` can be one of:
    ///
    /// - [`Coord`]: an absolute geographic location, `x` being the
    ///   longitude.
    /// - [`FixedPoint`]: an encoded geographic location.
    /// - [`GridIndex`]: a (col, row) cell address.
    pub fn get<T>(&self, loc: T) -> Result<Slope, Miss>
    where
        Self: Get<T>,
    {
        <Self as Get<T>>::get(self, loc)
    }

    /// Returns an iterator over every cell inside the grid's stated
    /// dimensions.
    pub fn iter(&self) -> Samples<'_> {
        Samples::new(self)
    }

    /// Returns every hit on a lattice spanning the rectangle between
    /// two `(lat, lng)` corners.
    ///
    /// The lattice starts at the rectangle's minimum corner and steps
    /// one cell along each axis, both ends inclusive. Misses are
    /// skipped.
    pub fn samples_in(
        &self,
        (lat_a, lng_a): (C, C),
        (lat_b, lng_b): (C, C),
    ) -> Vec<AreaSample> {
        let Ok(variant) = self.check_variant() else {
            return Vec::new();
        };
        #[allow(clippy::cast_sign_loss)]
        let step = variant.cell_size() as usize;
        let lo = FixedPoint::encode(lat_a.min(lat_b), lng_a.min(lng_b));
        let hi = FixedPoint::encode(lat_a.max(lat_b), lng_a.max(lng_b));

        iproduct!((lo.y..=hi.y).step_by(step), (lo.x..=hi.x).step_by(step))
            .filter_map(|(y, x)| {
                let fp = FixedPoint { x, y };
                let slope = self.lookup_fixed(fp).ok()?;
                let (lat, lng) = fp.to_degrees();
                Some(AreaSample { lat, lng, slope })
            })
            .collect()
    }

    /// Returns this grid's outline as a polygon.
    ///
    /// Cells are centered on their fixed point origin, so the outline
    /// extends half a cell past the outermost origins.
    pub fn polygon(&self) -> Polygon<C> {
        let GridHeader {
            start_x,
            start_y,
            unit_x,
            unit_y,
            rows,
            cols,
            ..
        } = self.header;
        let half = |unit: i32| C::from(unit) * DEGREES_PER_UNIT / 2.0;
        let span = |unit: i32, n: u16| {
            C::from(unit) * C::from(n.saturating_sub(1)) * DEGREES_PER_UNIT
        };
        #[allow(clippy::cast_precision_loss)]
        let (lat, lng) = (start_x as C * DEGREES_PER_UNIT, start_y as C * DEGREES_PER_UNIT);

        let n = lat + half(unit_x);
        let s = lat - span(unit_x, cols) - half(unit_x);
        let w = lng - half(unit_y);
        let e = lng + span(unit_y, rows) + half(unit_y);

        polygon![
            (x: w, y: s),
            (x: e, y: s),
            (x: e, y: n),
            (x: w, y: n),
            (x: w, y: s),
        ]
    }
}

#[cfg(feature = "image")]
impl<'a> Grid<'a> {
    /// Returns an [`ImageBuffer`] of this grid.
    ///
    /// North is up: image `x` follows rows, image `y` follows
    /// columns. Slopes are scaled so that the lowest slope is `0` and
    /// the highest is `Pix::max_value()`. Cells without data are `0`.
    pub fn to_image<Pix>(&self) -> ImageBuffer<Luma<Pix>, Vec<Pix>>
    where
        Pix: image::Primitive + 'static,
        f32: AsPrimitive<Pix> + From<Pix>,
    {
        let mut img = ImageBuffer::new(
            u32::from(self.header.rows),
            u32::from(self.header.cols),
        );
        let (min, max) = self
            .iter()
            .filter_map(|sample| sample.slope().ok())
            .fold((Slope::MAX, Slope::MIN), |(lo, hi), slope| {
                (lo.min(slope), hi.max(slope))
            });
        #[allow(clippy::cast_precision_loss)]
        let (min, range) = (min as f32, max.saturating_sub(min).max(1) as f32);
        #[allow(clippy::cast_precision_loss)]
        let scale = |slope: Slope| (slope as f32 - min) / range * f32::from(Pix::max_value());
        for sample in self.iter() {
            let Ok(slope) = sample.slope() else {
                continue;
            };
            let GridIndex { col, row } = sample.index();
            #[allow(clippy::cast_sign_loss)]
            img.put_pixel(row as u32, col as u32, Luma([scale(slope).as_()]));
        }
        img
    }
}

/// Private API
impl<'a> Grid<'a> {
    fn check_variant(&self) -> Result<Variant, Miss> {
        self.variant().ok_or(Miss::UnsupportedVariant {
            unit_x: self.header.unit_x,
            unit_y: self.header.unit_y,
        })
    }

    fn read(&self, idx: GridIndex) -> Result<Slope, Miss> {
        let pos = self.header.position(idx, self.buf.len(), self.policy)?;
        sample::decode_sample(&self.header, self.buf, pos, self.policy)
    }

    fn index_to_fixed(&self, GridIndex { col, row }: GridIndex) -> FixedPoint {
        FixedPoint {
            x: self.header.start_x - i64::from(col) * i64::from(self.header.unit_x),
            y: self.header.start_y + i64::from(row) * i64::from(self.header.unit_y),
        }
    }

    fn index_to_geo(&self, idx: GridIndex) -> Coord<C> {
        let (lat, lng) = self.index_to_fixed(idx).to_degrees();
        Coord { x: lng, y: lat }
    }
}

pub trait Get<Loc> {
    fn get(&self, loc: Loc) -> Result<Slope, Miss>;
}

impl<'a> Get<Coord<C>> for Grid<'a> {
    #[inline]
    fn get(&self, loc: Coord<C>) -> Result<Slope, Miss> {
        self.lookup(loc.y, loc.x)
    }
}

impl<'a> Get<FixedPoint> for Grid<'a> {
    #[inline]
    fn get(&self, loc: FixedPoint) -> Result<Slope, Miss> {
        self.lookup_fixed(loc)
    }
}

impl<'a> Get<GridIndex> for Grid<'a> {
    #[inline]
    fn get(&self, loc: GridIndex) -> Result<Slope, Miss> {
        self.check_variant().and_then(|_| self.read(loc))
    }
}


#[cfg(test)]
mod grid {
    use super::{AreaSample, Grid, GridIndex, Miss};
    use crate::test_blob::Blob;
    use approx::assert_relative_eq;
    use geo::{geometry::Coord, BoundingRect};

    fn blob() -> Vec<u8> {
        Blob {
            start_x: 3_750_000_000,
            start_y: 12_700_000_000,
            rows: 4,
            cols: 3,
            ..Blob::default()
        }
        .build_with(&[
            (GridIndex::new(0, 0), 10),
            (GridIndex::new(1, 2), 12),
            (GridIndex::new(2, 3), -9999),
        ])
    }

    #[test]
    fn test_get() {
        let buf = blob();
        let grid = Grid::new(&buf).unwrap();
        assert_eq!(grid.get(GridIndex::new(1, 2)), Ok(12));
        assert_eq!(
            grid.get(Coord {
                x: 127.000_1,
                y: 37.499_95
            }),
            Ok(12)
        );
        assert_eq!(
            grid.get(crate::FixedPoint {
                x: 3_749_995_000,
                y: 12_700_010_000
            }),
            Ok(12)
        );
        assert_eq!(
            grid.get(GridIndex::new(2, 3)),
            Err(Miss::Sentinel { raw: -9999 })
        );
    }

    #[test]
    fn test_iter() {
        let buf = blob();
        let grid = Grid::new(&buf).unwrap();
        assert_eq!(grid.iter().count(), grid.len());
        let hits: Vec<_> = grid
            .iter()
            .filter_map(|sample| match sample.slope() {
                Ok(0) | Err(_) => None,
                Ok(slope) => Some((sample.index(), slope)),
            })
            .collect();
        assert_eq!(
            hits,
            vec![(GridIndex::new(0, 0), 10), (GridIndex::new(1, 2), 12)]
        );
        let sample = grid.iter().nth(6).unwrap();
        assert_eq!(sample.index(), GridIndex::new(1, 2));
        assert_relative_eq!(sample.geo().y, 37.499_95, epsilon = 1e-9);
        assert_relative_eq!(sample.geo().x, 127.000_1, epsilon = 1e-9);
        assert!(sample == grid.iter().nth(6).unwrap());
        assert!(sample != grid.iter().nth(5).unwrap());
    }

    #[test]
    fn test_samples_in() {
        let buf = blob();
        let grid = Grid::new(&buf).unwrap();
        // The corner order doesn't matter.
        let hits = grid.samples_in((37.499_95, 127.0), (37.5, 127.000_1));
        assert_eq!(hits, grid.samples_in((37.5, 127.0), (37.499_95, 127.000_1)));
        // Two columns by three rows.
        assert_eq!(hits.len(), 6);
        let hit = hits.iter().find(|hit| hit.slope == 12).unwrap();
        assert_relative_eq!(hit.lat, 37.499_95, epsilon = 1e-9);
        assert_relative_eq!(hit.lng, 127.000_1, epsilon = 1e-9);
    }

    #[test]
    fn test_samples_in_skips_misses() {
        let buf = blob();
        let grid = Grid::new(&buf).unwrap();
        // Covers the sentinel at (2, 3) and two rows east of the grid.
        let hits = grid.samples_in((37.4999, 127.000_15), (37.4999, 127.000_25));
        assert_eq!(hits.len(), 0);
        let hits = grid.samples_in((37.4999, 127.000_1), (37.4999, 127.000_25));
        assert_eq!(
            hits.iter().map(|hit| hit.slope).collect::<Vec<_>>(),
            vec![0]
        );
    }

    #[test]
    fn test_samples_in_unsupported_variant() {
        let buf = Blob {
            unit_x: 0,
            unit_y: 0,
            ..Blob::default()
        }
        .build();
        let grid = Grid::new(&buf).unwrap();
        assert_eq!(grid.samples_in((0.0, 0.0), (1.0, 1.0)), Vec::<AreaSample>::new());
    }

    #[test]
    fn test_polygon() {
        let buf = blob();
        let grid = Grid::new(&buf).unwrap();
        let rect = grid.polygon().bounding_rect().unwrap();
        assert_relative_eq!(rect.max().y, 37.500_025, epsilon = 1e-9);
        assert_relative_eq!(rect.min().y, 37.499_875, epsilon = 1e-9);
        assert_relative_eq!(rect.min().x, 126.999_975, epsilon = 1e-9);
        assert_relative_eq!(rect.max().x, 127.000_175, epsilon = 1e-9);
    }
}
