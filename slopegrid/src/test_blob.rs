//! Synthetic grid blobs for tests.

use crate::{GridIndex, HEADER_LEN};

pub(crate) struct Blob {
    pub unit: u8,
    pub start_x: i64,
    pub start_y: i64,
    pub unit_x: i32,
    pub unit_y: i32,
    pub rows: u16,
    pub cols: u16,
}

impl Default for Blob {
    fn default() -> Self {
        Self {
            unit: 8,
            start_x: 0,
            start_y: 0,
            unit_x: 5000,
            unit_y: 5000,
            rows: 10,
            cols: 10,
        }
    }
}

impl Blob {
    /// Header followed by `rows * cols` zeroed samples.
    pub fn build(&self) -> Vec<u8> {
        self.build_with(&[])
    }

    pub fn build_with(&self, samples: &[(GridIndex, i16)]) -> Vec<u8> {
        let cells = usize::from(self.rows) * usize::from(self.cols);
        let mut buf = Vec::with_capacity(HEADER_LEN + cells * 2);
        buf.extend_from_slice(b"SLOPE\x01\x00");
        buf.push(self.unit);
        buf.extend_from_slice(&self.start_y.to_le_bytes());
        buf.extend_from_slice(&self.start_x.to_le_bytes());
        buf.extend_from_slice(&self.unit_y.to_le_bytes());
        buf.extend_from_slice(&self.unit_x.to_le_bytes());
        buf.extend_from_slice(&self.rows.to_le_bytes());
        buf.extend_from_slice(&self.cols.to_le_bytes());
        assert_eq!(buf.len(), HEADER_LEN);
        buf.resize(HEADER_LEN + cells * 2, 0);
        for &(GridIndex { col, row }, raw) in samples {
            let cell = (col * i32::from(self.rows) + row) * 2;
            let pos = HEADER_LEN + usize::try_from(cell).unwrap();
            buf[pos..pos + 2].copy_from_slice(&raw.to_le_bytes());
        }
        buf
    }
}
