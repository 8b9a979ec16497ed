//! Ordered dithering down to 5-6-5.

use crate::regs::FbzMode;

use std::sync::OnceLock;

pub const DITHER_4X4: [u8; 16] = [
    0, 8, 2, 10,
    12, 4, 14, 6,
    3, 11, 1, 9,
    15, 7, 13, 5,
];

pub const DITHER_2X2: [u8; 16] = [
    2, 10, 2, 10,
    14, 6, 14, 6,
    2, 10, 2, 10,
    14, 6, 14, 6,
];

/// Entries in each lookup table: 4 rows of 256 values, 4 columns and 2 channel kinds.
const LOOKUP_SIZE: usize = 256 * 16 * 2;

fn dither_rb(val: i32, dith: i32) -> i32 {
    ((val << 1) - (val >> 4) + (val >> 7) + dith) >> 1
}

fn dither_g(val: i32, dith: i32) -> i32 {
    ((val << 2) - (val >> 4) + (val >> 6) + dith) >> 2
}

fn build_lookup(matrix: &[u8; 16]) -> Box<[u8]> {
    (0..LOOKUP_SIZE)
        .map(|val| {
            let g = val & 1;
            let x = (val >> 1) & 3;
            let color = ((val >> 3) & 0xff) as i32;
            let y = (val >> 11) & 3;
            let dith = matrix[y * 4 + x] as i32;
            if g == 0 {
                (dither_rb(color, dith) >> 3) as u8
            } else {
                (dither_g(color, dith) >> 2) as u8
            }
        })
        .collect()
}

fn lookup_4x4() -> &'static [u8] {
    static TABLE: OnceLock<Box<[u8]>> = OnceLock::new();
    TABLE.get_or_init(|| build_lookup(&DITHER_4X4))
}

fn lookup_2x2() -> &'static [u8] {
    static TABLE: OnceLock<Box<[u8]>> = OnceLock::new();
    TABLE.get_or_init(|| build_lookup(&DITHER_2X2))
}

/// Force the lookup tables to be built.
pub fn init_tables() {
    lookup_4x4();
    lookup_2x2();
}

/// Dithering state for one scanline.
#[derive(Clone, Copy)]
pub struct DitherRow {
    /// Row of the 4x4 matrix. Used for fog and LOD dithering whatever the dither type is.
    dither4: Option<&'static [u8]>,
    /// Row of the matrix selected by the dither type.
    dither: Option<&'static [u8]>,
    lookup: &'static [u8],
}

impl DitherRow {
    pub fn new(fbz_mode: FbzMode, y: i32) -> Self {
        let row = (y & 3) as usize;
        if !fbz_mode.dithering() {
            return Self { dither4: None, dither: None, lookup: &[] };
        }
        let dither4 = &DITHER_4X4[row * 4..row * 4 + 4];
        let (dither, lookup) = if fbz_mode.dither_2x2() {
            (&DITHER_2X2[row * 4..row * 4 + 4], lookup_2x2())
        } else {
            (dither4, lookup_4x4())
        };
        Self {
            dither4: Some(dither4),
            dither: Some(dither),
            lookup: &lookup[row << 11..(row + 1) << 11],
        }
    }

    /// The 4x4 matrix value at `x`, if dithering is enabled.
    pub fn dither4(&self, x: i32) -> Option<i32> {
        self.dither4.map(|row| row[(x & 3) as usize] as i32)
    }

    /// The selected matrix value at `x`, if dithering is enabled.
    pub fn dither(&self, x: i32) -> Option<i32> {
        self.dither.map(|row| row[(x & 3) as usize] as i32)
    }

    /// Reduce 8-bit channels to a packed 5-6-5 pixel.
    pub fn pack_565(&self, x: i32, r: i32, g: i32, b: i32) -> u16 {
        let (r, g, b) = if self.dither.is_some() {
            let base = ((x & 3) << 1) as usize;
            (
                self.lookup[((r as usize) << 3) + base] as i32,
                self.lookup[((g as usize) << 3) + base + 1] as i32,
                self.lookup[((b as usize) << 3) + base] as i32,
            )
        } else {
            (r >> 3, g >> 2, b >> 3)
        };
        ((r << 11) | (g << 5) | b) as u16
    }
}

#[test]
fn undithered_is_truncation() {
    let row = DitherRow::new(FbzMode(0), 0);
    assert_eq!(row.pack_565(0, 0xff, 0, 0), 0xf800);
    assert_eq!(row.pack_565(3, 0x12, 0x34, 0x56), (0x12 >> 3) << 11 | (0x34 >> 2) << 5 | 0x56 >> 3);
    assert_eq!(row.dither4(0), None);
}

#[test]
fn dithered_extremes_are_stable() {
    let fbz = FbzMode(1 << 8);
    for y in 0..4 {
        let row = DitherRow::new(fbz, y);
        for x in 0..4 {
            assert_eq!(row.pack_565(x, 0, 0, 0), 0);
            assert_eq!(row.pack_565(x, 0xff, 0xff, 0xff), 0xffff);
        }
    }
}
