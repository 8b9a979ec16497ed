use crate::color::{self, Argb};

use std::sync::OnceLock;

/// Texel expansion tables shared between every texture unit. Only the palette and NCC formats
/// need per unit tables.
pub struct TexelTables {
    pub rgb332: Box<[u32]>,
    pub alpha8: Box<[u32]>,
    pub int8: Box<[u32]>,
    pub ai44: Box<[u32]>,
    pub rgb565: Box<[u32]>,
    pub argb1555: Box<[u32]>,
    pub argb4444: Box<[u32]>,
}

impl TexelTables {
    fn build() -> Self {
        let table_8 = |f: fn(u32) -> Argb| (0..256).map(|val| f(val).0).collect::<Box<[u32]>>();
        let table_16 = |f: fn(u32) -> Argb| (0..65536).map(|val| f(val).0).collect::<Box<[u32]>>();

        Self {
            rgb332: table_8(|val| {
                let (r, g, b) = color::extract_332(val);
                Argb::from_channels(0xff, r, g, b)
            }),
            alpha8: table_8(|val| {
                let val = val as i32;
                Argb::from_channels(val, val, val, val)
            }),
            int8: table_8(|val| {
                let val = val as i32;
                Argb::from_channels(0xff, val, val, val)
            }),
            ai44: table_8(|val| {
                let a = ((val & 0xf0) | ((val >> 4) & 0x0f)) as i32;
                let i = (((val << 4) & 0xf0) | (val & 0x0f)) as i32;
                Argb::from_channels(a, i, i, i)
            }),
            rgb565: table_16(|val| {
                let (r, g, b) = color::extract_565(val);
                Argb::from_channels(0xff, r, g, b)
            }),
            argb1555: table_16(|val| {
                let (a, r, g, b) = color::extract_1555(val);
                Argb::from_channels(a, r, g, b)
            }),
            argb4444: table_16(|val| {
                let (a, r, g, b) = color::extract_4444(val);
                Argb::from_channels(a, r, g, b)
            }),
        }
    }
}

pub fn shared() -> &'static TexelTables {
    static TABLES: OnceLock<TexelTables> = OnceLock::new();
    TABLES.get_or_init(TexelTables::build)
}

#[test]
fn shared_tables() {
    let tables = shared();
    assert_eq!(tables.rgb565[0xf800], 0xffff0000);
    assert_eq!(tables.argb1555[0x7fff], 0x00ffffff);
    assert_eq!(tables.argb4444[0xf000], 0xff000000);
    assert_eq!(tables.ai44[0x3c], 0x33cccccc);
    assert_eq!(tables.alpha8[0x12], 0x12121212);
    assert_eq!(tables.int8[0x12], 0xff121212);
}
