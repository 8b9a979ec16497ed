//! Packed colors and the pixel format expansions used by texel tables and LFB writes.

/// A 32-bit color with 8 bits per channel, alpha in the top byte.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Argb(pub u32);

impl Argb {
    pub fn new(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self((a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    /// Build from channels that are already in the 0..=255 range.
    pub fn from_channels(a: i32, r: i32, g: i32, b: i32) -> Self {
        Self::new(a as u8, r as u8, g as u8, b as u8)
    }

    pub fn a(self) -> i32 {
        (self.0 >> 24) as i32
    }

    pub fn r(self) -> i32 {
        ((self.0 >> 16) & 0xff) as i32
    }

    pub fn g(self) -> i32 {
        ((self.0 >> 8) & 0xff) as i32
    }

    pub fn b(self) -> i32 {
        (self.0 & 0xff) as i32
    }

    pub fn rgb(self) -> u32 {
        self.0 & 0xffffff
    }

    pub fn with_alpha(self, a: i32) -> Self {
        Self((self.0 & 0xffffff) | ((a as u8 as u32) << 24))
    }
}

/// Three expanded 8-bit channels, in the order they are packed.
pub type Rgb = (i32, i32, i32);

/// Four expanded 8-bit channels, in the order they are packed.
pub type Rgba = (i32, i32, i32, i32);

pub fn extract_565(val: u32) -> Rgb {
    (
        (((val >> 8) & 0xf8) | ((val >> 13) & 0x07)) as i32,
        (((val >> 3) & 0xfc) | ((val >> 9) & 0x03)) as i32,
        (((val << 3) & 0xf8) | ((val >> 2) & 0x07)) as i32,
    )
}

pub fn extract_x555(val: u32) -> Rgb {
    (
        (((val >> 7) & 0xf8) | ((val >> 12) & 0x07)) as i32,
        (((val >> 2) & 0xf8) | ((val >> 7) & 0x07)) as i32,
        (((val << 3) & 0xf8) | ((val >> 2) & 0x07)) as i32,
    )
}

pub fn extract_555x(val: u32) -> Rgb {
    (
        (((val >> 8) & 0xf8) | ((val >> 13) & 0x07)) as i32,
        (((val >> 3) & 0xf8) | ((val >> 8) & 0x07)) as i32,
        (((val << 2) & 0xf8) | ((val >> 3) & 0x07)) as i32,
    )
}

/// Alpha first, then the three colors.
pub fn extract_1555(val: u32) -> Rgba {
    let (a, b, c) = extract_x555(val);
    let alpha = if val & 0x8000 != 0 { 0xff } else { 0 };
    (alpha, a, b, c)
}

/// The three colors, then alpha.
pub fn extract_5551(val: u32) -> Rgba {
    let (a, b, c) = extract_555x(val);
    let alpha = if val & 0x1 != 0 { 0xff } else { 0 };
    (a, b, c, alpha)
}

pub fn extract_x888(val: u32) -> Rgb {
    (((val >> 16) & 0xff) as i32, ((val >> 8) & 0xff) as i32, (val & 0xff) as i32)
}

pub fn extract_888x(val: u32) -> Rgb {
    ((val >> 24) as i32, ((val >> 16) & 0xff) as i32, ((val >> 8) & 0xff) as i32)
}

pub fn extract_8888(val: u32) -> Rgba {
    (
        (val >> 24) as i32,
        ((val >> 16) & 0xff) as i32,
        ((val >> 8) & 0xff) as i32,
        (val & 0xff) as i32,
    )
}

pub fn extract_4444(val: u32) -> Rgba {
    (
        (((val >> 8) & 0xf0) | ((val >> 12) & 0x0f)) as i32,
        (((val >> 4) & 0xf0) | ((val >> 8) & 0x0f)) as i32,
        ((val & 0xf0) | ((val >> 4) & 0x0f)) as i32,
        (((val << 4) & 0xf0) | (val & 0x0f)) as i32,
    )
}

pub fn extract_332(val: u32) -> Rgb {
    (
        ((val & 0xe0) | ((val >> 3) & 0x1c) | ((val >> 6) & 0x03)) as i32,
        (((val << 3) & 0xe0) | (val & 0x1c) | ((val >> 3) & 0x03)) as i32,
        (((val << 6) & 0xc0) | ((val << 4) & 0x30) | ((val << 2) & 0xc0) | (val & 0x03)) as i32,
    )
}

/// Bilinear blend of four texels, with `u` and `v` the 8-bit fractions.
pub fn bilinear_filter(c00: u32, c01: u32, c10: u32, c11: u32, u: u32, v: u32) -> u32 {
    let lerp = |a: u32, b: u32, f: u32| {
        a.wrapping_add((b.wrapping_sub(a).wrapping_mul(f)) >> 8) & 0x00ff00ff
    };

    let ag0 = lerp((c00 >> 8) & 0x00ff00ff, (c01 >> 8) & 0x00ff00ff, u);
    let rb0 = lerp(c00 & 0x00ff00ff, c01 & 0x00ff00ff, u);
    let ag1 = lerp((c10 >> 8) & 0x00ff00ff, (c11 >> 8) & 0x00ff00ff, u);
    let rb1 = lerp(c10 & 0x00ff00ff, c11 & 0x00ff00ff, u);

    let rb = lerp(rb0, rb1, v);
    let ag = lerp(ag0, ag1, v);

    ((ag << 8) & 0xff00ff00) | (rb & 0x00ff00ff)
}

#[test]
fn extract_pure_colors() {
    assert_eq!(extract_565(0xf800), (0xff, 0, 0));
    assert_eq!(extract_565(0x07e0), (0, 0xff, 0));
    assert_eq!(extract_565(0x001f), (0, 0, 0xff));
    assert_eq!(extract_1555(0x8000), (0xff, 0, 0, 0));
    assert_eq!(extract_4444(0xf00f), (0xff, 0, 0, 0xff));
    assert_eq!(extract_332(0xff), (0xff, 0xff, 0xf3));
}

#[test]
fn bilinear_corners() {
    let (a, b) = (0xff102030, 0x00405060);
    assert_eq!(bilinear_filter(a, b, a, b, 0, 0), a);
    assert_eq!(bilinear_filter(a, a, a, a, 0x80, 0x80), a);
}
