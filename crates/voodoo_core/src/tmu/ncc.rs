//! Narrow channel compression tables.
//!
//! An NCC texel is 4 bits of luma and 2+2 bits selecting chroma offsets. Each table keeps the
//! coefficient registers and lazily expands them into 256 colors.

use crate::color::Argb;

use voodoo_util::Bit;

/// Number of coefficient registers in a table.
pub const NCC_REGS: usize = 12;

pub struct NccTable {
    regs: [u32; NCC_REGS],
    y: [i32; 16],
    ir: [i32; 4],
    ig: [i32; 4],
    ib: [i32; 4],
    qr: [i32; 4],
    qg: [i32; 4],
    qb: [i32; 4],
    pub texel: Box<[u32; 256]>,
    pub dirty: bool,
}

/// Sign extend the 9-bit field starting at bit `ls`.
fn coefficient(data: u32, ls: usize) -> i32 {
    ((data.bit_range(ls, ls + 8) << 23) as i32) >> 23
}

impl NccTable {
    pub fn new() -> Self {
        Self {
            regs: [0; NCC_REGS],
            y: [0; 16],
            ir: [0; 4],
            ig: [0; 4],
            ib: [0; 4],
            qr: [0; 4],
            qg: [0; 4],
            qb: [0; 4],
            texel: Box::new([0; 256]),
            dirty: true,
        }
    }

    /// Write a coefficient register. Writes that don't change the register are dropped.
    pub fn write(&mut self, regnum: usize, data: u32) {
        if self.regs[regnum] == data {
            return;
        }
        self.regs[regnum] = data;

        match regnum {
            0..=3 => {
                for (i, y) in self.y[regnum * 4..regnum * 4 + 4].iter_mut().enumerate() {
                    *y = ((data >> (i * 8)) & 0xff) as i32;
                }
            }
            4..=7 => {
                let i = regnum & 3;
                self.ir[i] = coefficient(data, 18);
                self.ig[i] = coefficient(data, 9);
                self.ib[i] = coefficient(data, 0);
            }
            _ => {
                let i = regnum & 3;
                self.qr[i] = coefficient(data, 18);
                self.qg[i] = coefficient(data, 9);
                self.qb[i] = coefficient(data, 0);
            }
        }

        self.dirty = true;
    }

    /// Regenerate all 256 colors from the coefficients.
    pub fn update(&mut self) {
        for (i, texel) in self.texel.iter_mut().enumerate() {
            let vi = (i >> 2) & 3;
            let vq = i & 3;
            let y = self.y[(i >> 4) & 0xf];

            let r = (y + self.ir[vi] + self.qr[vq]).clamp(0, 0xff);
            let g = (y + self.ig[vi] + self.qg[vq]).clamp(0, 0xff);
            let b = (y + self.ib[vi] + self.qb[vq]).clamp(0, 0xff);

            *texel = Argb::from_channels(0xff, r, g, b).0;
        }
        self.dirty = false;
    }
}

impl Default for NccTable {
    fn default() -> Self {
        Self::new()
    }
}

#[test]
fn luma_only() {
    let mut table = NccTable::new();
    table.write(0, 0x30201000);
    table.write(3, 0xff000000);
    table.update();
    assert!(!table.dirty);
    assert_eq!(table.texel[0x00], 0xff000000);
    assert_eq!(table.texel[0x20], 0xff202020);
    assert_eq!(table.texel[0xf0], 0xffffffff);
}

#[test]
fn chroma_is_signed_and_clamped() {
    let mut table = NccTable::new();
    table.write(0, 0x00000080);
    // I0 red = -1, blue = +0xff.
    table.write(4, (0x1ff << 18) | 0xff);
    table.update();
    assert_eq!(Argb(table.texel[0]).r(), 0x7f);
    assert_eq!(Argb(table.texel[0]).b(), 0xff);
    assert_eq!(Argb(table.texel[0]).g(), 0x80);
}
