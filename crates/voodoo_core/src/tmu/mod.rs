//! Texture mapping units.
//!
//! Each unit owns its texture memory and the tables derived from its registers. The derived
//! state is recomputed lazily, the first time a triangle needs it after a texture register write.

mod ncc;
mod tables;

pub use ncc::{NccTable, NCC_REGS};
pub use tables::{shared as texel_tables, TexelTables};

use crate::color::{bilinear_filter, Argb};
use crate::config::ChipType;
use crate::fixed::fast_reciplog;
use crate::regs::{self, Bank, RegisterFile, TexDetail, TexLod, TextureMode};
use crate::VoodooError;

/// Highest mipmap level.
pub const MAX_LOD: usize = 8;

/// The 16.32 texture coordinate gradients of a unit.
#[derive(Clone, Copy, Default, Debug)]
pub struct TexGradients {
    pub starts: i64,
    pub startt: i64,
    pub startw: i64,
    pub dsdx: i64,
    pub dtdx: i64,
    pub dwdx: i64,
    pub dsdy: i64,
    pub dtdy: i64,
    pub dwdy: i64,
}

pub struct Tmu {
    ram: Box<[u8]>,
    mask: u32,
    bank: Bank,
    /// Texture registers changed since the last recompute.
    pub dirty: bool,
    bilinear_mask: i32,

    palette: Box<[u32; 256]>,
    /// Palette with alpha, only present on Voodoo2.
    palette_alpha: Option<Box<[u32; 256]>>,
    ncc: [NccTable; 2],

    ncc_select: usize,
    format: u32,

    pub lodmin: i32,
    pub lodmax: i32,
    lodbias: i32,
    lodmask: u32,
    wmask: u32,
    hmask: u32,
    lodoffset: [u32; MAX_LOD + 1],

    detailmax: i32,
    detailbias: i32,
    detailscale: i32,

    pub grad: TexGradients,
}

fn texel(lookup: &[u32], index: u32) -> u32 {
    lookup.get(index as usize).copied().unwrap_or(0)
}

impl Tmu {
    /// Texture base addresses count 8-byte units.
    const TEXADDR_SHIFT: u32 = 3;
    const TEXADDR_MASK: u32 = 0x0fffff;

    pub fn new(index: usize, chip: ChipType, mem_bytes: usize) -> Result<Self, VoodooError> {
        if mem_bytes <= 1 || !mem_bytes.is_power_of_two() {
            error!("Invalid texture memory size of {mem_bytes} bytes");
            return Err(VoodooError::InvalidMemorySize { what: "texture", bytes: mem_bytes });
        }
        Ok(Self {
            ram: vec![0; mem_bytes].into_boxed_slice(),
            mask: (mem_bytes - 1) as u32,
            bank: Bank::tmu(index),
            dirty: true,
            bilinear_mask: if chip.is_voodoo2() { 0xff } else { 0xf0 },
            palette: Box::new([0; 256]),
            palette_alpha: chip.is_voodoo2().then(|| Box::new([0; 256])),
            ncc: [NccTable::new(), NccTable::new()],
            ncc_select: 0,
            format: 0,
            lodmin: 0,
            lodmax: 0,
            lodbias: 0,
            lodmask: 0,
            wmask: 0,
            hmask: 0,
            lodoffset: [0; MAX_LOD + 1],
            detailmax: 0,
            detailbias: 0,
            detailscale: 0,
            grad: TexGradients::default(),
        })
    }

    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    /// The lookup table the texel format selects.
    fn lookup(&self, format: u32) -> &[u32] {
        let shared = texel_tables();
        match format {
            0 | 8 => &shared.rgb332[..],
            1 | 9 => &self.ncc[self.ncc_select].texel[..],
            2 => &shared.alpha8[..],
            3 | 13 => &shared.int8[..],
            4 => &shared.ai44[..],
            5 | 14 => &self.palette[..],
            6 => self.palette_alpha.as_deref().map_or(&[][..], |p| &p[..]),
            10 => &shared.rgb565[..],
            11 => &shared.argb1555[..],
            12 => &shared.argb4444[..],
            _ => &[],
        }
    }

    /// Derive the LOD, size and offset state from the texture registers.
    pub fn recompute(&mut self, regs: &RegisterFile) -> Result<(), VoodooError> {
        let lod = TexLod(regs.banked(self.bank, regs::T_LOD).0);
        let mode = TextureMode(regs.banked(self.bank, regs::TEXTURE_MODE).0);
        let detail = TexDetail(regs.banked(self.bank, regs::T_DETAIL).0);
        let base_addr = regs.banked(self.bank, regs::TEX_BASE_ADDR).0;

        self.lodmin = (lod.lod_min() << 6) as i32;
        self.lodmax = (lod.lod_max() << 6) as i32;
        self.lodbias = (((lod.lod_bias() << 2) as u8 as i8) as i32) << 4;

        self.lodmask = match (lod.lod_tsplit(), lod.lod_odd()) {
            (false, _) => 0x1ff,
            (true, false) => 0x155,
            (true, true) => 0x0aa,
        };

        self.wmask = 0xff;
        self.hmask = 0xff;
        if lod.s_is_wider() {
            self.hmask >>= lod.aspect();
        } else {
            self.wmask >>= lod.aspect();
        }

        let bppscale = mode.format() >> 3;

        let mut base = (base_addr & Self::TEXADDR_MASK) << Self::TEXADDR_SHIFT;
        self.lodoffset[0] = base & self.mask;

        for lod in 1..=MAX_LOD {
            let prev = lod - 1;
            if self.lodmask & (1 << prev) != 0 {
                let mut size = ((self.wmask >> prev) + 1) * ((self.hmask >> prev) + 1);
                if prev >= 3 {
                    size = size.max(4);
                }
                base = base.wrapping_add(size << bppscale);
            }
            self.lodoffset[lod] = base & self.mask;
        }

        self.ncc_select = mode.ncc_table();
        self.format = mode.format();

        self.detailmax = detail.detail_max() as i32;
        self.detailbias = (((detail.detail_bias() << 2) as u8 as i8) as i32) << 6;
        self.detailscale = detail.detail_scale() as i32;

        self.dirty = false;

        if detail.separate_rgba_filter() {
            error!("Separate RGBA texture filtering is not emulated");
            return Err(VoodooError::Unsupported("separate RGBA filtering"));
        }

        Ok(())
    }

    /// Bring the derived state up to date and compute the base LOD of a triangle from the
    /// larger of the X and Y texture gradients.
    pub fn prepare(&mut self, regs: &RegisterFile) -> Result<i32, VoodooError> {
        if self.dirty {
            self.recompute(regs)?;
        }

        if self.format & 7 == 1 {
            let table = &mut self.ncc[self.ncc_select];
            if table.dirty {
                table.update();
            }
        }

        let sq = |a: i64, b: i64| {
            let (a, b) = (a >> 14, b >> 14);
            a.wrapping_mul(a).wrapping_add(b.wrapping_mul(b))
        };

        let texdx = sq(self.grad.dsdx, self.grad.dtdx);
        let texdy = sq(self.grad.dsdy, self.grad.dtdy);

        let (_, log) = fast_reciplog(texdx.max(texdy) >> 16);
        Ok((-log + (12 << 8)) / 2)
    }

    /// Write one of the 12 registers of NCC table `table`. The I and Q registers of table 0
    /// address the palette instead when the top bit is set.
    pub fn write_ncc(&mut self, table: usize, regnum: usize, data: u32) {
        if table == 0 && regnum >= 4 && data & 0x8000_0000 != 0 {
            let index = (((data >> 23) & 0xfe) | (regnum as u32 & 1)) as usize;
            self.palette[index] = 0xff00_0000 | data;

            if let Some(palette) = self.palette_alpha.as_deref_mut() {
                let a = ((data >> 16) & 0xfc) | ((data >> 22) & 0x03);
                let r = ((data >> 10) & 0xfc) | ((data >> 16) & 0x03);
                let g = ((data >> 4) & 0xfc) | ((data >> 10) & 0x03);
                let b = ((data << 2) & 0xfc) | ((data >> 4) & 0x03);
                palette[index] = Argb::new(a as u8, r as u8, g as u8, b as u8).0;
            }
            return;
        }
        self.ncc[table].write(regnum, data);
    }

    /// Download a word of texels. `offset` is the word offset into texture space.
    pub fn download(&mut self, regs: &RegisterFile, offset: u32, data: u32, seq_8_downld: bool) -> Result<(), VoodooError> {
        let lod_reg = TexLod(regs.banked(self.bank, regs::T_LOD).0);
        if lod_reg.direct_write() {
            error!("Direct texture memory writes are not emulated");
            return Err(VoodooError::Unsupported("texture direct write"));
        }

        if self.dirty {
            self.recompute(regs)?;
        }

        let mut data = data;
        if lod_reg.data_swizzle() {
            data = data.swap_bytes();
        }
        if lod_reg.data_swap() {
            data = data.rotate_left(16);
        }

        let lod = ((offset >> 15) & 0xf) as usize;
        let tt = (offset >> 7) & 0xff;

        if lod > MAX_LOD {
            return Ok(());
        }

        let row = tt * ((self.wmask >> lod) + 1);
        let format = TextureMode(regs.banked(self.bank, regs::TEXTURE_MODE).0).format();

        if format < 8 {
            let ts = if seq_8_downld {
                (offset << 2) & 0xfc
            } else {
                (offset << 1) & 0xfc
            };
            let addr = self.lodoffset[lod].wrapping_add(row).wrapping_add(ts);
            for (i, byte) in data.to_le_bytes().into_iter().enumerate() {
                self.ram[(addr.wrapping_add(i as u32) & self.mask) as usize] = byte;
            }
        } else {
            let ts = (offset << 1) & 0xfe;
            let addr = self.lodoffset[lod].wrapping_add(2 * (row + ts));
            for (i, byte) in data.to_le_bytes().into_iter().enumerate() {
                self.ram[(addr.wrapping_add(i as u32) & self.mask) as usize] = byte;
            }
        }

        trace!("Texture write lod {lod} row {tt} value {data:08x}");

        Ok(())
    }

    fn read_u8(&self, addr: u32) -> u32 {
        self.ram[(addr & self.mask) as usize] as u32
    }

    fn read_u16(&self, addr: u32) -> u32 {
        let lo = self.ram[(addr & self.mask) as usize];
        let hi = self.ram[(addr.wrapping_add(1) & self.mask) as usize];
        u16::from_le_bytes([lo, hi]) as u32
    }

    /// Fetch and expand the texel at `s`, `t` which are already scaled to the LOD.
    fn fetch(&self, lookup: &[u32], format: u32, texbase: u32, row: i32, s: i32) -> u32 {
        if format < 8 {
            let index = self.read_u8(texbase.wrapping_add((row + s) as u32));
            texel(lookup, index)
        } else {
            let value = self.read_u16(texbase.wrapping_add(2 * (row + s) as u32));
            if (10..=12).contains(&format) {
                texel(lookup, value)
            } else {
                (texel(lookup, value & 0xff) & 0xffffff) | ((value & 0xff00) << 16)
            }
        }
    }

    /// Sample the texture and run the texture combine unit.
    ///
    /// `c_other` is the output of the upstream unit, `lod_dither` the 4x4 dither value of the
    /// pixel when dithering is enabled.
    pub fn sample(
        &self,
        mode: TextureMode,
        lod_dither: Option<i32>,
        c_other: Argb,
        lodbase: i32,
        iters: i64,
        itert: i64,
        iterw: i64,
    ) -> Argb {
        let (mut s, mut t, mut lod) = if mode.perspective() {
            let (oow, lod) = fast_reciplog(iterw);
            let s = (oow.wrapping_mul(iters) >> 29) as i32;
            let t = (oow.wrapping_mul(itert) >> 29) as i32;
            (s, t, lod + lodbase)
        } else {
            ((iters >> 14) as i32, (itert >> 14) as i32, lodbase)
        };

        if mode.clamp_neg_w() && iterw < 0 {
            s = 0;
            t = 0;
        }

        lod += self.lodbias;
        if mode.lod_dither() {
            if let Some(dither) = lod_dither {
                lod += dither << 4;
            }
        }
        lod = lod.max(self.lodmin).min(self.lodmax);

        // Take the next level if this one isn't present.
        let mut ilod = (lod >> 8) as usize;
        if (self.lodmask >> ilod) & 1 == 0 {
            ilod += 1;
        }
        let ilod = ilod.min(MAX_LOD);

        let texbase = self.lodoffset[ilod];
        let smax = (self.wmask >> ilod) as i32;
        let tmax = (self.hmask >> ilod) as i32;

        let format = mode.format();
        let lookup = self.lookup(format);

        let point_sampled = if lod == self.lodmin {
            !mode.mag_filter()
        } else {
            !mode.min_filter()
        };

        let c_local = if point_sampled {
            s >>= ilod + 18;
            t >>= ilod + 18;

            if mode.clamp_s() {
                s = s.clamp(0, smax);
            }
            if mode.clamp_t() {
                t = t.clamp(0, tmax);
            }
            s &= smax;
            t &= tmax;

            Argb(self.fetch(lookup, format, texbase, t * (smax + 1), s))
        } else {
            s >>= ilod + 10;
            t >>= ilod + 10;

            // Offset by half a texel so (0.5, 0.5) is the center of texel (0, 0).
            s -= 0x80;
            t -= 0x80;

            let sfrac = (s & self.bilinear_mask) as u32;
            let tfrac = (t & self.bilinear_mask) as u32;

            s >>= 8;
            t >>= 8;
            let mut s1 = s + 1;
            let mut t1 = t + 1;

            if mode.clamp_s() {
                s = s.clamp(0, smax);
                s1 = s1.clamp(0, smax);
            }
            if mode.clamp_t() {
                t = t.clamp(0, tmax);
                t1 = t1.clamp(0, tmax);
            }
            s &= smax;
            s1 &= smax;
            let row0 = (t & tmax) * (smax + 1);
            let row1 = (t1 & tmax) * (smax + 1);

            Argb(bilinear_filter(
                self.fetch(lookup, format, texbase, row0, s),
                self.fetch(lookup, format, texbase, row0, s1),
                self.fetch(lookup, format, texbase, row1, s),
                self.fetch(lookup, format, texbase, row1, s1),
                sfrac,
                tfrac,
            ))
        };

        self.combine(mode, c_local, c_other, lod)
    }

    fn detail_factor(&self, lod: i32) -> i32 {
        if self.detailbias <= lod {
            0
        } else {
            (((self.detailbias - lod) << self.detailscale) >> 8).min(self.detailmax)
        }
    }

    /// The texture combine unit.
    fn combine(&self, mode: TextureMode, c_local: Argb, c_other: Argb, lod: i32) -> Argb {
        let (mut tr, mut tg, mut tb) = if mode.zero_other() {
            (0, 0, 0)
        } else {
            (c_other.r(), c_other.g(), c_other.b())
        };
        let mut ta = if mode.alpha_zero_other() { 0 } else { c_other.a() };

        if mode.sub_clocal() {
            tr -= c_local.r();
            tg -= c_local.g();
            tb -= c_local.b();
        }
        if mode.alpha_sub_clocal() {
            ta -= c_local.a();
        }

        let (mut br, mut bg, mut bb) = match mode.mselect() {
            1 => (c_local.r(), c_local.g(), c_local.b()),
            2 => (c_other.a(), c_other.a(), c_other.a()),
            3 => (c_local.a(), c_local.a(), c_local.a()),
            4 => {
                let detail = self.detail_factor(lod);
                (detail, detail, detail)
            }
            5 => (lod & 0xff, lod & 0xff, lod & 0xff),
            _ => (0, 0, 0),
        };
        let mut ba = match mode.alpha_mselect() {
            1 => c_local.a(),
            2 => c_other.a(),
            3 => c_local.a(),
            4 => self.detail_factor(lod),
            5 => lod & 0xff,
            _ => 0,
        };

        if !mode.reverse_blend() {
            br ^= 0xff;
            bg ^= 0xff;
            bb ^= 0xff;
        }
        if !mode.alpha_reverse_blend() {
            ba ^= 0xff;
        }

        tr = (tr * (br + 1)) >> 8;
        tg = (tg * (bg + 1)) >> 8;
        tb = (tb * (bb + 1)) >> 8;
        ta = (ta * (ba + 1)) >> 8;

        match mode.add_aclocal() {
            1 => {
                tr += c_local.r();
                tg += c_local.g();
                tb += c_local.b();
            }
            2 => {
                tr += c_local.a();
                tg += c_local.a();
                tb += c_local.a();
            }
            _ => (),
        }
        if mode.alpha_add_aclocal() != 0 {
            ta += c_local.a();
        }

        let mut result = Argb::from_channels(
            ta.clamp(0, 0xff),
            tr.clamp(0, 0xff),
            tg.clamp(0, 0xff),
            tb.clamp(0, 0xff),
        );

        if mode.invert_output() {
            result.0 ^= 0x00ff_ffff;
        }
        if mode.alpha_invert_output() {
            result.0 ^= 0xff00_0000;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmu_with(regs: &mut RegisterFile, mode: u32, lod: u32) -> Tmu {
        let mut tmu = Tmu::new(0, ChipType::Voodoo1, 1 << 20).unwrap();
        regs.set_banked(Bank::tmu(0), regs::TEXTURE_MODE, mode);
        regs.set_banked(Bank::tmu(0), regs::T_LOD, lod);
        tmu.recompute(regs).unwrap();
        tmu
    }

    #[test]
    fn lod_offsets_of_full_chain() {
        let mut regs = RegisterFile::new();
        // 16-bit texels, 256x256 base.
        let tmu = tmu_with(&mut regs, 10 << 8, 0);
        assert_eq!(tmu.lodoffset[0], 0);
        assert_eq!(tmu.lodoffset[1], 256 * 256 * 2);
        assert_eq!(tmu.lodoffset[2], (256 * 256 + 128 * 128) * 2);
    }

    #[test]
    fn odd_split_skips_even_levels() {
        let mut regs = RegisterFile::new();
        let tmu = tmu_with(&mut regs, 0, (1 << 19) | (1 << 18));
        assert_eq!(tmu.lodmask, 0x0aa);
        // Level 0 is absent, so level 1 starts at the base.
        assert_eq!(tmu.lodoffset[1], 0);
    }

    #[test]
    fn aspect_halves_height() {
        let mut regs = RegisterFile::new();
        let tmu = tmu_with(&mut regs, 0, (1 << 20) | (1 << 21));
        assert_eq!(tmu.wmask, 0xff);
        assert_eq!(tmu.hmask, 0x7f);
    }

    #[test]
    fn point_sample_replace() {
        let mut regs = RegisterFile::new();
        // RGB 565, zero other, add c_local, so the output is the texel itself.
        let mode = (10 << 8) | (1 << 12) | (1 << 18) | (1 << 21) | (1 << 27);
        let mut tmu = tmu_with(&mut regs, mode, 0);
        tmu.download(&regs, 0, 0x07e0_f800, false).unwrap();

        let texel = tmu.sample(TextureMode(mode), None, Argb(0), 0, 0, 0, 0);
        assert_eq!(texel, Argb(0xffff0000));

        // One texel to the right in 14.18.
        let texel = tmu.sample(TextureMode(mode), None, Argb(0), 0, 1 << 32, 0, 0);
        assert_eq!(texel, Argb(0xff00ff00));
    }

    #[test]
    fn ncc_palette_writes() {
        let mut tmu = Tmu::new(0, ChipType::Voodoo2, 1 << 20).unwrap();
        tmu.write_ncc(0, 4, 0x8000_0000 | (0x10 << 23) | 0x123456);
        assert_eq!(tmu.palette[0x10], 0xff12_3456);
        // Table 1 has no palette, so the write lands in the coefficients.
        tmu.ncc[1].update();
        tmu.write_ncc(1, 4, 0x8000_0000);
        assert!(tmu.ncc[1].dirty);
    }

    #[test]
    fn combine_blend_is_clamped() {
        let mut regs = RegisterFile::new();
        let tmu = tmu_with(&mut regs, 0, 0);
        for mselect in 0..8 {
            let mode = TextureMode((mselect << 14) | (1 << 18) | (1 << 20));
            let out = tmu.combine(mode, Argb(0xffffffff), Argb(0xffffffff), 0);
            assert!(out.r() <= 0xff && out.a() <= 0xff);
        }
    }
}
