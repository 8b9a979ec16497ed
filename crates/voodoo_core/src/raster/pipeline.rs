//! The stages of the pixel pipeline shared by triangles and pipelined LFB writes.
//!
//! Every test stage returns `Err(Reject)` when the pixel is discarded. The caller records the
//! rejection and moves on to the next pixel.

use crate::color::Argb;
use crate::dither::DitherRow;
use crate::fbi::Fbi;
use crate::fixed::{self, clamped_w, clamped_z};
use crate::regs::{
    self, AlphaMode, Bank, ChromaRange, CompareFunc, FbzColorPath, FbzMode, FogMode, RegisterFile,
    TextureMode,
};
use crate::stats::Stats;

/// Why a pixel was discarded.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Reject {
    Stipple,
    Depth,
    Chroma,
    AlphaMask,
    AlphaTest,
}

impl Reject {
    pub fn record(self, stats: &mut Stats) {
        match self {
            Reject::Stipple => stats.stipple_count += 1,
            Reject::Depth => stats.zfunc_fail += 1,
            Reject::Chroma => stats.chroma_fail += 1,
            Reject::AlphaMask | Reject::AlphaTest => stats.afunc_fail += 1,
        }
    }
}

/// The register values a draw is rendered with. Captured once per triangle, fill or LFB
/// write so later register writes can't change a draw in flight.
#[derive(Clone, Copy, Debug)]
pub struct PipelineRegs {
    pub color_path: FbzColorPath,
    pub fbz_mode: FbzMode,
    pub alpha_mode: AlphaMode,
    pub fog_mode: FogMode,
    pub tex_mode: [TextureMode; 2],
    pub za_color: u32,
    pub chroma_key: u32,
    pub chroma_range: ChromaRange,
    pub fog_color: Argb,
    pub color0: Argb,
    pub color1: Argb,
    /// Rotated by the stipple test, and written back when the draw is done.
    pub stipple: u32,
    pub clip_left_right: u32,
    pub clip_low_y_high_y: u32,
}

impl PipelineRegs {
    pub fn capture(regs: &RegisterFile) -> Self {
        Self {
            color_path: FbzColorPath(regs.get_u32(regs::FBZ_COLOR_PATH)),
            fbz_mode: FbzMode(regs.get_u32(regs::FBZ_MODE)),
            alpha_mode: AlphaMode(regs.get_u32(regs::ALPHA_MODE)),
            fog_mode: FogMode(regs.get_u32(regs::FOG_MODE)),
            tex_mode: [
                TextureMode(regs.banked(Bank::tmu(0), regs::TEXTURE_MODE).0),
                TextureMode(regs.banked(Bank::tmu(1), regs::TEXTURE_MODE).0),
            ],
            za_color: regs.get_u32(regs::ZA_COLOR),
            chroma_key: regs.get_u32(regs::CHROMA_KEY),
            chroma_range: ChromaRange(regs.get_u32(regs::CHROMA_RANGE)),
            fog_color: regs.get(regs::FOG_COLOR).as_argb(),
            color0: regs.get(regs::COLOR0).as_argb(),
            color1: regs.get(regs::COLOR1).as_argb(),
            stipple: regs.get_u32(regs::STIPPLE),
            clip_left_right: regs.get_u32(regs::CLIP_LEFT_RIGHT),
            clip_low_y_high_y: regs.get_u32(regs::CLIP_LOW_Y_HIGH_Y),
        }
    }

    /// The clip rectangle as left, right, top and bottom. Right and bottom are exclusive.
    pub fn clip_rect(&self) -> (i32, i32, i32, i32) {
        (
            ((self.clip_left_right >> 16) & 0x3ff) as i32,
            (self.clip_left_right & 0x3ff) as i32,
            ((self.clip_low_y_high_y >> 16) & 0x3ff) as i32,
            (self.clip_low_y_high_y & 0x3ff) as i32,
        )
    }
}

/// Where the pixels of a row are stored.
#[derive(Clone, Copy, Debug)]
pub struct Target {
    /// Byte offset of the color buffer.
    pub color: u32,
    /// Byte offset of the aux buffer, if there is one.
    pub aux: Option<u32>,
    /// Pixel offset of the row from the start of either buffer.
    pub row: u32,
}

impl Target {
    fn pixel(&self, x: i32) -> u32 {
        self.row.wrapping_add(x as u32)
    }
}

/// The depth of a pixel, and the floating point W it may have been derived from.
#[derive(Clone, Copy, Debug)]
pub struct Depth {
    pub value: i32,
    pub wfloat: i32,
}

pub fn stipple(regs: &mut PipelineRegs, x: i32, y: i32) -> Result<(), Reject> {
    if !regs.fbz_mode.stipple() {
        return Ok(());
    }
    if !regs.fbz_mode.stipple_pattern() {
        regs.stipple = regs.stipple.rotate_left(1);
        if regs.stipple & 0x8000_0000 == 0 {
            return Err(Reject::Stipple);
        }
    } else {
        let bit = ((y & 3) << 3) | (!x & 7);
        if (regs.stipple >> bit) & 1 == 0 {
            return Err(Reject::Stipple);
        }
    }
    Ok(())
}

/// Derive the depth of a pixel from the iterated Z or W.
pub fn depth_value(regs: &PipelineRegs, iterz: i32, iterw: i64) -> Depth {
    let wfloat = fixed::wfloat(iterw);

    let mut value = if !regs.fbz_mode.wbuffer_select() {
        clamped_z(iterz, regs.color_path.rgbzw_clamp())
    } else if !regs.fbz_mode.depth_float_select() {
        wfloat
    } else {
        fixed::zfloat(iterz)
    };

    if regs.fbz_mode.depth_bias() {
        value = (value + regs.za_color as i16 as i32).clamp(0, 0xffff);
    }

    Depth { value, wfloat }
}

pub fn depth_test(
    regs: &PipelineRegs,
    fbi: &Fbi,
    target: &Target,
    x: i32,
    depth: &Depth,
) -> Result<(), Reject> {
    if !regs.fbz_mode.depth_buffer() {
        return Ok(());
    }
    let src = if regs.fbz_mode.depth_source_compare() {
        regs.za_color as u16 as i32
    } else {
        depth.value
    };
    match regs.fbz_mode.depth_func() {
        CompareFunc::Never => Err(Reject::Depth),
        CompareFunc::Always => Ok(()),
        func => match target.aux {
            Some(aux) if !func.passes(src, fbi.load(aux, target.pixel(x)) as i32) => {
                Err(Reject::Depth)
            }
            _ => Ok(()),
        },
    }
}

/// Stipple, depth derivation and depth test. The first part of the pipeline, run before any
/// color is computed.
pub fn begin(
    regs: &mut PipelineRegs,
    fbi: &Fbi,
    target: &Target,
    x: i32,
    y: i32,
    iterz: i32,
    iterw: i64,
) -> Result<Depth, Reject> {
    stipple(regs, x, y)?;
    let depth = depth_value(regs, iterz, iterw);
    depth_test(regs, fbi, target, x, &depth)?;
    Ok(depth)
}

pub fn chroma_key(regs: &PipelineRegs, color: Argb) -> Result<(), Reject> {
    if !regs.fbz_mode.chroma_key() {
        return Ok(());
    }

    let range = regs.chroma_range;
    if !range.enabled() {
        if (color.0 ^ regs.chroma_key) & 0xffffff == 0 {
            return Err(Reject::Chroma);
        }
        return Ok(());
    }

    let key = Argb(regs.chroma_key);
    let in_range = |val: i32, low: i32, high: u32, exclusive: bool| {
        (low <= val && val <= high as i32) ^ exclusive
    };

    let results = (in_range(color.b(), key.b(), range.blue_high(), range.blue_exclusive()) as u32) << 2
        | (in_range(color.g(), key.g(), range.green_high(), range.green_exclusive()) as u32) << 1
        | in_range(color.r(), key.r(), range.red_high(), range.red_exclusive()) as u32;

    let rejected = if range.union_mode() {
        results != 0
    } else {
        results == 7
    };

    if rejected {
        Err(Reject::Chroma)
    } else {
        Ok(())
    }
}

pub fn alpha_mask(regs: &PipelineRegs, a: i32) -> Result<(), Reject> {
    if regs.fbz_mode.alpha_mask() && a & 1 == 0 {
        return Err(Reject::AlphaMask);
    }
    Ok(())
}

pub fn alpha_test(regs: &PipelineRegs, a: i32) -> Result<(), Reject> {
    let mode = regs.alpha_mode;
    if mode.alpha_test() && !mode.alpha_func().passes(a, mode.alpha_ref() as i32) {
        return Err(Reject::AlphaTest);
    }
    Ok(())
}

/// Inputs of the color combine unit.
#[derive(Clone, Copy, Debug)]
pub struct CombineInputs {
    /// The "other" color and alpha.
    pub other: Argb,
    /// The local color and alpha.
    pub local: Argb,
    /// Texture color as seen by the blend factor select.
    pub texel: Argb,
    /// Other alpha as seen by the blend factor select.
    pub other_alpha: i32,
}

/// The color combine unit of the frame buffer interface.
pub fn color_combine(path: FbzColorPath, inputs: &CombineInputs) -> Argb {
    let CombineInputs { other, local, texel, other_alpha } = *inputs;

    let (mut r, mut g, mut b) = if path.zero_other() {
        (0, 0, 0)
    } else {
        (other.r(), other.g(), other.b())
    };
    let mut a = if path.alpha_zero_other() { 0 } else { other.a() };

    if path.sub_clocal() {
        r -= local.r();
        g -= local.g();
        b -= local.b();
    }
    if path.alpha_sub_clocal() {
        a -= local.a();
    }

    let (mut blendr, mut blendg, mut blendb) = match path.mselect() {
        1 => (local.r(), local.g(), local.b()),
        2 => (other_alpha, other_alpha, other_alpha),
        3 => (local.a(), local.a(), local.a()),
        4 => (texel.a(), texel.a(), texel.a()),
        5 => (texel.r(), texel.g(), texel.b()),
        _ => (0, 0, 0),
    };
    let mut blenda = match path.alpha_mselect() {
        1 | 3 => local.a(),
        2 => other_alpha,
        4 => texel.a(),
        _ => 0,
    };

    if !path.reverse_blend() {
        blendr ^= 0xff;
        blendg ^= 0xff;
        blendb ^= 0xff;
    }
    if !path.alpha_reverse_blend() {
        blenda ^= 0xff;
    }

    r = (r * (blendr + 1)) >> 8;
    g = (g * (blendg + 1)) >> 8;
    b = (b * (blendb + 1)) >> 8;
    a = (a * (blenda + 1)) >> 8;

    match path.add_aclocal() {
        1 => {
            r += local.r();
            g += local.g();
            b += local.b();
        }
        2 => {
            r += local.a();
            g += local.a();
            b += local.a();
        }
        _ => (),
    }
    if path.alpha_add_aclocal() != 0 {
        a += local.a();
    }

    let mut r = r.clamp(0, 0xff);
    let mut g = g.clamp(0, 0xff);
    let mut b = b.clamp(0, 0xff);
    let mut a = a.clamp(0, 0xff);

    if path.invert_output() {
        r ^= 0xff;
        g ^= 0xff;
        b ^= 0xff;
    }
    if path.alpha_invert_output() {
        a ^= 0xff;
    }

    Argb::from_channels(a, r, g, b)
}

/// The local alpha selected by the color path.
pub fn local_alpha(path: FbzColorPath, iterated: i32, color0: Argb, iterz: i32, iterw: i64) -> i32 {
    match path.alpha_local_select() {
        1 => color0.a(),
        2 => clamped_z(iterz, path.rgbzw_clamp()) & 0xff,
        3 => clamped_w(iterw, path.rgbzw_clamp()) & 0xff,
        _ => iterated,
    }
}

/// Everything the second part of the pipeline needs to know about a pixel.
#[derive(Clone, Copy, Debug)]
pub struct Fragment {
    pub color: Argb,
    pub depth: Depth,
    pub iterz: i32,
    pub iterw: i64,
    /// Alpha used as the fog factor when fog comes from the iterated alpha.
    pub fog_alpha: i32,
}

type Channels = (i32, i32, i32);

pub fn fog(regs: &PipelineRegs, fbi: &Fbi, dither: &DitherRow, x: i32, frag: &Fragment) -> Channels {
    let (r, g, b) = (frag.color.r(), frag.color.g(), frag.color.b());
    let mode = regs.fog_mode;
    if !mode.enabled() {
        return (r, g, b);
    }

    let fog_color = regs.fog_color;
    let (fr, fg, fb) = if mode.constant() {
        (fog_color.r(), fog_color.g(), fog_color.b())
    } else {
        let (mut fr, mut fg, mut fb) = if mode.fog_add() {
            (0, 0, 0)
        } else {
            (fog_color.r(), fog_color.g(), fog_color.b())
        };
        if !mode.fog_mult() {
            fr -= r;
            fg -= g;
            fb -= b;
        }

        let wfloat = frag.depth.wfloat;
        let blend = match mode.zalpha() {
            0 => {
                let entry = (wfloat >> 10) as usize;
                let delta = fbi.fogdelta[entry] as i32;
                let mut deltaval = (delta & fbi.fogdelta_mask as i32) * ((wfloat >> 2) & 0xff);
                if mode.zones() && delta & 2 != 0 {
                    deltaval = -deltaval;
                }
                deltaval >>= 6;
                if mode.dither() {
                    if let Some(dith) = dither.dither4(x) {
                        deltaval += dith;
                    }
                }
                deltaval >>= 4;
                fbi.fogblend[entry] as i32 + deltaval
            }
            1 => frag.fog_alpha,
            2 => clamped_z(frag.iterz, regs.color_path.rgbzw_clamp()) >> 8,
            _ => clamped_w(frag.iterw, regs.color_path.rgbzw_clamp()),
        } + 1;

        ((fr * blend) >> 8, (fg * blend) >> 8, (fb * blend) >> 8)
    };

    let (r, g, b) = if mode.fog_mult() {
        (fr, fg, fb)
    } else {
        (r + fr, g + fg, b + fb)
    };

    (r.clamp(0, 0xff), g.clamp(0, 0xff), b.clamp(0, 0xff))
}

/// Blend the source color with the color buffer. `prefog` is the source color before fog.
pub fn alpha_blend(
    regs: &PipelineRegs,
    fbi: &Fbi,
    target: &Target,
    dither: &DitherRow,
    x: i32,
    src: Argb,
    prefog: Channels,
) -> Argb {
    let mode = regs.alpha_mode;
    if !mode.alpha_blend() {
        return src;
    }

    let pixel = target.pixel(x);
    let dpix = fbi.load(target.color, pixel) as i32;
    let mut dr = (dpix >> 8) & 0xf8;
    let mut dg = (dpix >> 3) & 0xfc;
    let mut db = (dpix << 3) & 0xf8;
    let da = match target.aux {
        Some(aux) if regs.fbz_mode.alpha_planes() => fbi.load(aux, pixel) as i32,
        _ => 0xff,
    };

    if regs.fbz_mode.alpha_dither_subtract() {
        if let Some(dith) = dither.dither(x) {
            dr = ((dr << 1) + 15 - dith) >> 1;
            dg = ((dg << 2) + 15 - dith) >> 2;
            db = ((db << 1) + 15 - dith) >> 1;
        }
    }

    let (sr, sg, sb, sa) = (src.r(), src.g(), src.b(), src.a());
    let scale = |c: i32, f: i32| (c * f) >> 8;

    let (mut r, mut g, mut b) = match mode.src_rgb_blend() {
        1 => (scale(sr, sa + 1), scale(sg, sa + 1), scale(sb, sa + 1)),
        2 => (scale(sr, dr + 1), scale(sg, dg + 1), scale(sb, db + 1)),
        3 => (scale(sr, da + 1), scale(sg, da + 1), scale(sb, da + 1)),
        4 => (sr, sg, sb),
        5 => (scale(sr, 0x100 - sa), scale(sg, 0x100 - sa), scale(sb, 0x100 - sa)),
        6 => (scale(sr, 0x100 - dr), scale(sg, 0x100 - dg), scale(sb, 0x100 - db)),
        7 => (scale(sr, 0x100 - da), scale(sg, 0x100 - da), scale(sb, 0x100 - da)),
        15 => {
            let ta = sa.min(0x100 - da) + 1;
            (scale(sr, ta), scale(sg, ta), scale(sb, ta))
        }
        _ => (0, 0, 0),
    };

    let (pr, pg, pb) = prefog;
    let (ar, ag, ab) = match mode.dst_rgb_blend() {
        1 => (scale(dr, sa + 1), scale(dg, sa + 1), scale(db, sa + 1)),
        2 => (scale(dr, sr + 1), scale(dg, sg + 1), scale(db, sb + 1)),
        3 => (scale(dr, da + 1), scale(dg, da + 1), scale(db, da + 1)),
        4 => (dr, dg, db),
        5 => (scale(dr, 0x100 - sa), scale(dg, 0x100 - sa), scale(db, 0x100 - sa)),
        6 => (scale(dr, 0x100 - sr), scale(dg, 0x100 - sg), scale(db, 0x100 - sb)),
        7 => (scale(dr, 0x100 - da), scale(dg, 0x100 - da), scale(db, 0x100 - da)),
        15 => (scale(dr, pr + 1), scale(dg, pg + 1), scale(db, pb + 1)),
        _ => (0, 0, 0),
    };
    r += ar;
    g += ag;
    b += ab;

    let mut a = 0;
    if mode.src_alpha_blend() == 4 {
        a = sa;
    }
    if mode.dst_alpha_blend() == 4 {
        a += da;
    }

    Argb::from_channels(a.clamp(0, 0xff), r.clamp(0, 0xff), g.clamp(0, 0xff), b.clamp(0, 0xff))
}

/// Fog, alpha blend and write out. The second part of the pipeline.
pub fn finish(
    regs: &PipelineRegs,
    fbi: &mut Fbi,
    target: &Target,
    dither: &DitherRow,
    x: i32,
    frag: &Fragment,
    stats: &mut Stats,
) {
    let prefog = (frag.color.r(), frag.color.g(), frag.color.b());
    let (r, g, b) = fog(regs, fbi, dither, x, frag);
    let color = Argb::from_channels(frag.color.a(), r, g, b);
    let color = alpha_blend(regs, fbi, target, dither, x, color, prefog);

    let pixel = target.pixel(x);
    if regs.fbz_mode.rgb_mask() {
        fbi.store(target.color, pixel, dither.pack_565(x, color.r(), color.g(), color.b()));
    }
    if let Some(aux) = target.aux {
        if regs.fbz_mode.aux_mask() {
            let val = if regs.fbz_mode.alpha_planes() {
                color.a()
            } else {
                frag.depth.value
            };
            fbi.store(aux, pixel, val as u16);
        }
    }

    stats.pixels_out += 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regs() -> PipelineRegs {
        PipelineRegs::capture(&RegisterFile::new())
    }

    #[test]
    fn stipple_rotation() {
        let mut regs = regs();
        regs.fbz_mode = FbzMode(1 << 2);
        regs.stipple = 0x4000_0000;
        assert_eq!(stipple(&mut regs, 0, 0), Ok(()));
        assert_eq!(regs.stipple, 0x8000_0000);
        assert_eq!(stipple(&mut regs, 1, 0), Err(Reject::Stipple));
        assert_eq!(regs.stipple, 0x0000_0001);
    }

    #[test]
    fn stipple_pattern() {
        let mut regs = regs();
        regs.fbz_mode = FbzMode(1 << 2 | 1 << 12);
        // Only x = 7 on row 1 passes.
        regs.stipple = 1 << 8;
        assert_eq!(stipple(&mut regs, 7, 1), Ok(()));
        assert_eq!(stipple(&mut regs, 6, 1), Err(Reject::Stipple));
        assert_eq!(stipple(&mut regs, 7, 0), Err(Reject::Stipple));
        assert_eq!(regs.stipple, 1 << 8);
    }

    #[test]
    fn chroma_exact_match() {
        let mut regs = regs();
        regs.fbz_mode = FbzMode(1 << 1);
        regs.chroma_key = 0xff00ff;
        assert_eq!(chroma_key(&regs, Argb(0x12ff00ff)), Err(Reject::Chroma));
        assert_eq!(chroma_key(&regs, Argb(0x00ff00fe)), Ok(()));
    }

    #[test]
    fn chroma_range_modes() {
        let mut regs = regs();
        regs.fbz_mode = FbzMode(1 << 1);
        regs.chroma_key = 0x101010;
        regs.chroma_range = ChromaRange(1 << 28 | 0x202020);
        assert_eq!(chroma_key(&regs, Argb(0x181818)), Err(Reject::Chroma));
        assert_eq!(chroma_key(&regs, Argb(0x188018)), Ok(()));

        regs.chroma_range = ChromaRange(1 << 28 | 1 << 27 | 0x202020);
        assert_eq!(chroma_key(&regs, Argb(0x188018)), Err(Reject::Chroma));
        assert_eq!(chroma_key(&regs, Argb(0x808080)), Ok(()));
    }

    #[test]
    fn alpha_stages() {
        let mut regs = regs();
        regs.fbz_mode = FbzMode(1 << 13);
        assert_eq!(alpha_mask(&regs, 2), Err(Reject::AlphaMask));
        assert_eq!(alpha_mask(&regs, 3), Ok(()));

        // Greater than 0x80.
        regs.alpha_mode = AlphaMode(1 | 4 << 1 | 0x80 << 24);
        assert_eq!(alpha_test(&regs, 0x80), Err(Reject::AlphaTest));
        assert_eq!(alpha_test(&regs, 0x81), Ok(()));
    }

    #[test]
    fn depth_bias_clamps() {
        let mut regs = regs();
        regs.fbz_mode = FbzMode(1 << 16);
        regs.za_color = 0xffff;
        assert_eq!(depth_value(&regs, 0, 0).value, 0);
        regs.za_color = 0x10;
        assert_eq!(depth_value(&regs, 0xfffe << 12, 0).value, 0xffff);
    }

    #[test]
    fn combine_passthrough_and_modulate() {
        let inputs = CombineInputs {
            other: Argb(0x80402010),
            local: Argb(0xff808080),
            texel: Argb(0),
            other_alpha: 0x80,
        };
        // Zero mselect without reverse blend multiplies by 0x100.
        assert_eq!(color_combine(FbzColorPath(0), &inputs), Argb(0x80402010));

        // Multiply by the local color, reversed.
        let path = FbzColorPath(1 << 10 | 1 << 13 | 1 << 22 | 1 << 19);
        let out = color_combine(path, &inputs);
        assert_eq!(out.r(), (0x40 * 0x81) >> 8);
        assert_eq!(out.a(), (0x80 * 0x100) >> 8);
    }

    #[test]
    fn blend_saturates() {
        let mut fbi = Fbi::new(crate::config::ChipType::Voodoo2, 1 << 20).unwrap();
        fbi.store(0, 0, 0xffff);
        let target = Target { color: 0, aux: None, row: 0 };
        let dither = DitherRow::new(FbzMode(0), 0);
        let mut regs = regs();

        // One plus one.
        regs.alpha_mode = AlphaMode(1 << 4 | 4 << 8 | 4 << 12 | 4 << 16 | 4 << 20);
        let out = alpha_blend(&regs, &fbi, &target, &dither, 0, Argb(0x80808080), (0, 0, 0));
        assert_eq!(out, Argb(0xffffffff));

        for src in 0..16 {
            for dst in 0..16 {
                regs.alpha_mode = AlphaMode(1 << 4 | src << 8 | dst << 12);
                let out = alpha_blend(&regs, &fbi, &target, &dither, 0, Argb(0xff00ff00), (0xff, 0, 0x80));
                assert_eq!(out.a(), 0);
            }
        }
    }

    #[test]
    fn constant_fog_adds() {
        let fbi = Fbi::new(crate::config::ChipType::Voodoo1, 1 << 20).unwrap();
        let dither = DitherRow::new(FbzMode(0), 0);
        let mut regs = regs();
        regs.fog_mode = FogMode(1 | 1 << 5);
        regs.fog_color = Argb(0x00102030);
        let frag = Fragment {
            color: Argb(0xff0a0a0a),
            depth: Depth { value: 0, wfloat: 0 },
            iterz: 0,
            iterw: 0,
            fog_alpha: 0,
        };
        assert_eq!(fog(&regs, &fbi, &dither, 0, &frag), (0x1a, 0x2a, 0x3a));

        regs.fog_mode = FogMode(1 | 1 << 2 | 1 << 5);
        assert_eq!(fog(&regs, &fbi, &dither, 0, &frag), (0x10, 0x20, 0x30));
    }
}
