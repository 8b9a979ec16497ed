use super::pipeline::{self, CombineInputs, Fragment, PipelineRegs, Reject, Target};

use crate::color::Argb;
use crate::dither::DitherRow;
use crate::fbi::{Fbi, Gradients};
use crate::fixed::clamped_channel;
use crate::stats::Stats;
use crate::tmu::{TexGradients, Tmu, MAX_LOD};

/// Everything needed to rasterize a triangle, captured when it's submitted.
#[derive(Clone, Copy, Debug)]
pub struct Poly {
    pub regs: PipelineRegs,
    pub grad: Gradients,
    pub tex: [TexGradients; 2],
    pub lodbase: [i32; 2],
    /// Vertex A in 12.4, the origin of the gradients.
    pub ax: i16,
    pub ay: i16,
    /// Byte offset of the color buffer drawn to.
    pub color: u32,
    /// Replace the output of texture unit 0 with `tmu_config`.
    pub send_config: bool,
    pub tmu_config: u32,
}

/// The iterated parameters at a pixel.
#[derive(Clone, Copy)]
struct Iterators {
    r: i32,
    g: i32,
    b: i32,
    a: i32,
    z: i32,
    w: i64,
    s: [i64; 2],
    t: [i64; 2],
    tw: [i64; 2],
}

impl Iterators {
    fn start<const TMUS: usize>(poly: &Poly, dx: i32, dy: i32) -> Self {
        let grad = &poly.grad;
        let at = |start: i32, dndx: i32, dndy: i32| {
            start.wrapping_add(dy.wrapping_mul(dndy)).wrapping_add(dx.wrapping_mul(dndx))
        };
        let at_64 = |start: i64, dndx: i64, dndy: i64| {
            start
                .wrapping_add((dy as i64).wrapping_mul(dndy))
                .wrapping_add((dx as i64).wrapping_mul(dndx))
        };

        let mut iters = Self {
            r: at(grad.startr, grad.drdx, grad.drdy),
            g: at(grad.startg, grad.dgdx, grad.dgdy),
            b: at(grad.startb, grad.dbdx, grad.dbdy),
            a: at(grad.starta, grad.dadx, grad.dady),
            z: at(grad.startz, grad.dzdx, grad.dzdy),
            w: at_64(grad.startw, grad.dwdx, grad.dwdy),
            s: [0; 2],
            t: [0; 2],
            tw: [0; 2],
        };

        for (unit, tex) in poly.tex.iter().enumerate().take(TMUS) {
            iters.s[unit] = at_64(tex.starts, tex.dsdx, tex.dsdy);
            iters.t[unit] = at_64(tex.startt, tex.dtdx, tex.dtdy);
            iters.tw[unit] = at_64(tex.startw, tex.dwdx, tex.dwdy);
        }

        iters
    }

    fn step<const TMUS: usize>(&mut self, poly: &Poly) {
        let grad = &poly.grad;
        self.r = self.r.wrapping_add(grad.drdx);
        self.g = self.g.wrapping_add(grad.dgdx);
        self.b = self.b.wrapping_add(grad.dbdx);
        self.a = self.a.wrapping_add(grad.dadx);
        self.z = self.z.wrapping_add(grad.dzdx);
        self.w = self.w.wrapping_add(grad.dwdx);

        for (unit, tex) in poly.tex.iter().enumerate().take(TMUS) {
            self.s[unit] = self.s[unit].wrapping_add(tex.dsdx);
            self.t[unit] = self.t[unit].wrapping_add(tex.dtdx);
            self.tw[unit] = self.tw[unit].wrapping_add(tex.dwdx);
        }
    }
}

/// Whether a texture unit takes part. Drivers disable a unit by setting its minimum LOD to 8.
fn unit_active(tmu: &Tmu) -> bool {
    tmu.lodmin < (MAX_LOD as i32) << 8
}

/// Draw the span `startx..stopx` of row `y` with `TMUS` texture units.
pub fn scanline<const TMUS: usize>(
    poly: &mut Poly,
    fbi: &mut Fbi,
    tmus: &[Tmu],
    stats: &mut Stats,
    y: i32,
    mut startx: i32,
    mut stopx: i32,
) {
    let fbz_mode = poly.regs.fbz_mode;

    let scry = if fbz_mode.y_origin() {
        (fbi.yorigin as i32 - y) & 0x3ff
    } else {
        y
    };

    let dither = DitherRow::new(fbz_mode, y);

    if fbz_mode.clipping() {
        let (left, right, top, bottom) = poly.regs.clip_rect();

        // Y clipping rejects the whole row.
        if scry < top || scry >= bottom {
            let width = (stopx - startx) as u32;
            stats.pixels_in += width;
            stats.clip_fail += width;
            return;
        }

        if startx < left {
            stats.pixels_in += (left - startx) as u32;
            startx = left;
        }
        if stopx >= right {
            stats.pixels_in += (stopx - right) as u32;
            stopx = right - 1;
        }
    }

    let target = Target {
        color: poly.color,
        aux: fbi.auxoffs,
        row: (scry as u32).wrapping_mul(fbi.rowpixels),
    };

    let dx = startx - (poly.ax as i32 >> 4);
    let dy = y - (poly.ay as i32 >> 4);
    let mut iters = Iterators::start::<TMUS>(poly, dx, dy);

    for x in startx..stopx {
        stats.pixels_in += 1;
        if let Err(reject) = pixel::<TMUS>(poly, fbi, tmus, stats, &target, &dither, &iters, x, y) {
            reject.record(stats);
        }
        iters.step::<TMUS>(poly);
    }
}

#[allow(clippy::too_many_arguments)]
fn pixel<const TMUS: usize>(
    poly: &mut Poly,
    fbi: &mut Fbi,
    tmus: &[Tmu],
    stats: &mut Stats,
    target: &Target,
    dither: &DitherRow,
    iters: &Iterators,
    x: i32,
    y: i32,
) -> Result<(), Reject> {
    let depth = pipeline::begin(&mut poly.regs, fbi, target, x, y, iters.z, iters.w)?;
    let regs = &poly.regs;

    // Unit 1 feeds unit 0 as its "other" color.
    let mut texel = Argb(0);
    if TMUS >= 2 && unit_active(&tmus[1]) {
        texel = tmus[1].sample(
            regs.tex_mode[1],
            dither.dither4(x),
            texel,
            poly.lodbase[1],
            iters.s[1],
            iters.t[1],
            iters.tw[1],
        );
    }
    if TMUS >= 1 && unit_active(&tmus[0]) {
        texel = if poly.send_config {
            Argb(poly.tmu_config)
        } else {
            tmus[0].sample(
                regs.tex_mode[0],
                dither.dither4(x),
                texel,
                poly.lodbase[0],
                iters.s[0],
                iters.t[0],
                iters.tw[0],
            )
        };
    }

    let path = regs.color_path;
    let clamp = path.rgbzw_clamp();
    let iterated = Argb::from_channels(
        clamped_channel(iters.a, clamp),
        clamped_channel(iters.r, clamp),
        clamped_channel(iters.g, clamp),
        clamped_channel(iters.b, clamp),
    );

    let c_other = match path.rgb_select() {
        0 => iterated,
        1 => texel,
        2 => regs.color1,
        _ => Argb(0),
    };
    pipeline::chroma_key(regs, c_other)?;

    let a_other = match path.alpha_select() {
        0 => iterated.a(),
        1 => texel.a(),
        2 => regs.color1.a(),
        _ => 0,
    };
    pipeline::alpha_mask(regs, a_other)?;
    pipeline::alpha_test(regs, a_other)?;

    let use_color0 = if path.local_select_override() {
        texel.a() & 0x80 != 0
    } else {
        path.local_select()
    };
    let c_local = if use_color0 { regs.color0 } else { iterated };
    let a_local = pipeline::local_alpha(path, iterated.a(), regs.color0, iters.z, iters.w);

    let color = pipeline::color_combine(path, &CombineInputs {
        other: c_other.with_alpha(a_other),
        local: c_local.with_alpha(a_local),
        texel,
        other_alpha: a_other,
    });

    let frag = Fragment {
        color,
        depth,
        iterz: iters.z,
        iterw: iters.w,
        fog_alpha: iterated.a(),
    };
    pipeline::finish(regs, fbi, target, dither, x, &frag, stats);

    Ok(())
}
