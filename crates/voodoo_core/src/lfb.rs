//! Linear frame buffer access.
//!
//! Writes either go straight to memory or through the pixel pipeline, depending on `lfbMode`.
//! A single write carries one or two pixels.

use crate::color::{
    extract_1555, extract_555x, extract_565, extract_5551, extract_8888, extract_888x,
    extract_x555, extract_x888, Argb, Rgb,
};
use crate::dither::DitherRow;
use crate::fbi::Fbi;
use crate::raster::pipeline::{self, CombineInputs, Fragment, PipelineRegs, Reject, Target};
use crate::regs::{self, FbzMode, LfbMode};
use crate::stats::Stats;
use crate::{Voodoo, VoodooError};

const RGB_PRESENT: u32 = 0x1;
const ALPHA_PRESENT: u32 = 0x2;
const DEPTH_PRESENT: u32 = 0x4;
/// Depth in the upper half of a 32-bit write, belonging to the first pixel.
const DEPTH_PRESENT_MSW: u32 = 0x8;

#[derive(Clone, Copy, Default, Debug)]
struct LfbPixel {
    r: i32,
    g: i32,
    b: i32,
    a: i32,
    depth: i32,
}

/// The pixels of a single write.
#[derive(Debug)]
struct LfbWrite {
    pixels: [LfbPixel; 2],
    /// Four bits of `*_PRESENT` flags per pixel.
    mask: u32,
    /// Each pixel is 16 bits, so the write covers two pixels.
    packed: bool,
}

/// Swap the outer channels for the BGR lane orders.
fn lane_order(lanes: u32, (c0, c1, c2): Rgb) -> Rgb {
    if lanes & 1 != 0 {
        (c2, c1, c0)
    } else {
        (c0, c1, c2)
    }
}

/// Expand a 16-bit color of format 0 (5-6-5), 1 (x-5-5-5) or 2 (1-5-5-5).
fn expand_16(format: u32, lanes: u32, val: u32) -> (Rgb, Option<i32>) {
    let alpha_last = lanes >= 2;
    match format {
        0 => (lane_order(lanes, extract_565(val)), None),
        1 => {
            let rgb = if alpha_last { extract_555x(val) } else { extract_x555(val) };
            (lane_order(lanes, rgb), None)
        }
        _ => {
            let (rgb, a) = if alpha_last {
                let (c0, c1, c2, a) = extract_5551(val);
                ((c0, c1, c2), a)
            } else {
                let (a, c0, c1, c2) = extract_1555(val);
                ((c0, c1, c2), a)
            };
            (lane_order(lanes, rgb), Some(a))
        }
    }
}

impl LfbWrite {
    /// Decode a write. Returns `None` for reserved formats.
    fn decode(mode: LfbMode, data: u32, za_color: u32) -> Option<Self> {
        let lanes = mode.rgba_lanes();
        let format = mode.write_format();

        let default = LfbPixel {
            a: (za_color >> 24) as i32,
            depth: (za_color & 0xffff) as i32,
            ..Default::default()
        };
        let mut pixels = [default; 2];

        let set_color = |pixel: &mut LfbPixel, (r, g, b): Rgb, a: Option<i32>| {
            pixel.r = r;
            pixel.g = g;
            pixel.b = b;
            if let Some(a) = a {
                pixel.a = a;
            }
        };

        let (mask, packed) = match format {
            0..=2 => {
                for (i, pixel) in pixels.iter_mut().enumerate() {
                    let (rgb, a) = expand_16(format, lanes, data >> (16 * i));
                    set_color(pixel, rgb, a);
                }
                let present = if format == 2 { RGB_PRESENT | ALPHA_PRESENT } else { RGB_PRESENT };
                (present | present << 4, true)
            }
            4 => {
                let rgb = if lanes >= 2 { extract_888x(data) } else { extract_x888(data) };
                set_color(&mut pixels[0], lane_order(lanes, rgb), None);
                (RGB_PRESENT, false)
            }
            5 => {
                let (rgb, a) = if lanes >= 2 {
                    let (c0, c1, c2, a) = extract_8888(data);
                    ((c0, c1, c2), a)
                } else {
                    let (a, c0, c1, c2) = extract_8888(data);
                    ((c0, c1, c2), a)
                };
                set_color(&mut pixels[0], lane_order(lanes, rgb), Some(a));
                (RGB_PRESENT | ALPHA_PRESENT, false)
            }
            12..=14 => {
                pixels[0].depth = (data >> 16) as i32;
                let (rgb, a) = expand_16(format - 12, lanes, data & 0xffff);
                set_color(&mut pixels[0], rgb, a);
                let mut present = RGB_PRESENT | DEPTH_PRESENT_MSW;
                if format == 14 {
                    present |= ALPHA_PRESENT;
                }
                (present, false)
            }
            15 => {
                pixels[0].depth = (data & 0xffff) as i32;
                pixels[1].depth = (data >> 16) as i32;
                (DEPTH_PRESENT | DEPTH_PRESENT << 4, true)
            }
            _ => return None,
        };

        Some(Self { pixels, mask, packed })
    }
}

impl Voodoo {
    /// Write one or two pixels through the linear frame buffer. `offset` is in words and
    /// `mem_mask` selects the bytes of `data` that are written.
    pub(crate) fn lfb_write(&mut self, offset: u32, data: u32, mem_mask: u32) -> Result<(), VoodooError> {
        let mode = LfbMode(self.regs.get_u32(regs::LFB_MODE));

        let (mut data, mut mem_mask) = (data, mem_mask);
        if mode.byte_swizzle_writes() {
            data = data.swap_bytes();
            mem_mask = mem_mask.swap_bytes();
        }
        if mode.word_swap_writes() {
            data = data.rotate_left(16);
            mem_mask = mem_mask.rotate_left(16);
        }

        let za_color = self.regs.get_u32(regs::ZA_COLOR);
        let Some(write) = LfbWrite::decode(mode, data, za_color) else {
            trace!("LFB write with reserved format {} dropped", mode.write_format());
            return Ok(());
        };

        let offset = if write.packed { offset << 1 } else { offset };
        let x = (offset & 0x3ff) as i32;
        let y = ((offset >> 10) & 0x3ff) as i32;

        let mut mask = write.mask;
        if mem_mask & 0x0000_ffff == 0 {
            mask &= !(0x0f - DEPTH_PRESENT_MSW);
        }
        if mem_mask & 0xffff_0000 == 0 {
            mask &= !(0xf0 + DEPTH_PRESENT_MSW);
        }

        let Some(color) = self.fbi.select_buffer(mode.write_buffer()) else {
            error!("LFB write to reserved buffer {}", mode.write_buffer());
            return Err(VoodooError::Unsupported("LFB write to reserved buffer"));
        };

        trace!("LFB write ({x}, {y}) = {data:08x} & {mem_mask:08x}");

        if mode.pixel_pipeline() {
            self.lfb_write_pipelined(color, x, y, &write.pixels, mask);
        } else {
            self.lfb_write_raw(mode, color, x, y, &write.pixels, mask);
        }

        Ok(())
    }

    fn lfb_write_raw(&mut self, mode: LfbMode, color: u32, x: i32, y: i32, pixels: &[LfbPixel; 2], mask: u32) {
        let fbz_mode = FbzMode(self.regs.get_u32(regs::FBZ_MODE));
        let fbi = &mut self.fbi;

        let scry = if mode.y_origin() {
            (fbi.yorigin as i32 - y) & 0x3ff
        } else {
            y
        };

        let dither = DitherRow::new(fbz_mode, y);
        let destmax = fbi.pixels_after(color);
        let aux = fbi.auxoffs.map(|aux| (aux, fbi.pixels_after(aux)));
        let row = (scry as u32).wrapping_mul(fbi.rowpixels);

        for (i, pixel) in pixels.iter().enumerate() {
            let mask = mask >> (4 * i);
            if mask & 0x0f == 0 {
                continue;
            }

            let x = x + i as i32;
            let bufoffs = row.wrapping_add(x as u32);

            let has_rgb = mask & RGB_PRESENT != 0;
            let has_alpha = mask & ALPHA_PRESENT != 0 && fbz_mode.alpha_planes();
            let has_depth = mask & (DEPTH_PRESENT | DEPTH_PRESENT_MSW) != 0 && !fbz_mode.alpha_planes();

            if has_rgb && bufoffs < destmax {
                fbi.store(color, bufoffs, dither.pack_565(x, pixel.r, pixel.g, pixel.b));
            }

            if let Some((aux, depthmax)) = aux {
                if bufoffs < depthmax {
                    if has_alpha {
                        fbi.store(aux, bufoffs, pixel.a as u16);
                    }
                    if has_depth {
                        fbi.store(aux, bufoffs, pixel.depth as u16);
                    }
                }
            }

            self.stats.pixels_out += 1;
        }
    }

    fn lfb_write_pipelined(&mut self, color: u32, x: i32, y: i32, pixels: &[LfbPixel; 2], mask: u32) {
        let mut regs = PipelineRegs::capture(&self.regs);
        let fbz_mode = regs.fbz_mode;
        let fbi = &mut self.fbi;

        let scry = if fbz_mode.y_origin() {
            (fbi.yorigin as i32 - y) & 0x3ff
        } else {
            y
        };

        let target = Target {
            color,
            aux: fbi.auxoffs,
            row: (scry as u32).wrapping_mul(fbi.rowpixels),
        };
        let dither = DitherRow::new(fbz_mode, y);
        let (left, right, top, bottom) = regs.clip_rect();

        let mut stats = fbi.lfb_stats;

        for (i, pixel) in pixels.iter().enumerate() {
            let mask = mask >> (4 * i);
            if mask & 0x0f == 0 {
                continue;
            }

            let x = x + i as i32;
            stats.pixels_in += 1;

            if fbz_mode.clipping() && (x < left || x >= right || scry < top || scry >= bottom) {
                stats.clip_fail += 1;
                continue;
            }

            if let Err(reject) = lfb_pixel(&mut regs, fbi, &target, &dither, x, y, pixel, &mut stats) {
                reject.record(&mut stats);
            }
        }

        fbi.lfb_stats = stats;
        self.regs.set(regs::STIPPLE, regs.stipple);
    }

    /// Read two pixels through the linear frame buffer. `offset` is in words.
    pub(crate) fn lfb_read(&self, offset: u32) -> u32 {
        let mode = LfbMode(self.regs.get_u32(regs::LFB_MODE));
        let fbi = &self.fbi;

        let x = (offset << 1) & 0x3fe;
        let y = ((offset >> 9) & 0x3ff) as i32;

        let buffer = match mode.read_buffer() {
            0 | 1 => fbi.select_buffer(mode.read_buffer()),
            2 => fbi.auxoffs,
            _ => None,
        };
        let Some(buffer) = buffer else {
            return 0xffff_ffff;
        };

        let scry = if mode.y_origin() {
            (fbi.yorigin as i32 - y) & 0x3ff
        } else {
            y
        };

        let bufoffs = (scry as u32).wrapping_mul(fbi.rowpixels).wrapping_add(x);
        if bufoffs >= fbi.pixels_after(buffer) {
            return 0xffff_ffff;
        }

        let mut data = fbi.load(buffer, bufoffs) as u32 | (fbi.load(buffer, bufoffs + 1) as u32) << 16;
        if mode.word_swap_reads() {
            data = data.rotate_left(16);
        }
        if mode.byte_swizzle_reads() {
            data = data.swap_bytes();
        }

        trace!("LFB read ({x}, {y}) = {data:08x}");

        data
    }
}

/// Run a written pixel through the pipeline. The written color takes the place of the
/// iterated color, and there is no texture.
#[allow(clippy::too_many_arguments)]
fn lfb_pixel(
    regs: &mut PipelineRegs,
    fbi: &mut Fbi,
    target: &Target,
    dither: &DitherRow,
    x: i32,
    y: i32,
    pixel: &LfbPixel,
    stats: &mut Stats,
) -> Result<(), Reject> {
    let iterz = pixel.depth << 12;
    let iterw = (pixel.depth as i64) << (30 - 16);

    let depth = pipeline::begin(regs, fbi, target, x, y, iterz, iterw)?;

    let written = Argb::from_channels(pixel.a, pixel.r, pixel.g, pixel.b);
    pipeline::chroma_key(regs, written)?;
    pipeline::alpha_mask(regs, written.a())?;
    pipeline::alpha_test(regs, written.a())?;

    let path = regs.color_path;
    let use_color0 = if path.local_select_override() {
        written.a() & 0x80 != 0
    } else {
        path.local_select()
    };
    let c_local = if use_color0 { regs.color0 } else { written };
    let a_local = pipeline::local_alpha(path, written.a(), regs.color0, iterz, iterw);

    let color = pipeline::color_combine(path, &CombineInputs {
        other: written,
        local: c_local.with_alpha(a_local),
        texel: Argb(0),
        other_alpha: 0,
    });

    let frag = Fragment {
        color,
        depth,
        iterz,
        iterw,
        fog_alpha: (regs.za_color >> 24) as i32,
    };
    pipeline::finish(regs, fbi, target, dither, x, &frag, stats);

    Ok(())
}
