//! Triangle commands, the setup engine, fast fills and buffer swaps.

use crate::dither::DitherRow;
use crate::fbi::{SetupVertex, Vertices};
use crate::fixed::round_coordinate;
use crate::raster::{PipelineRegs, Poly};
use crate::regs::{self, FbzColorPath};
use crate::tmu::TexGradients;
use crate::{Voodoo, VoodooError};

use voodoo_util::Bit;

use std::mem;

/// Walk the rows covered by a triangle. `span` is called with the row and the half open range
/// of pixel columns, which may be empty.
pub(crate) fn scan_convert(verts: [(f32, f32); 3], mut span: impl FnMut(i32, i32, i32)) {
    let [mut v1, mut v2, mut v3] = verts;

    if v2.1 < v1.1 {
        mem::swap(&mut v1, &mut v2);
    }
    if v3.1 < v2.1 {
        mem::swap(&mut v2, &mut v3);
        if v2.1 < v1.1 {
            mem::swap(&mut v1, &mut v2);
        }
    }

    let v1y = round_coordinate(v1.1);
    let v3y = round_coordinate(v3.1);
    if v3y - v1y <= 0 {
        return;
    }

    let slope = |a: (f32, f32), b: (f32, f32)| {
        if a.1 == b.1 {
            0.0
        } else {
            (b.0 - a.0) / (b.1 - a.1)
        }
    };

    let dxdy_v1v2 = slope(v1, v2);
    let dxdy_v1v3 = slope(v1, v3);
    let dxdy_v2v3 = slope(v2, v3);

    for y in v1y..v3y {
        let fully = y as f32 + 0.5;
        let startx = v1.0 + (fully - v1.1) * dxdy_v1v3;
        let stopx = if fully < v2.1 {
            v1.0 + (fully - v1.1) * dxdy_v1v2
        } else {
            v2.0 + (fully - v2.1) * dxdy_v2v3
        };

        let mut istartx = round_coordinate(startx);
        let mut istopx = round_coordinate(stopx);
        if istartx > istopx {
            mem::swap(&mut istartx, &mut istopx);
        }
        if istartx >= istopx {
            istartx = 0;
            istopx = 0;
        }

        span(y, istartx, istopx);
    }
}

/// Offset `start` by a 16th of the gradients scaled by `dx` and `dy`.
fn nudge_32(start: i32, dndx: i32, dndy: i32, dx: i32, dy: i32) -> i32 {
    start.wrapping_add(dy.wrapping_mul(dndy).wrapping_add(dx.wrapping_mul(dndx)) >> 4)
}

fn nudge_64(start: i64, dndx: i64, dndy: i64, dx: i32, dy: i32) -> i64 {
    let delta = (dy as i64).wrapping_mul(dndy).wrapping_add((dx as i64).wrapping_mul(dndx));
    start.wrapping_add(delta >> 4)
}

fn nudge_tex(grad: &mut TexGradients, dx: i32, dy: i32) {
    grad.startw = nudge_64(grad.startw, grad.dwdx, grad.dwdy, dx, dy);
    grad.starts = nudge_64(grad.starts, grad.dsdx, grad.dsdy, dx, dy);
    grad.startt = nudge_64(grad.startt, grad.dtdx, grad.dtdy, dx, dy);
}

/// Gradients of the setup engine, computed from three vertices.
struct Plane {
    verts: [SetupVertex; 3],
    divisor: f32,
    dx1: f32,
    dx2: f32,
    dy1: f32,
    dy2: f32,
}

impl Plane {
    fn new(verts: [SetupVertex; 3], divisor: f32) -> Self {
        let [v0, v1, v2] = verts;
        Self {
            verts,
            divisor,
            dx1: v0.y - v2.y,
            dx2: v0.y - v1.y,
            dy1: v0.x - v1.x,
            dy2: v0.x - v2.x,
        }
    }

    fn deltas(&self, param: fn(&SetupVertex) -> f32, tdiv: f32) -> (f32, f32) {
        let [p0, p1, p2] = self.verts.map(|v| param(&v));
        (
            ((p0 - p1) * self.dx1 - (p0 - p2) * self.dx2) * tdiv,
            ((p0 - p2) * self.dy1 - (p0 - p1) * self.dy2) * tdiv,
        )
    }

    /// Start value and X and Y gradients in 12 bit fixed point.
    fn fixed_12(&self, param: fn(&SetupVertex) -> f32) -> (i32, i32, i32) {
        let (dx, dy) = self.deltas(param, self.divisor * 4096.0);
        ((param(&self.verts[0]) * 4096.0) as i32, dx as i32, dy as i32)
    }

    /// Start value and X and Y gradients in 32 bit fixed point.
    fn fixed_32(&self, param: fn(&SetupVertex) -> f32) -> (i64, i64, i64) {
        let scale = 65536.0 * 65536.0;
        let (dx, dy) = self.deltas(param, self.divisor * scale);
        ((param(&self.verts[0]) * scale) as i64, dx as i64, dy as i64)
    }
}

impl Voodoo {
    /// Number of texture units taking part in a triangle.
    fn texcount(&self) -> usize {
        let path = FbzColorPath(self.regs.get_u32(regs::FBZ_COLOR_PATH));
        let init3 = self.regs.get_u32(regs::FBI_INIT3);
        if init3.bit(6) || !path.texture_enable() {
            0
        } else if self.chipmask & 0x04 != 0 {
            2
        } else {
            1
        }
    }

    /// Draw the triangle described by the vertex and gradient registers.
    pub(crate) fn triangle(&mut self) -> Result<(), VoodooError> {
        let texcount = self.texcount();
        let path = FbzColorPath(self.regs.get_u32(regs::FBZ_COLOR_PATH));

        if path.subpixel_adjust() {
            let dx = 8 - (self.fbi.verts.ax as i32 & 15);
            let dy = 8 - (self.fbi.verts.ay as i32 & 15);

            let grad = &mut self.fbi.grad;
            grad.startr = nudge_32(grad.startr, grad.drdx, grad.drdy, dx, dy);
            grad.startg = nudge_32(grad.startg, grad.dgdx, grad.dgdy, dx, dy);
            grad.startb = nudge_32(grad.startb, grad.dbdx, grad.dbdy, dx, dy);
            grad.starta = nudge_32(grad.starta, grad.dadx, grad.dady, dx, dy);
            grad.startw = nudge_64(grad.startw, grad.dwdx, grad.dwdy, dx, dy);
            grad.startz = grad
                .startz
                .wrapping_add(((dy as i64 * grad.dzdy as i64) >> 4) as i32)
                .wrapping_add(((dx as i64 * grad.dzdx as i64) >> 4) as i32);

            for tmu in self.tmus.iter_mut().take(texcount) {
                nudge_tex(&mut tmu.grad, dx, dy);
            }
        }

        let fbz_mode = regs::FbzMode(self.regs.get_u32(regs::FBZ_MODE));
        let Some(color) = self.fbi.select_buffer(fbz_mode.draw_buffer()) else {
            trace!("Triangle to reserved draw buffer dropped");
            return Ok(());
        };

        self.rasterize(color, texcount)?;

        let count = self.regs.get_u32(regs::FBI_TRIANGLES_OUT);
        self.regs.set(regs::FBI_TRIANGLES_OUT, count.wrapping_add(1));

        Ok(())
    }

    /// Snapshot the triangle state and draw it into the color buffer at `color`.
    fn rasterize(&mut self, color: u32, texcount: usize) -> Result<(), VoodooError> {
        let regs = PipelineRegs::capture(&self.regs);

        let info = self.raster.resolve(&regs, texcount)?;
        info.polys += 1;
        let routine = info.routine;

        let mut tex = [TexGradients::default(); 2];
        let mut lodbase = [0; 2];
        for (unit, tmu) in self.tmus.iter_mut().enumerate().take(texcount) {
            lodbase[unit] = tmu.prepare(&self.regs)?;
            tex[unit] = tmu.grad;
        }

        let Vertices { ax, ay, bx, by, cx, cy } = self.fbi.verts;
        let mut poly = Poly {
            regs,
            grad: self.fbi.grad,
            tex,
            lodbase,
            ax,
            ay,
            color,
            send_config: self.send_config,
            tmu_config: self.tmu_config,
        };

        let point = |x: i16, y: i16| (x as f32 / 16.0, y as f32 / 16.0);
        let verts = [point(ax, ay), point(bx, by), point(cx, cy)];

        let (fbi, tmus, stats) = (&mut self.fbi, &self.tmus, &mut self.stats);
        scan_convert(verts, |y, startx, stopx| {
            routine.draw(&mut poly, fbi, tmus, stats, y, startx, stopx);
        });

        self.regs.set(regs::STIPPLE, poly.regs.stipple);

        Ok(())
    }

    fn setup_vertex(&self) -> SetupVertex {
        let f = |reg: usize| self.regs.get(reg).as_f32();
        SetupVertex {
            x: f(regs::S_VX),
            y: f(regs::S_VY),
            z: f(regs::S_VZ),
            wb: f(regs::S_WB),
            r: f(regs::S_RED),
            g: f(regs::S_GREEN),
            b: f(regs::S_BLUE),
            a: f(regs::S_ALPHA),
            s0: f(regs::S_S_WTMU0),
            t0: f(regs::S_T_WTMU0),
            w0: f(regs::S_WTMU0),
            s1: f(regs::S_S_WTMU1),
            t1: f(regs::S_T_WTMU1),
            w1: f(regs::S_WTMU1),
        }
    }

    /// Start a new strip or fan with the vertex in the setup registers.
    pub(crate) fn begin_triangle(&mut self) {
        let vertex = self.setup_vertex();
        self.fbi.svert = [vertex; 3];
        self.fbi.sverts = 1;
    }

    /// Add the vertex in the setup registers, and draw once there are three.
    pub(crate) fn draw_triangle(&mut self) -> Result<(), VoodooError> {
        let fan = self.regs.get_u32(regs::S_SETUP_MODE).bit(16);
        if !fan {
            self.fbi.svert[0] = self.fbi.svert[1];
        }
        self.fbi.svert[1] = self.fbi.svert[2];
        self.fbi.svert[2] = self.setup_vertex();

        self.fbi.sverts += 1;
        if self.fbi.sverts >= 3 {
            self.setup_and_draw()?;
        }

        Ok(())
    }

    /// Derive the vertex and gradient registers from the setup vertices and draw.
    fn setup_and_draw(&mut self) -> Result<(), VoodooError> {
        let verts = self.fbi.svert;
        let [v0, v1, v2] = verts;
        let mode = self.regs.get_u32(regs::S_SETUP_MODE);

        self.fbi.verts = Vertices {
            ax: (v0.x * 16.0) as i16,
            ay: (v0.y * 16.0) as i16,
            bx: (v1.x * 16.0) as i16,
            by: (v1.y * 16.0) as i16,
            cx: (v2.x * 16.0) as i16,
            cy: (v2.y * 16.0) as i16,
        };

        let divisor = 1.0 / ((v0.x - v1.x) * (v0.y - v2.y) - (v0.x - v2.x) * (v0.y - v1.y));

        if mode.bit(17) {
            let mut culling_sign = mode.bit(18);
            // Strips alternate winding when ping pong is enabled.
            if mode & 0x90000 == 0 {
                culling_sign ^= (self.fbi.sverts - 3) & 1 != 0;
            }
            if (divisor < 0.0) == culling_sign {
                return Ok(());
            }
        }

        if !divisor.is_finite() {
            trace!("Degenerate setup triangle dropped");
            return Ok(());
        }

        let plane = Plane::new(verts, divisor);

        if mode.bit(0) {
            let grad = &mut self.fbi.grad;
            (grad.startr, grad.drdx, grad.drdy) = plane.fixed_12(|v| v.r);
            (grad.startg, grad.dgdx, grad.dgdy) = plane.fixed_12(|v| v.g);
            (grad.startb, grad.dbdx, grad.dbdy) = plane.fixed_12(|v| v.b);
        }
        if mode.bit(1) {
            let grad = &mut self.fbi.grad;
            (grad.starta, grad.dadx, grad.dady) = plane.fixed_12(|v| v.a);
        }
        if mode.bit(2) {
            let grad = &mut self.fbi.grad;
            (grad.startz, grad.dzdx, grad.dzdy) = plane.fixed_12(|v| v.z);
        }

        if mode.bit(3) {
            let (start, dx, dy) = plane.fixed_32(|v| v.wb);
            let grad = &mut self.fbi.grad;
            (grad.startw, grad.dwdx, grad.dwdy) = (start, dx, dy);
            for tmu in self.tmus.iter_mut() {
                (tmu.grad.startw, tmu.grad.dwdx, tmu.grad.dwdy) = (start, dx, dy);
            }
        }
        if mode.bit(4) {
            let w = plane.fixed_32(|v| v.w0);
            for tmu in self.tmus.iter_mut() {
                (tmu.grad.startw, tmu.grad.dwdx, tmu.grad.dwdy) = w;
            }
        }
        if mode.bit(5) {
            let s = plane.fixed_32(|v| v.s0);
            let t = plane.fixed_32(|v| v.t0);
            for tmu in self.tmus.iter_mut() {
                (tmu.grad.starts, tmu.grad.dsdx, tmu.grad.dsdy) = s;
                (tmu.grad.startt, tmu.grad.dtdx, tmu.grad.dtdy) = t;
            }
        }
        if let Some(tmu) = self.tmus.get_mut(1) {
            if mode.bit(6) {
                (tmu.grad.startw, tmu.grad.dwdx, tmu.grad.dwdy) = plane.fixed_32(|v| v.w1);
            }
            if mode.bit(7) {
                (tmu.grad.starts, tmu.grad.dsdx, tmu.grad.dsdy) = plane.fixed_32(|v| v.s1);
                (tmu.grad.startt, tmu.grad.dtdx, tmu.grad.dtdy) = plane.fixed_32(|v| v.t1);
            }
        }

        self.triangle()
    }

    /// Clear the clip rectangle of the draw buffer to `color1` and the aux buffer to the depth
    /// in `zaColor`.
    pub(crate) fn fastfill(&mut self) {
        let regs = PipelineRegs::capture(&self.regs);
        let fbz_mode = regs.fbz_mode;

        if !fbz_mode.rgb_mask() && !fbz_mode.aux_mask() {
            return;
        }

        // An inverted rectangle fills nothing, but its negative width is still counted.
        let (startx, stopx, top, bottom) = regs.clip_rect();

        let color = if fbz_mode.rgb_mask() {
            self.fbi.select_buffer(fbz_mode.draw_buffer())
        } else {
            None
        };
        let aux = if fbz_mode.aux_mask() { self.fbi.auxoffs } else { None };

        let mut pattern = [[0u16; 4]; 4];
        for (y, row) in pattern.iter_mut().enumerate() {
            let dither = DitherRow::new(fbz_mode, y as i32);
            for (x, pixel) in row.iter_mut().enumerate() {
                let c = regs.color1;
                *pixel = dither.pack_565(x as i32, c.r(), c.g(), c.b());
            }
        }

        let depth = regs.za_color as u16;
        let rowpixels = self.fbi.rowpixels as i64;
        let mem_bytes = self.fbi.mem_bytes() as i64;

        for y in top..bottom {
            let scry = if fbz_mode.y_origin() {
                (self.fbi.yorigin as i32 - y) & 0x3ff
            } else {
                y
            };
            let row = scry as i64 * rowpixels;

            if let Some(color) = color {
                for x in startx..stopx {
                    let pixel = (row + x as i64) as u32;
                    self.fbi.store(color, pixel, pattern[(y & 3) as usize][(x & 3) as usize]);
                }
                self.stats.pixels_out = self.stats.pixels_out.wrapping_add((stopx - startx) as u32);
            }

            if let Some(aux) = aux {
                // The aux buffer is last in memory and the fill stops at its end.
                let mut stopx = stopx as i64;
                if aux as i64 + 2 * (row + stopx) >= mem_bytes - 1 {
                    stopx = (mem_bytes - 1 - aux as i64) / 2 - row;
                }
                for x in startx as i64..stopx {
                    self.fbi.store(aux, (row + x) as u32, depth);
                }
            }
        }

        trace!("Fast fill {startx}..{stopx} x {top}..{bottom}");
    }

    /// Swap the front and back buffer.
    pub(crate) fn swapbuffer(&mut self, data: u32) {
        self.fbi.vblank_dont_swap = data.bit(9);

        let history = self.regs.get_u32(regs::FBI_SWAP_HISTORY);
        self.regs.set(regs::FBI_SWAP_HISTORY, history << 4);

        self.fbi.rotate_buffers(self.chip);

        debug!("Buffer swap, front buffer is now {}", self.fbi.frontbuf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(verts: [(f32, f32); 3]) -> Vec<(i32, i32, i32)> {
        let mut spans = Vec::new();
        scan_convert(verts, |y, start, stop| spans.push((y, start, stop)));
        spans
    }

    #[test]
    fn right_triangle_spans() {
        // Exact halves round down, so the first row is empty.
        let spans = spans([(0.0, 0.0), (0.0, 4.0), (4.0, 4.0)]);
        assert_eq!(spans, vec![(0, 0, 0), (1, 0, 1), (2, 0, 2), (3, 0, 3)]);
    }

    #[test]
    fn vertex_order_doesnt_matter() {
        let a = spans([(1.0, 1.0), (9.0, 3.0), (4.0, 8.0)]);
        let b = spans([(4.0, 8.0), (1.0, 1.0), (9.0, 3.0)]);
        let c = spans([(9.0, 3.0), (4.0, 8.0), (1.0, 1.0)]);
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn flat_triangle_is_empty() {
        assert!(spans([(0.0, 2.0), (5.0, 2.0), (9.0, 2.2)]).is_empty());
    }

    #[test]
    fn flat_top_spans() {
        let expected: Vec<_> = (0..16).map(|y| (y, 0, 15 - y)).collect();
        assert_eq!(spans([(0.0, 0.0), (16.0, 0.0), (0.0, 16.0)]), expected);
    }

    #[test]
    fn setup_gradients() {
        let vertex = |x: f32, y: f32, r: f32| SetupVertex { x, y, r, ..Default::default() };
        let verts = [vertex(0.0, 0.0, 0.0), vertex(4.0, 0.0, 4.0), vertex(0.0, 4.0, 0.0)];
        let [v0, v1, v2] = verts;
        let area = (v0.x - v1.x) * (v0.y - v2.y) - (v0.x - v2.x) * (v0.y - v1.y);
        let plane = Plane::new(verts, 1.0 / area);

        // Red rises by one per pixel along X and stays flat along Y.
        let (start, dx, dy) = plane.fixed_12(|v| v.r);
        assert_eq!((start, dx, dy), (0, 4096, 0));
    }
}
