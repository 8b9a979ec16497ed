//! Rasterizer selection and the per scanline pixel routines.
//!
//! Every distinct pipeline configuration gets an entry in [`RasterCache`], keyed by the mode
//! registers with the bits that don't change the shape of the pipeline cleared. All entries
//! currently use the generic routine for their texture unit count.

pub mod pipeline;
mod scanline;

pub use pipeline::{PipelineRegs, Reject, Target};
pub use scanline::{scanline, Poly};

use crate::fbi::Fbi;
use crate::regs::{AlphaMode, FogMode, TextureMode};
use crate::stats::Stats;
use crate::tmu::Tmu;
use crate::VoodooError;

/// The mode registers of a draw with don't care bits cleared.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RasterKey {
    pub color_path: u32,
    pub alpha_mode: u32,
    pub fog_mode: u32,
    pub fbz_mode: u32,
    pub tex_mode: [u32; 2],
}

impl RasterKey {
    pub fn new(regs: &PipelineRegs, texcount: usize) -> Self {
        let tex_mode = |unit: usize| {
            if texcount > unit {
                normalize_tex_mode(regs.tex_mode[unit])
            } else {
                0xffff_ffff
            }
        };
        Self {
            color_path: regs.color_path.0 & !(1 << 26 | 1 << 27),
            alpha_mode: normalize_alpha_mode(regs.alpha_mode),
            fog_mode: normalize_fog_mode(regs.fog_mode),
            fbz_mode: regs.fbz_mode.0 & !(3 << 14),
            tex_mode: [tex_mode(0), tex_mode(1)],
        }
    }

    /// Index of the bucket the key belongs in.
    pub fn bucket(&self) -> usize {
        let fields = [
            self.fbz_mode,
            self.alpha_mode,
            self.fog_mode,
            self.tex_mode[0],
            self.tex_mode[1],
        ];
        let hash = fields
            .iter()
            .fold(self.color_path, |hash, field| hash.rotate_left(1) ^ field);
        hash as usize % RasterCache::BUCKETS
    }
}

fn normalize_alpha_mode(mode: AlphaMode) -> u32 {
    let mut val = mode.0 & 0x00ff_ffff;
    if !mode.alpha_test() {
        val &= !(7 << 1);
    }
    if !mode.alpha_blend() {
        val &= !0x00ff_ff00;
    }
    val
}

fn normalize_fog_mode(mode: FogMode) -> u32 {
    if mode.enabled() {
        mode.0
    } else {
        0
    }
}

fn normalize_tex_mode(mode: TextureMode) -> u32 {
    let val = mode.0 & !(1 << 5 | 1 << 31);
    let class = match mode.format() {
        0..=7 => 0,
        10..=12 => 10,
        _ => 8,
    };
    (val & !(0xf << 8)) | (class << 8)
}

/// A pixel routine.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Routine {
    /// Generic routine without texturing.
    Generic0,
    Generic1,
    Generic2,
}

impl Routine {
    pub fn generic(texcount: usize) -> Self {
        match texcount {
            0 => Routine::Generic0,
            1 => Routine::Generic1,
            _ => Routine::Generic2,
        }
    }

    /// Draw the span `startx..stopx` of row `y`.
    pub fn draw(
        self,
        poly: &mut Poly,
        fbi: &mut Fbi,
        tmus: &[Tmu],
        stats: &mut Stats,
        y: i32,
        startx: i32,
        stopx: i32,
    ) {
        match self {
            Routine::Generic0 => scanline::<0>(poly, fbi, tmus, stats, y, startx, stopx),
            Routine::Generic1 => scanline::<1>(poly, fbi, tmus, stats, y, startx, stopx),
            Routine::Generic2 => scanline::<2>(poly, fbi, tmus, stats, y, startx, stopx),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RasterInfo {
    pub key: RasterKey,
    pub routine: Routine,
    /// Number of lookups that found this entry. Only kept for diagnostics, the hardware has
    /// no such counter.
    pub hits: u32,
    /// Number of triangles drawn with it.
    pub polys: u32,
}

/// Append only cache of pixel routines.
pub struct RasterCache {
    entries: Vec<RasterInfo>,
    /// Entry indices of each bucket, most recently used first.
    buckets: Vec<Vec<usize>>,
}

impl RasterCache {
    pub const BUCKETS: usize = 97;
    pub const MAX_ENTRIES: usize = 1024;

    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            buckets: vec![Vec::new(); Self::BUCKETS],
        }
    }

    /// Find the routine for the current register state, adding an entry if it's new.
    pub fn resolve(&mut self, regs: &PipelineRegs, texcount: usize) -> Result<&mut RasterInfo, VoodooError> {
        let key = RasterKey::new(regs, texcount);
        let bucket_index = key.bucket();
        let bucket = &mut self.buckets[bucket_index];

        if let Some(pos) = bucket.iter().position(|&i| self.entries[i].key == key) {
            let index = bucket.remove(pos);
            bucket.insert(0, index);
            let info = &mut self.entries[index];
            info.hits += 1;
            return Ok(info);
        }

        if self.entries.len() >= Self::MAX_ENTRIES {
            error!("Out of space for new rasterizers");
            return Err(VoodooError::RasterizerOverflow);
        }

        debug!(
            "Adding rasterizer {:08x} {:08x} {:08x} {:08x} {:08x} {:08x} (bucket {bucket_index})",
            key.color_path, key.alpha_mode, key.fog_mode, key.fbz_mode, key.tex_mode[0], key.tex_mode[1],
        );

        let index = self.entries.len();
        self.entries.push(RasterInfo {
            key,
            routine: Routine::generic(texcount),
            hits: 0,
            polys: 0,
        });
        bucket.insert(0, index);

        Ok(&mut self.entries[index])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RasterInfo] {
        &self.entries
    }

    /// Entry indices of a bucket, most recently used first.
    pub fn bucket(&self, index: usize) -> &[usize] {
        &self.buckets[index]
    }
}

impl Default for RasterCache {
    fn default() -> Self {
        Self::new()
    }
}
