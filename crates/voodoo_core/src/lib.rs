#[macro_use]
extern crate log;

#[cfg(test)]
mod test;

mod bus;
mod lfb;
mod setup;

pub mod color;
pub mod config;
pub mod dac;
pub mod dither;
pub mod fbi;
pub mod fixed;
pub mod raster;
pub mod regs;
pub mod stats;
pub mod tmu;

pub use config::{ChipType, Config, ConfigError};
pub use fbi::Buffer;
pub use regs::RegisterFile;
pub use stats::Stats;

use dac::Dac;
use fbi::Fbi;
use raster::RasterCache;
use tmu::Tmu;

use thiserror::Error;

/// Conditions the emulation can't continue from.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VoodooError {
    #[error("invalid {what} memory size of {bytes} bytes")]
    InvalidMemorySize { what: &'static str, bytes: usize },

    #[error("out of space for new rasterizers")]
    RasterizerOverflow,

    #[error("{0} is not supported")]
    Unsupported(&'static str),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// A single Voodoo chip: the frame buffer interface and its texture units.
pub struct Voodoo {
    chip: ChipType,
    regs: RegisterFile,
    fbi: Fbi,
    tmus: Vec<Tmu>,
    dac: Dac,
    raster: RasterCache,
    /// Counters of drawn triangles and fills not yet folded into the counter registers.
    stats: Stats,
    /// Bit 0 is the FBI, bit 1 and 2 the texture units.
    chipmask: u32,
    /// The initEnable PCI configuration register.
    init_enable: u32,
    /// Use the alternate register map for the first 64 registers.
    alt_regmap: bool,
    /// Texture unit 0 outputs `tmu_config` instead of sampling.
    send_config: bool,
    tmu_config: u32,
    vretrace: bool,
    /// Vertical and horizontal beam position as fractions of the frame.
    retrace_position: (f32, f32),
}

impl Voodoo {
    pub fn new(config: &Config) -> Result<Self, VoodooError> {
        config.validate()?;
        let chip = config.chip;

        tmu::texel_tables();
        dither::init_tables();

        let fbi = Fbi::new(chip, config.fb_mem_bytes())?;

        let mut tmu_config = 0x11;
        if chip.is_voodoo2() {
            tmu_config |= 0x800;
        }

        let mut chipmask = 0x01;
        let mut tmus = Vec::with_capacity(config.tmus);
        for index in 0..config.tmus.min(2) {
            tmus.push(Tmu::new(index, chip, config.tmu_mem_bytes())?);
            chipmask |= 0x02 << index;
        }
        if tmus.len() == 2 {
            tmu_config |= 0xc0 | 0x40;
        }

        let mut voodoo = Self {
            chip,
            regs: RegisterFile::new(),
            fbi,
            tmus,
            dac: Dac::default(),
            raster: RasterCache::new(),
            stats: Stats::default(),
            chipmask,
            init_enable: 0,
            alt_regmap: false,
            send_config: false,
            tmu_config,
            vretrace: false,
            retrace_position: (0.0, 0.0),
        };

        voodoo.regs.set(regs::FBI_INIT0, (1 << 4) | (0x10 << 6));
        voodoo.regs.set(regs::FBI_INIT1, (1 << 1) | (1 << 8) | (1 << 12) | (2 << 20));
        voodoo.regs.set(regs::FBI_INIT2, (1 << 6) | (0x100 << 23));
        voodoo.regs.set(regs::FBI_INIT3, (2 << 13) | (0xf << 17));
        voodoo.regs.set(regs::FBI_INIT4, 1);

        voodoo.soft_reset();
        voodoo.fbi.recompute_layout(&voodoo.regs, chip);

        info!(
            "{chip} with {} MiB frame buffer and {} texture unit(s)",
            config.fb_mem_mb,
            voodoo.tmus.len(),
        );

        Ok(voodoo)
    }

    pub fn chip(&self) -> ChipType {
        self.chip
    }

    pub fn regs(&self) -> &RegisterFile {
        &self.regs
    }

    pub fn fbi(&self) -> &Fbi {
        &self.fbi
    }

    pub fn raster_cache(&self) -> &RasterCache {
        &self.raster
    }

    /// Clear the pixel counters, discarding counts not yet folded into them.
    pub fn reset_counters(&mut self) {
        self.stats = Stats::default();
        self.fbi.lfb_stats = Stats::default();
        for reg in [
            regs::FBI_PIXELS_IN,
            regs::FBI_CHROMA_FAIL,
            regs::FBI_ZFUNC_FAIL,
            regs::FBI_AFUNC_FAIL,
            regs::FBI_PIXELS_OUT,
        ] {
            self.regs.set(reg, 0);
        }
    }

    pub fn soft_reset(&mut self) {
        self.reset_counters();
        self.regs.set(regs::FBI_TRIANGLES_OUT, 0);
    }

    /// Fold the pending counters into the counter registers.
    pub fn flush_stats(&mut self) {
        self.stats.add(&self.fbi.lfb_stats);
        self.stats.accumulate_into(&mut self.regs);
        self.stats = Stats::default();
        self.fbi.lfb_stats = Stats::default();
    }

    /// Write the initEnable PCI configuration register.
    pub fn set_init_enable(&mut self, value: u32) {
        self.init_enable = value;
    }

    pub fn init_enable(&self) -> u32 {
        self.init_enable
    }

    /// Report whether the display is in vertical retrace.
    pub fn set_vretrace(&mut self, vretrace: bool) {
        self.vretrace = vretrace;
    }

    /// Report the beam position, both in the range 0.0 to 1.0.
    pub fn set_retrace_position(&mut self, vertical: f32, horizontal: f32) {
        self.retrace_position = (vertical.clamp(0.0, 1.0), horizontal.clamp(0.0, 1.0));
    }

    /// The visible part of a color buffer, `rowpixels` pixels per row.
    pub fn buffer_words(&self, buffer: Buffer) -> &[u16] {
        self.fbi.buffer_words(buffer)
    }

    /// Size of the visible screen.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.fbi.width, self.fbi.height)
    }

    pub fn rowpixels(&self) -> u32 {
        self.fbi.rowpixels
    }
}
