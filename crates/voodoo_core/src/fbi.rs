//! The frame buffer interface.
//!
//! Owns the frame buffer memory and knows where the color and aux buffers live in it. It also
//! holds the triangle gradients written through the registers and the vertices of the setup
//! engine.

use crate::config::ChipType;
use crate::regs::{self, RegisterFile};
use crate::stats::Stats;
use crate::VoodooError;

use serde::{Deserialize, Serialize};

use voodoo_util::Bit;

/// Iterated parameters of a triangle. Colors are 12.12, Z 20.12 and W 16.32.
#[derive(Clone, Copy, Default, Debug)]
pub struct Gradients {
    pub startr: i32,
    pub startg: i32,
    pub startb: i32,
    pub starta: i32,
    pub startz: i32,
    pub startw: i64,
    pub drdx: i32,
    pub dgdx: i32,
    pub dbdx: i32,
    pub dadx: i32,
    pub dzdx: i32,
    pub dwdx: i64,
    pub drdy: i32,
    pub dgdy: i32,
    pub dbdy: i32,
    pub dady: i32,
    pub dzdy: i32,
    pub dwdy: i64,
}

/// A vertex collected by the setup engine.
#[derive(Clone, Copy, Default, Debug)]
pub struct SetupVertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub wb: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
    pub s0: f32,
    pub t0: f32,
    pub w0: f32,
    pub s1: f32,
    pub t1: f32,
    pub w1: f32,
}

/// The triangle vertices in 12.4 fixed point.
#[derive(Clone, Copy, Default, Debug)]
pub struct Vertices {
    pub ax: i16,
    pub ay: i16,
    pub bx: i16,
    pub by: i16,
    pub cx: i16,
    pub cy: i16,
}

/// A visible color buffer.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Buffer {
    Front,
    Back,
}

pub struct Fbi {
    ram: Box<[u16]>,
    /// Byte mask of the memory.
    mask: u32,

    /// Byte offsets of the color buffers. The third is only present with triple buffering.
    pub rgboffs: [Option<u32>; 3],
    pub auxoffs: Option<u32>,

    pub frontbuf: usize,
    pub backbuf: usize,

    pub width: u32,
    pub height: u32,

    pub rowpixels: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub x_tiles: u32,

    /// Subtracted from Y when the Y origin is at the bottom.
    pub yorigin: u32,

    /// Size of the memory FIFO in words. Only recorded, the FIFO isn't emulated.
    pub fifo_size: u32,

    pub vblank_dont_swap: bool,

    pub fogblend: [u8; 64],
    pub fogdelta: [u8; 64],
    pub fogdelta_mask: u8,

    pub verts: Vertices,
    pub grad: Gradients,

    pub svert: [SetupVertex; 3],
    pub sverts: u32,

    /// Counters of pipelined LFB writes.
    pub lfb_stats: Stats,
}

impl Fbi {
    pub fn new(chip: ChipType, mem_bytes: usize) -> Result<Self, VoodooError> {
        if mem_bytes <= 1 || !mem_bytes.is_power_of_two() {
            error!("Invalid frame buffer memory size of {mem_bytes} bytes");
            return Err(VoodooError::InvalidMemorySize { what: "frame buffer", bytes: mem_bytes });
        }
        Ok(Self {
            ram: vec![0; mem_bytes / 2].into_boxed_slice(),
            mask: (mem_bytes - 1) as u32,
            rgboffs: [Some(0), Some(0), Some(0)],
            auxoffs: None,
            frontbuf: 0,
            backbuf: 1,
            width: 640,
            height: 480,
            rowpixels: 0,
            tile_width: 0,
            tile_height: 0,
            x_tiles: 0,
            yorigin: 0,
            fifo_size: 0,
            vblank_dont_swap: false,
            fogblend: [0; 64],
            fogdelta: [0; 64],
            fogdelta_mask: if chip.is_voodoo2() { 0xfc } else { 0xff },
            verts: Vertices::default(),
            grad: Gradients::default(),
            svert: [SetupVertex::default(); 3],
            sverts: 0,
            lfb_stats: Stats::default(),
        })
    }

    pub fn mem_bytes(&self) -> u32 {
        self.mask + 1
    }

    /// Raw frame buffer memory.
    pub fn ram(&self) -> &[u16] {
        &self.ram
    }

    /// Byte offset of a color buffer.
    pub fn color_offset(&self, buffer: Buffer) -> u32 {
        let index = match buffer {
            Buffer::Front => self.frontbuf,
            Buffer::Back => self.backbuf,
        };
        self.rgboffs[index].unwrap_or(0)
    }

    /// Byte offset of the buffer selected by a 2-bit draw or write buffer field.
    pub fn select_buffer(&self, select: u32) -> Option<u32> {
        match select {
            0 => Some(self.color_offset(Buffer::Front)),
            1 => Some(self.color_offset(Buffer::Back)),
            _ => None,
        }
    }

    /// Number of pixels between a buffer offset and the end of memory.
    pub fn pixels_after(&self, base: u32) -> u32 {
        (self.mask + 1 - base) / 2
    }

    fn index(&self, base: u32, pixel: u32) -> usize {
        ((base / 2).wrapping_add(pixel) & (self.mask >> 1)) as usize
    }

    pub fn load(&self, base: u32, pixel: u32) -> u16 {
        self.ram[self.index(base, pixel)]
    }

    pub fn store(&mut self, base: u32, pixel: u32, val: u16) {
        let index = self.index(base, pixel);
        self.ram[index] = val;
    }

    /// The pixels of the visible part of a buffer, row by row.
    pub fn buffer_words(&self, buffer: Buffer) -> &[u16] {
        let start = (self.color_offset(buffer) / 2) as usize;
        let len = (self.rowpixels * self.height) as usize;
        let end = (start + len).min(self.ram.len());
        &self.ram[start.min(end)..end]
    }

    /// Compute where the buffers are located from the init registers.
    pub fn recompute_layout(&mut self, regs: &RegisterFile, chip: ChipType) {
        let init0 = regs.get_u32(regs::FBI_INIT0);
        let init1 = regs.get_u32(regs::FBI_INIT1);
        let init2 = regs.get_u32(regs::FBI_INIT2);
        let init4 = regs.get_u32(regs::FBI_INIT4);

        let buffer_pages = init2.bit_range(11, 19);
        let fifo_start_page = init4.bit_range(8, 17);
        let mut fifo_last_page = init4.bit_range(18, 27);

        let mut memory_config = init2.bit(4) as u32;
        if chip.is_voodoo2() && memory_config == 0 {
            memory_config = regs.get_u32(regs::FBI_INIT5).bit_range(9, 10);
        }

        // Tiles are 64x16 on Voodoo1 and 32x32 on Voodoo2. The tile count is in half tiles.
        self.tile_width = if chip.is_voodoo2() { 32 } else { 64 };
        self.tile_height = if chip.is_voodoo2() { 32 } else { 16 };
        self.x_tiles = init1.bit_range(4, 7);
        if chip.is_voodoo2() {
            self.x_tiles = (self.x_tiles << 1)
                | ((init1.bit(24) as u32) << 5)
                | regs.get_u32(regs::FBI_INIT6).bit(30) as u32;
        }
        self.rowpixels = self.tile_width * self.x_tiles;

        let page = buffer_pages * 0x1000;

        self.rgboffs[0] = Some(0);
        self.rgboffs[1] = Some(page);

        match memory_config {
            1 => {
                self.rgboffs[2] = Some(2 * page);
                self.auxoffs = None;
            }
            2 => {
                self.rgboffs[2] = Some(2 * page);
                self.auxoffs = Some(3 * page);
            }
            config => {
                if config == 3 {
                    warn!("Reserved memory configuration, using two color buffers and an aux buffer");
                }
                self.rgboffs[2] = None;
                self.auxoffs = Some(2 * page);
            }
        }

        let mask = self.mask;
        for offset in self.rgboffs.iter_mut().flatten() {
            *offset = (*offset).min(mask);
        }
        if let Some(offset) = self.auxoffs.as_mut() {
            *offset = (*offset).min(mask);
        }

        fifo_last_page = fifo_last_page.min(self.mask / 0x1000);
        self.fifo_size = if fifo_start_page <= fifo_last_page && init0.bit(13) {
            ((fifo_last_page + 1 - fifo_start_page) * 0x1000 / 4).min(65536 * 2)
        } else {
            0
        };

        if self.rgboffs[2].is_none() {
            if self.frontbuf == 2 {
                self.frontbuf = 0;
            }
            if self.backbuf == 2 {
                self.backbuf = 0;
            }
        }

        debug!(
            "Memory layout: color {:x?}, aux {:x?}, {} pixels per row, memory FIFO {} words",
            self.rgboffs, self.auxoffs, self.rowpixels, self.fifo_size,
        );
    }

    /// Rotate the front and back buffer.
    pub fn rotate_buffers(&mut self, chip: ChipType) {
        if chip.is_voodoo2() && self.vblank_dont_swap {
            return;
        }
        if self.rgboffs[2].is_none() {
            self.frontbuf = 1 - self.frontbuf;
            self.backbuf = 1 - self.frontbuf;
        } else {
            self.frontbuf = (self.frontbuf + 1) % 3;
            self.backbuf = (self.frontbuf + 1) % 3;
        }
    }

    /// Expand a write to one of the 32 fog table registers.
    pub fn write_fog_table(&mut self, entry: usize, data: u32) {
        let base = 2 * entry;
        self.fogdelta[base] = data as u8;
        self.fogblend[base] = (data >> 8) as u8;
        self.fogdelta[base + 1] = (data >> 16) as u8;
        self.fogblend[base + 1] = (data >> 24) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(chip: ChipType, init1: u32, init2: u32) -> Fbi {
        let mut regs = RegisterFile::new();
        regs.set(regs::FBI_INIT1, init1);
        regs.set(regs::FBI_INIT2, init2);
        let mut fbi = Fbi::new(chip, 2 << 20).unwrap();
        fbi.recompute_layout(&regs, chip);
        fbi
    }

    #[test]
    fn double_buffer_with_aux() {
        let fbi = layout(ChipType::Voodoo1, 10 << 4, 150 << 11);
        assert_eq!(fbi.rowpixels, 640);
        assert_eq!(fbi.rgboffs, [Some(0), Some(150 * 0x1000), None]);
        assert_eq!(fbi.auxoffs, Some(300 * 0x1000));
    }

    #[test]
    fn triple_buffer_without_aux() {
        let fbi = layout(ChipType::Voodoo1, 10 << 4, (150 << 11) | (1 << 4));
        assert_eq!(fbi.rgboffs[2], Some(300 * 0x1000));
        assert_eq!(fbi.auxoffs, None);
    }

    #[test]
    fn offsets_clamp_to_memory() {
        let fbi = layout(ChipType::Voodoo1, 10 << 4, 0x1ff << 11);
        assert_eq!(fbi.auxoffs, Some((2 << 20) - 1));
    }

    #[test]
    fn voodoo2_tile_count() {
        // Five half tiles shifted up, plus bit 5 from fbiInit1.
        let fbi = layout(ChipType::Voodoo2, (5 << 4) | (1 << 24), 0);
        assert_eq!(fbi.x_tiles, (5 << 1) | (1 << 5));
        assert_eq!(fbi.rowpixels, 32 * 42);
    }

    #[test]
    fn swap_rotation() {
        let mut fbi = layout(ChipType::Voodoo1, 10 << 4, 150 << 11);
        fbi.rotate_buffers(ChipType::Voodoo1);
        assert_eq!((fbi.frontbuf, fbi.backbuf), (1, 0));

        let mut fbi = layout(ChipType::Voodoo1, 10 << 4, (150 << 11) | (1 << 4));
        for expected in [1, 2, 0] {
            fbi.rotate_buffers(ChipType::Voodoo1);
            assert_eq!(fbi.frontbuf, expected);
            assert_eq!(fbi.backbuf, (expected + 1) % 3);
        }

        let mut fbi = layout(ChipType::Voodoo2, 10 << 4, 150 << 11);
        fbi.vblank_dont_swap = true;
        fbi.rotate_buffers(ChipType::Voodoo2);
        assert_eq!(fbi.frontbuf, 0);
    }

    #[test]
    fn fog_table_expansion() {
        let mut fbi = Fbi::new(ChipType::Voodoo1, 1 << 20).unwrap();
        fbi.write_fog_table(3, 0x44332211);
        assert_eq!(fbi.fogdelta[6], 0x11);
        assert_eq!(fbi.fogblend[6], 0x22);
        assert_eq!(fbi.fogdelta[7], 0x33);
        assert_eq!(fbi.fogblend[7], 0x44);
    }
}
