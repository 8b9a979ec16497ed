//! The host side of the chip: register, LFB and texture space.
//!
//! Offsets are word offsets into the 16 MiB aperture unless noted otherwise. The `mmio_*`
//! functions take byte addresses and split unaligned accesses the way the PCI bridge does.

use crate::fbi::{Gradients, Vertices};
use crate::fixed::{float_to_int32, float_to_int64};
use crate::regs::{self, reg_name, Access, Bank, Reg, TextureMode, ALIAS_MAP};
use crate::tmu::TexGradients;
use crate::{Voodoo, VoodooError};

use voodoo_util::{Bit, BitSet};

/// Vertex coordinates and the integer gradient registers.
const GRADIENTS: std::ops::RangeInclusive<usize> = regs::VERTEX_AX..=regs::D_W_DY;

/// The same registers with float encoding.
const FLOAT_GRADIENTS: std::ops::RangeInclusive<usize> =
    regs::VERTEX_AX + regs::FLOAT_OFFSET..=regs::D_W_DY + regs::FLOAT_OFFSET;

const NCC_TABLES: std::ops::Range<usize> = regs::NCC_TABLE..regs::NCC_TABLE + 2 * regs::NCC_TABLE_LEN;
const FOG_TABLE: std::ops::Range<usize> = regs::FOG_TABLE..regs::FOG_TABLE + regs::FOG_TABLE_LEN;
const TEXTURE_REGS: std::ops::RangeInclusive<usize> = regs::TEXTURE_MODE..=regs::TEX_BASE_ADDR_3_8;

fn vertex_field(verts: &mut Vertices, reg: usize) -> Option<&mut i16> {
    Some(match reg {
        regs::VERTEX_AX => &mut verts.ax,
        regs::VERTEX_AY => &mut verts.ay,
        regs::VERTEX_BX => &mut verts.bx,
        regs::VERTEX_BY => &mut verts.by,
        regs::VERTEX_CX => &mut verts.cx,
        regs::VERTEX_CY => &mut verts.cy,
        _ => return None,
    })
}

/// The 12.12 color gradients.
fn color_field(grad: &mut Gradients, reg: usize) -> Option<&mut i32> {
    Some(match reg {
        regs::START_R => &mut grad.startr,
        regs::START_G => &mut grad.startg,
        regs::START_B => &mut grad.startb,
        regs::START_A => &mut grad.starta,
        regs::D_R_DX => &mut grad.drdx,
        regs::D_G_DX => &mut grad.dgdx,
        regs::D_B_DX => &mut grad.dbdx,
        regs::D_A_DX => &mut grad.dadx,
        regs::D_R_DY => &mut grad.drdy,
        regs::D_G_DY => &mut grad.dgdy,
        regs::D_B_DY => &mut grad.dbdy,
        regs::D_A_DY => &mut grad.dady,
        _ => return None,
    })
}

fn depth_field(grad: &mut Gradients, reg: usize) -> Option<&mut i32> {
    Some(match reg {
        regs::START_Z => &mut grad.startz,
        regs::D_Z_DX => &mut grad.dzdx,
        regs::D_Z_DY => &mut grad.dzdy,
        _ => return None,
    })
}

fn w_field(grad: &mut Gradients, reg: usize) -> Option<&mut i64> {
    Some(match reg {
        regs::START_W => &mut grad.startw,
        regs::D_W_DX => &mut grad.dwdx,
        regs::D_W_DY => &mut grad.dwdy,
        _ => return None,
    })
}

/// The S, T and W gradients of a texture unit.
fn tex_field(grad: &mut TexGradients, reg: usize) -> Option<&mut i64> {
    Some(match reg {
        regs::START_S => &mut grad.starts,
        regs::START_T => &mut grad.startt,
        regs::START_W => &mut grad.startw,
        regs::D_S_DX => &mut grad.dsdx,
        regs::D_T_DX => &mut grad.dtdx,
        regs::D_W_DX => &mut grad.dwdx,
        regs::D_S_DY => &mut grad.dsdy,
        regs::D_T_DY => &mut grad.dtdy,
        regs::D_W_DY => &mut grad.dwdy,
        _ => return None,
    })
}

impl Voodoo {
    /// Store a vertex or gradient register. `reg` is the integer register even if the value
    /// was written through its float alias.
    fn write_gradient(&mut self, chips: u32, reg: usize, data: u32, float: bool) {
        let fbi = chips.bit(0);

        if let Some(field) = vertex_field(&mut self.fbi.verts, reg) {
            let data = if float { float_to_int32(data, 4) as u32 } else { data };
            if fbi {
                *field = data as i16;
            }
            return;
        }

        if let Some(field) = color_field(&mut self.fbi.grad, reg) {
            let data = if float { float_to_int32(data, 12) as u32 } else { data };
            if fbi {
                *field = (data << 8) as i32 >> 8;
            }
            return;
        }

        if let Some(field) = depth_field(&mut self.fbi.grad, reg) {
            let data = if float { float_to_int32(data, 12) as u32 } else { data };
            if fbi {
                *field = data as i32;
            }
            return;
        }

        // S and T are 14.18 and W 2.30, both become 16.32.
        let is_w = matches!(reg, regs::START_W | regs::D_W_DX | regs::D_W_DY);
        let value = if float {
            float_to_int64(data, 32)
        } else {
            (data as i32 as i64) << if is_w { 2 } else { 14 }
        };

        if fbi {
            if let Some(field) = w_field(&mut self.fbi.grad, reg) {
                *field = value;
            }
        }

        for (index, tmu) in self.tmus.iter_mut().enumerate() {
            if chips & (2 << index) != 0 {
                if let Some(field) = tex_field(&mut tmu.grad, reg) {
                    *field = value;
                }
            }
        }
    }

    /// Write the gated fbiInit registers. Returns false if the write was dropped.
    fn write_init(&mut self, chips: u32, reg: usize, data: u32) -> bool {
        if !chips.bit(0) || !self.init_enable.bit(0) {
            trace!("Dropped write to {} while init is disabled", reg_name(reg));
            return false;
        }
        self.regs.set(reg, data);
        true
    }

    fn write_video_timing(&mut self, chips: u32, reg: usize, data: u32) {
        if !chips.bit(0) {
            return;
        }
        self.regs.set(reg, data);

        let hsync = self.regs.get_u32(regs::H_SYNC);
        let vsync = self.regs.get_u32(regs::V_SYNC);
        let dims = self.regs.get_u32(regs::VIDEO_DIMENSIONS);

        if hsync == 0 || vsync == 0 || dims == 0 {
            return;
        }

        let htotal = hsync.bit_range(16, 25) + 1 + hsync.bit_range(0, 7) + 1;
        let vtotal = vsync.bit_range(16, 27) + vsync.bit_range(0, 11);
        let hvis = dims.bit_range(0, 9);
        let vvis = dims.bit_range(16, 25);

        self.fbi.width = (hvis + 1) & !1;
        self.fbi.height = (vvis + 1) & !1;

        debug!(
            "Video timing {htotal}x{vtotal} total, {}x{} visible",
            self.fbi.width, self.fbi.height,
        );

        if reg == regs::VIDEO_DIMENSIONS {
            self.fbi.recompute_layout(&self.regs, self.chip);
        }
    }

    /// Write to register space. `offset` is the word offset with the chip select bits.
    pub fn register_write(&mut self, offset: u32, data: u32) -> Result<(), VoodooError> {
        let mut chips = offset.bit_range(8, 11);
        if chips == 0 {
            chips = 0xf;
        }
        chips &= self.chipmask;

        let reg = if offset & 0x800c0 == 0x80000 && self.alt_regmap {
            ALIAS_MAP[(offset & 0x3f) as usize] as usize
        } else {
            (offset & 0xff) as usize
        };

        if !Access::of(self.chip, reg).writable() {
            warn!("Write to non-writable register {} ({reg:#04x})", reg_name(reg));
            return Ok(());
        }

        trace!("Register write {} = {data:08x} (chips {chips:x})", reg_name(reg));

        match reg {
            reg if GRADIENTS.contains(&reg) => self.write_gradient(chips, reg, data, false),
            reg if FLOAT_GRADIENTS.contains(&reg) => {
                self.write_gradient(chips, reg - regs::FLOAT_OFFSET, data, true);
            }
            regs::S_ARGB => {
                if chips.bit(0) {
                    let color = Reg(data).as_argb();
                    self.regs.set(regs::S_ALPHA, Reg::from_f32(color.a() as f32).0);
                    self.regs.set(regs::S_RED, Reg::from_f32(color.r() as f32).0);
                    self.regs.set(regs::S_GREEN, Reg::from_f32(color.g() as f32).0);
                    self.regs.set(regs::S_BLUE, Reg::from_f32(color.b() as f32).0);
                }
            }
            regs::FBZ_COLOR_PATH | regs::FBZ_MODE | regs::FOG_MODE => {
                let mask = match reg {
                    _ if self.chip.is_voodoo2() => 0xffff_ffff,
                    regs::FBZ_COLOR_PATH => 0x0fff_ffff,
                    regs::FBZ_MODE => 0x001f_ffff,
                    _ => 0x0000_003f,
                };
                if chips.bit(0) {
                    self.regs.set(reg, data & mask);
                }
            }
            regs::CLIP_LEFT_RIGHT | regs::CLIP_LOW_Y_HIGH_Y => {
                if chips.bit(0) {
                    self.regs.set(reg, data);
                }
            }
            regs::TRIANGLE_CMD | regs::F_TRIANGLE_CMD => self.triangle()?,
            regs::S_BEGIN_TRI_CMD => self.begin_triangle(),
            regs::S_DRAW_TRI_CMD => self.draw_triangle()?,
            regs::NOP_CMD => {
                if data.bit(0) {
                    self.reset_counters();
                }
                if data.bit(1) {
                    self.regs.set(regs::FBI_TRIANGLES_OUT, 0);
                }
            }
            regs::FASTFILL_CMD => self.fastfill(),
            regs::SWAPBUFFER_CMD => self.swapbuffer(data),
            // The gamma table isn't modelled.
            regs::CLUT_DATA => (),
            regs::DAC_DATA => {
                if chips.bit(0) {
                    let dac_reg = data.bit_range(8, 10) as usize;
                    if data.bit(11) {
                        self.dac.read(dac_reg);
                    } else {
                        self.dac.write(dac_reg, data as u8);
                    }
                }
            }
            regs::H_SYNC | regs::V_SYNC | regs::BACK_PORCH | regs::VIDEO_DIMENSIONS => {
                self.write_video_timing(chips, reg, data);
            }
            regs::FBI_INIT0 => {
                if self.write_init(chips, reg, data) {
                    if data.bit(1) {
                        self.soft_reset();
                    }
                    self.fbi.recompute_layout(&self.regs, self.chip);
                }
            }
            regs::FBI_INIT5 | regs::FBI_INIT6 if !self.chip.is_voodoo2() => (),
            regs::FBI_INIT1 | regs::FBI_INIT2 | regs::FBI_INIT4 | regs::FBI_INIT5 | regs::FBI_INIT6 => {
                if self.write_init(chips, reg, data) {
                    self.fbi.recompute_layout(&self.regs, self.chip);
                }
            }
            regs::FBI_INIT3 => {
                if self.write_init(chips, reg, data) {
                    self.alt_regmap = data.bit(0);
                    self.fbi.yorigin = data.bit_range(22, 31);
                    self.fbi.recompute_layout(&self.regs, self.chip);
                }
            }
            reg if NCC_TABLES.contains(&reg) => {
                let entry = reg - regs::NCC_TABLE;
                let (table, regnum) = (entry / regs::NCC_TABLE_LEN, entry % regs::NCC_TABLE_LEN);
                for (index, tmu) in self.tmus.iter_mut().enumerate() {
                    if chips & (2 << index) != 0 {
                        tmu.write_ncc(table, regnum, data);
                    }
                }
            }
            reg if FOG_TABLE.contains(&reg) => {
                if chips.bit(0) {
                    self.fbi.write_fog_table(reg - regs::FOG_TABLE, data);
                }
            }
            reg if TEXTURE_REGS.contains(&reg) => {
                for (index, tmu) in self.tmus.iter_mut().enumerate() {
                    if chips & (2 << index) != 0 {
                        self.regs.set_banked(Bank::tmu(index), reg, data);
                        tmu.dirty = true;
                    }
                }
            }
            regs::TREX_INIT1 => {
                self.send_config = data.bit(18);
                self.regs.set_selected(chips, reg, data);
            }
            _ => self.regs.set_selected(chips, reg, data),
        }

        Ok(())
    }

    /// Read from register space. Reading a counter folds the pending statistics into it.
    pub fn register_read(&mut self, offset: u32) -> u32 {
        let reg = (offset & 0xff) as usize;

        if !Access::of(self.chip, reg).readable() {
            warn!("Read of non-readable register {} ({reg:#04x})", reg_name(reg));
            return 0xffff_ffff;
        }

        let value = match reg {
            regs::STATUS => {
                // PCI FIFO free space, never busy, memory FIFO free space and no pending swaps.
                0x3f_u32
                    .set_bit(6, self.vretrace)
                    .set_bit_range(10, 11, self.fbi.frontbuf as u32)
                    .set_bit_range(12, 27, 0xffff)
            }
            regs::HV_RETRACE if self.chip.is_voodoo2() => {
                let (vertical, horizontal) = self.retrace_position;
                let v = (vertical * 0x1fff as f32) as u32 & 0x1fff;
                let h = (horizontal * 0x7ff as f32) as u32 & 0x7ff;
                v | h << 16
            }
            regs::FBI_INIT2 if self.init_enable.bit(2) => self.dac.read_result as u32,
            regs::FBI_PIXELS_IN..=regs::FBI_PIXELS_OUT => {
                self.flush_stats();
                self.regs.get_u32(reg) & 0xff_ffff
            }
            regs::FBI_TRIANGLES_OUT => self.regs.get_u32(reg) & 0xff_ffff,
            _ => self.regs.get_u32(reg),
        };

        trace!("Register read {} = {value:08x}", reg_name(reg));

        value
    }

    /// Write a word of texels. `offset` is the word offset with the unit select bits.
    pub fn texture_write(&mut self, offset: u32, data: u32) -> Result<(), VoodooError> {
        let unit = offset.bit_range(19, 20) as usize;

        // The sequential 8-bit download mode is only read from the first unit.
        let seq_8_downld = TextureMode(self.regs.banked(Bank::tmu(0), regs::TEXTURE_MODE).0)
            .seq_8_downld();

        let Some(tmu) = self.tmus.get_mut(unit) else {
            warn!("Texture write to absent unit {unit}");
            return Ok(());
        };

        tmu.download(&self.regs, offset, data, seq_8_downld)
    }

    /// Write a word anywhere in the aperture. `mem_mask` selects the halves of an LFB write.
    pub fn write(&mut self, offset: u32, data: u32, mem_mask: u32) -> Result<(), VoodooError> {
        if offset & 0x30_0000 == 0 {
            self.register_write(offset, data)
        } else if offset & 0x20_0000 == 0 {
            self.lfb_write(offset, data, mem_mask)
        } else {
            self.texture_write(offset, data)
        }
    }

    /// Read a word anywhere in the aperture. Texture memory can't be read.
    pub fn read(&mut self, offset: u32) -> u32 {
        if offset & 0x30_0000 == 0 {
            self.register_read(offset)
        } else if offset & 0x20_0000 == 0 {
            self.lfb_read(offset)
        } else {
            0xffff_ffff
        }
    }

    fn word(addr: u32) -> u32 {
        (addr >> 2) & 0x3f_ffff
    }

    fn next_word(addr: u32) -> u32 {
        ((addr >> 2) + 1) & 0x3f_ffff
    }

    pub fn mmio_read_u8(&mut self, addr: u32) -> u8 {
        trace!("Ignored byte read at {addr:08x}");
        0xff
    }

    pub fn mmio_write_u8(&mut self, addr: u32, value: u8) -> Result<(), VoodooError> {
        trace!("Ignored byte write of {value:02x} at {addr:08x}");
        Ok(())
    }

    /// Read a halfword at byte address `addr`.
    pub fn mmio_read_u16(&mut self, addr: u32) -> u16 {
        if addr.bit(0) {
            warn!("Unaligned halfword read at {addr:08x}");
            return 0xffff;
        }
        let value = self.read(Self::word(addr));
        if addr.bit(1) {
            (value >> 16) as u16
        } else {
            value as u16
        }
    }

    /// Write a halfword at byte address `addr`.
    pub fn mmio_write_u16(&mut self, addr: u32, value: u16) -> Result<(), VoodooError> {
        if addr.bit(0) {
            warn!("Unaligned halfword write at {addr:08x}");
            return Ok(());
        }
        let value = value as u32;
        if addr.bit(1) {
            self.write(Self::word(addr), value << 16, 0xffff_0000)
        } else {
            self.write(Self::word(addr), value, 0x0000_ffff)
        }
    }

    /// Read a word at byte address `addr`. A halfword aligned read is stitched together from
    /// two words.
    pub fn mmio_read_u32(&mut self, addr: u32) -> u32 {
        match addr & 3 {
            0 => self.read(Self::word(addr)),
            2 => {
                let lo = self.read(Self::word(addr));
                let hi = self.read(Self::next_word(addr));
                (lo >> 16) | (hi << 16)
            }
            _ => {
                warn!("Unaligned word read at {addr:08x}");
                0xffff_ffff
            }
        }
    }

    /// Write a word at byte address `addr`. Byte aligned writes merge with the words they
    /// straddle.
    pub fn mmio_write_u32(&mut self, addr: u32, value: u32) -> Result<(), VoodooError> {
        let (first, second) = (Self::word(addr), Self::next_word(addr));
        match addr & 3 {
            0 => self.write(first, value, 0xffff_ffff),
            2 => {
                self.write(first, value << 16, 0xffff_0000)?;
                self.write(second, value >> 16, 0x0000_ffff)
            }
            offset => {
                let lo = self.read(first);
                let hi = self.read(second);
                let (lo, hi) = if offset == 1 {
                    ((lo & 0x00ff_ffff) | (value & 0xff) << 24, (hi & 0xff00_0000) | value >> 8)
                } else {
                    ((lo & 0x0000_00ff) | (value & 0x00ff_ffff) << 8, (hi & 0xffff_ff00) | value >> 24)
                };
                self.write(first, lo, 0xffff_ffff)?;
                self.write(second, hi, 0xffff_ffff)
            }
        }
    }
}
