//! The register file of the chip.
//!
//! Every register is a plain 32-bit cell. How the bits are interpreted depends only on which
//! register is accessed, so [`Reg`] just exposes the different views.

mod access;
mod fields;
mod names;

pub use access::{Access, ALIAS_MAP};
pub use fields::{
    AlphaMode, ChromaRange, CompareFunc, FbzColorPath, FbzMode, FogMode, LfbMode, TexDetail,
    TexLod, TextureMode,
};
pub use names::{reg_by_name, reg_name};

use crate::color::Argb;

use bytemuck::{Pod, Zeroable};

pub const STATUS: usize = 0x00;
pub const INTR_CTRL: usize = 0x01;
pub const VERTEX_AX: usize = 0x02;
pub const VERTEX_AY: usize = 0x03;
pub const VERTEX_BX: usize = 0x04;
pub const VERTEX_BY: usize = 0x05;
pub const VERTEX_CX: usize = 0x06;
pub const VERTEX_CY: usize = 0x07;
pub const START_R: usize = 0x08;
pub const START_G: usize = 0x09;
pub const START_B: usize = 0x0a;
pub const START_Z: usize = 0x0b;
pub const START_A: usize = 0x0c;
pub const START_S: usize = 0x0d;
pub const START_T: usize = 0x0e;
pub const START_W: usize = 0x0f;

pub const D_R_DX: usize = 0x10;
pub const D_G_DX: usize = 0x11;
pub const D_B_DX: usize = 0x12;
pub const D_Z_DX: usize = 0x13;
pub const D_A_DX: usize = 0x14;
pub const D_S_DX: usize = 0x15;
pub const D_T_DX: usize = 0x16;
pub const D_W_DX: usize = 0x17;
pub const D_R_DY: usize = 0x18;
pub const D_G_DY: usize = 0x19;
pub const D_B_DY: usize = 0x1a;
pub const D_Z_DY: usize = 0x1b;
pub const D_A_DY: usize = 0x1c;
pub const D_S_DY: usize = 0x1d;
pub const D_T_DY: usize = 0x1e;
pub const D_W_DY: usize = 0x1f;

pub const TRIANGLE_CMD: usize = 0x20;

/// Offset from an integer gradient register to its float encoded twin.
pub const FLOAT_OFFSET: usize = 0x20;

pub const F_TRIANGLE_CMD: usize = 0x40;
pub const FBZ_COLOR_PATH: usize = 0x41;
pub const FOG_MODE: usize = 0x42;
pub const ALPHA_MODE: usize = 0x43;
pub const FBZ_MODE: usize = 0x44;
pub const LFB_MODE: usize = 0x45;
pub const CLIP_LEFT_RIGHT: usize = 0x46;
pub const CLIP_LOW_Y_HIGH_Y: usize = 0x47;
pub const NOP_CMD: usize = 0x48;
pub const FASTFILL_CMD: usize = 0x49;
pub const SWAPBUFFER_CMD: usize = 0x4a;
pub const FOG_COLOR: usize = 0x4b;
pub const ZA_COLOR: usize = 0x4c;
pub const CHROMA_KEY: usize = 0x4d;
pub const CHROMA_RANGE: usize = 0x4e;
pub const USER_INTR_CMD: usize = 0x4f;

pub const STIPPLE: usize = 0x50;
pub const COLOR0: usize = 0x51;
pub const COLOR1: usize = 0x52;
pub const FBI_PIXELS_IN: usize = 0x53;
pub const FBI_CHROMA_FAIL: usize = 0x54;
pub const FBI_ZFUNC_FAIL: usize = 0x55;
pub const FBI_AFUNC_FAIL: usize = 0x56;
pub const FBI_PIXELS_OUT: usize = 0x57;
pub const FOG_TABLE: usize = 0x58;
pub const FOG_TABLE_LEN: usize = 32;

pub const CMD_FIFO_BASE_ADDR: usize = 0x78;

pub const FBI_INIT4: usize = 0x80;
pub const V_RETRACE: usize = 0x81;
pub const BACK_PORCH: usize = 0x82;
pub const VIDEO_DIMENSIONS: usize = 0x83;
pub const FBI_INIT0: usize = 0x84;
pub const FBI_INIT1: usize = 0x85;
pub const FBI_INIT2: usize = 0x86;
pub const FBI_INIT3: usize = 0x87;
pub const H_SYNC: usize = 0x88;
pub const V_SYNC: usize = 0x89;
pub const CLUT_DATA: usize = 0x8a;
pub const DAC_DATA: usize = 0x8b;
pub const MAX_RGB_DELTA: usize = 0x8c;

pub const HV_RETRACE: usize = 0x90;
pub const FBI_INIT5: usize = 0x91;
pub const FBI_INIT6: usize = 0x92;
pub const FBI_INIT7: usize = 0x93;
pub const FBI_SWAP_HISTORY: usize = 0x96;
pub const FBI_TRIANGLES_OUT: usize = 0x97;
pub const S_SETUP_MODE: usize = 0x98;
pub const S_VX: usize = 0x99;
pub const S_VY: usize = 0x9a;
pub const S_ARGB: usize = 0x9b;
pub const S_RED: usize = 0x9c;
pub const S_GREEN: usize = 0x9d;
pub const S_BLUE: usize = 0x9e;
pub const S_ALPHA: usize = 0x9f;
pub const S_VZ: usize = 0xa0;
pub const S_WB: usize = 0xa1;
pub const S_WTMU0: usize = 0xa2;
pub const S_S_WTMU0: usize = 0xa3;
pub const S_T_WTMU0: usize = 0xa4;
pub const S_WTMU1: usize = 0xa5;
pub const S_S_WTMU1: usize = 0xa6;
pub const S_T_WTMU1: usize = 0xa7;
pub const S_DRAW_TRI_CMD: usize = 0xa8;
pub const S_BEGIN_TRI_CMD: usize = 0xa9;

pub const TEXTURE_MODE: usize = 0xc0;
pub const T_LOD: usize = 0xc1;
pub const T_DETAIL: usize = 0xc2;
pub const TEX_BASE_ADDR: usize = 0xc3;
pub const TEX_BASE_ADDR_1: usize = 0xc4;
pub const TEX_BASE_ADDR_2: usize = 0xc5;
pub const TEX_BASE_ADDR_3_8: usize = 0xc6;
pub const TREX_INIT0: usize = 0xc7;
pub const TREX_INIT1: usize = 0xc8;
pub const NCC_TABLE: usize = 0xc9;

/// Number of registers in each NCC table.
pub const NCC_TABLE_LEN: usize = 12;

/// A single register. The stored bits carry no type; the accessor used decides how they are
/// interpreted.
#[repr(transparent)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, Pod, Zeroable)]
pub struct Reg(pub u32);

impl Reg {
    pub fn from_f32(val: f32) -> Self {
        Self(val.to_bits())
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn as_i32(self) -> i32 {
        self.0 as i32
    }

    pub fn as_f32(self) -> f32 {
        f32::from_bits(self.0)
    }

    /// The four packed 8-bit color lanes.
    pub fn as_argb(self) -> Argb {
        Argb(self.0)
    }
}

/// The index of a register bank. The FBI owns bank 0 and each texture unit owns the bank after
/// it. Bank 3 is only reachable through the chip select bits.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Bank(pub usize);

impl Bank {
    pub const FBI: Self = Self(0);

    pub fn tmu(index: usize) -> Self {
        Self(index + 1)
    }
}

/// Four banks of 256 registers.
pub struct RegisterFile {
    regs: Box<[Reg]>,
}

impl RegisterFile {
    pub const BANK_SIZE: usize = 0x100;
    pub const BANK_COUNT: usize = 4;

    pub fn new() -> Self {
        Self {
            regs: vec![Reg::default(); Self::BANK_SIZE * Self::BANK_COUNT].into_boxed_slice(),
        }
    }

    /// Read a register from the FBI bank.
    pub fn get(&self, reg: usize) -> Reg {
        self.regs[reg & 0xff]
    }

    pub fn get_u32(&self, reg: usize) -> u32 {
        self.get(reg).0
    }

    pub fn set(&mut self, reg: usize, val: u32) {
        self.regs[reg & 0xff] = Reg(val);
    }

    pub fn banked(&self, bank: Bank, reg: usize) -> Reg {
        self.regs[bank.0 * Self::BANK_SIZE + (reg & 0xff)]
    }

    pub fn set_banked(&mut self, bank: Bank, reg: usize, val: u32) {
        self.regs[bank.0 * Self::BANK_SIZE + (reg & 0xff)] = Reg(val);
    }

    /// Store a value in every bank selected by the chip select bits.
    pub fn set_selected(&mut self, chips: u32, reg: usize, val: u32) {
        for bank in 0..Self::BANK_COUNT {
            if chips & (1 << bank) != 0 {
                self.set_banked(Bank(bank), reg, val);
            }
        }
    }

    /// Raw bytes of all banks, for save states.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.regs)
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.regs)
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selected_banks() {
        let mut regs = RegisterFile::new();
        regs.set_selected(0b101, TEXTURE_MODE, 7);
        assert_eq!(regs.get_u32(TEXTURE_MODE), 7);
        assert_eq!(regs.banked(Bank::tmu(0), TEXTURE_MODE).0, 0);
        assert_eq!(regs.banked(Bank::tmu(1), TEXTURE_MODE).0, 7);
    }

    #[test]
    fn save_state_bytes() {
        let mut regs = RegisterFile::new();
        regs.set(FBZ_MODE, 0x1234_5678);
        let saved = regs.as_bytes().to_vec();
        assert_eq!(saved.len(), 4 * RegisterFile::BANK_SIZE * RegisterFile::BANK_COUNT);

        let mut restored = RegisterFile::new();
        restored.as_bytes_mut().copy_from_slice(&saved);
        assert_eq!(restored.get_u32(FBZ_MODE), 0x1234_5678);
    }
}
