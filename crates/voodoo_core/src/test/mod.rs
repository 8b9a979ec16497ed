mod cache;
mod fill;
mod triangle;

use crate::{regs, Buffer, ChipType, Config, Voodoo};

/// Word offset of the linear frame buffer.
pub const LFB_BASE: u32 = 0x10_0000;

/// Word offset of texture memory.
pub const TEXTURE_BASE: u32 = 0x20_0000;

pub const WIDTH: usize = 640;

pub fn chip(chip: ChipType) -> Voodoo {
    match Voodoo::new(&Config::preset(chip)) {
        Ok(voodoo) => voodoo,
        Err(error) => panic!("{error}"),
    }
}

/// A chip with two 640x480 color buffers followed by an aux buffer.
pub fn with_layout(chip_type: ChipType) -> Voodoo {
    let mut voodoo = chip(chip_type);
    voodoo.set_init_enable(1);
    write(&mut voodoo, regs::FBI_INIT1, 10 << 4);
    write(&mut voodoo, regs::FBI_INIT2, 150 << 11);
    voodoo
}

pub fn write(voodoo: &mut Voodoo, reg: usize, data: u32) {
    voodoo.write(reg as u32, data, 0xffff_ffff).unwrap();
}

pub fn write_f32(voodoo: &mut Voodoo, reg: usize, val: f32) {
    write(voodoo, reg, val.to_bits());
}

pub fn read(voodoo: &mut Voodoo, reg: usize) -> u32 {
    voodoo.read(reg as u32)
}

pub fn pixel(voodoo: &Voodoo, buffer: Buffer, x: usize, y: usize) -> u16 {
    voodoo.buffer_words(buffer)[y * WIDTH + x]
}

pub fn aux_pixel(voodoo: &Voodoo, x: usize, y: usize) -> u16 {
    let aux = voodoo.fbi().auxoffs.unwrap();
    voodoo.fbi().load(aux, (y * WIDTH + x) as u32)
}

/// Set up the triangle (0, 0), (16, 0), (0, 16) with a constant color. It covers
/// `15 - y` pixels of row `y`, 120 in total.
pub fn corner_triangle(voodoo: &mut Voodoo, r: u32, g: u32, b: u32) {
    write(voodoo, regs::VERTEX_AX, 0);
    write(voodoo, regs::VERTEX_AY, 0);
    write(voodoo, regs::VERTEX_BX, 16 << 4);
    write(voodoo, regs::VERTEX_BY, 0);
    write(voodoo, regs::VERTEX_CX, 0);
    write(voodoo, regs::VERTEX_CY, 16 << 4);
    write(voodoo, regs::START_R, r << 12);
    write(voodoo, regs::START_G, g << 12);
    write(voodoo, regs::START_B, b << 12);
}

pub const CORNER_PIXELS: u32 = 120;
