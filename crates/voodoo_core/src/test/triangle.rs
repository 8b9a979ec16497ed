use super::{corner_triangle, pixel, read, with_layout, write, write_f32, CORNER_PIXELS};

use crate::regs;
use crate::{Buffer, ChipType, Voodoo};

const RGB_MASK: u32 = 1 << 9;

fn full_clip(voodoo: &mut Voodoo) {
    write(voodoo, regs::CLIP_LEFT_RIGHT, 640);
    write(voodoo, regs::CLIP_LOW_Y_HIGH_Y, 480);
}

#[test]
fn flat_triangle() {
    let mut voodoo = with_layout(ChipType::Voodoo1);
    write(&mut voodoo, regs::FBZ_MODE, RGB_MASK);
    corner_triangle(&mut voodoo, 0xff, 0, 0);
    write(&mut voodoo, regs::TRIANGLE_CMD, 0);

    assert_eq!(pixel(&voodoo, Buffer::Front, 0, 0), 0xf800);
    assert_eq!(pixel(&voodoo, Buffer::Front, 14, 0), 0xf800);
    assert_eq!(pixel(&voodoo, Buffer::Front, 0, 14), 0xf800);
    assert_eq!(pixel(&voodoo, Buffer::Front, 15, 0), 0);
    assert_eq!(pixel(&voodoo, Buffer::Front, 1, 14), 0);
    assert_eq!(pixel(&voodoo, Buffer::Front, 0, 15), 0);

    assert_eq!(read(&mut voodoo, regs::FBI_PIXELS_IN), CORNER_PIXELS);
    assert_eq!(read(&mut voodoo, regs::FBI_PIXELS_OUT), CORNER_PIXELS);
    assert_eq!(read(&mut voodoo, regs::FBI_TRIANGLES_OUT), 1);
}

#[test]
fn float_triangle_command() {
    let mut voodoo = with_layout(ChipType::Voodoo1);
    write(&mut voodoo, regs::FBZ_MODE, RGB_MASK);
    write_f32(&mut voodoo, regs::VERTEX_BX + regs::FLOAT_OFFSET, 16.0);
    write_f32(&mut voodoo, regs::VERTEX_CY + regs::FLOAT_OFFSET, 16.0);
    write_f32(&mut voodoo, regs::START_G + regs::FLOAT_OFFSET, 255.0);
    write(&mut voodoo, regs::F_TRIANGLE_CMD, 0);

    assert_eq!(pixel(&voodoo, Buffer::Front, 3, 3), 0x07e0);
    assert_eq!(read(&mut voodoo, regs::FBI_PIXELS_OUT), CORNER_PIXELS);
}

#[test]
fn degenerate_triangle_still_counts() {
    let mut voodoo = with_layout(ChipType::Voodoo1);
    write(&mut voodoo, regs::FBZ_MODE, RGB_MASK);
    write(&mut voodoo, regs::START_R, 0xff << 12);
    write(&mut voodoo, regs::TRIANGLE_CMD, 0);

    assert_eq!(read(&mut voodoo, regs::FBI_PIXELS_OUT), 0);
    assert_eq!(read(&mut voodoo, regs::FBI_TRIANGLES_OUT), 1);
}

#[test]
fn reserved_draw_buffer_drops_triangle() {
    let mut voodoo = with_layout(ChipType::Voodoo1);
    write(&mut voodoo, regs::FBZ_MODE, RGB_MASK | 3 << 14);
    corner_triangle(&mut voodoo, 0xff, 0xff, 0xff);
    write(&mut voodoo, regs::TRIANGLE_CMD, 0);

    assert_eq!(read(&mut voodoo, regs::FBI_PIXELS_IN), 0);
    assert_eq!(read(&mut voodoo, regs::FBI_TRIANGLES_OUT), 0);
}

#[test]
fn clipped_triangle() {
    let mut voodoo = with_layout(ChipType::Voodoo1);
    write(&mut voodoo, regs::CLIP_LEFT_RIGHT, 5);
    write(&mut voodoo, regs::CLIP_LOW_Y_HIGH_Y, 4);
    write(&mut voodoo, regs::FBZ_MODE, RGB_MASK | 1);
    corner_triangle(&mut voodoo, 0xff, 0, 0);
    write(&mut voodoo, regs::TRIANGLE_CMD, 0);

    assert_eq!(pixel(&voodoo, Buffer::Front, 3, 0), 0xf800);
    // The right edge of the clip rectangle loses one more column.
    assert_eq!(pixel(&voodoo, Buffer::Front, 4, 0), 0);
    assert_eq!(pixel(&voodoo, Buffer::Front, 0, 4), 0);

    assert_eq!(read(&mut voodoo, regs::FBI_PIXELS_OUT), 16);
    assert_eq!(read(&mut voodoo, regs::FBI_PIXELS_IN), 116);
}

#[test]
fn depth_test() {
    let mut voodoo = with_layout(ChipType::Voodoo1);
    full_clip(&mut voodoo);
    write(&mut voodoo, regs::ZA_COLOR, 0x1000);
    write(&mut voodoo, regs::FBZ_MODE, 1 << 10);
    write(&mut voodoo, regs::FASTFILL_CMD, 0);

    // Depth buffering with the less than function.
    write(&mut voodoo, regs::FBZ_MODE, RGB_MASK | 1 << 4 | 1 << 5);
    corner_triangle(&mut voodoo, 0xff, 0, 0);
    write(&mut voodoo, regs::START_Z, 0x2000 << 12);
    write(&mut voodoo, regs::TRIANGLE_CMD, 0);

    assert_eq!(read(&mut voodoo, regs::FBI_ZFUNC_FAIL), CORNER_PIXELS);
    assert_eq!(read(&mut voodoo, regs::FBI_PIXELS_OUT), 0);
    assert_eq!(pixel(&voodoo, Buffer::Front, 0, 0), 0);

    write(&mut voodoo, regs::START_Z, 0x800 << 12);
    write(&mut voodoo, regs::TRIANGLE_CMD, 0);

    assert_eq!(read(&mut voodoo, regs::FBI_ZFUNC_FAIL), CORNER_PIXELS);
    assert_eq!(read(&mut voodoo, regs::FBI_PIXELS_OUT), CORNER_PIXELS);
    assert_eq!(pixel(&voodoo, Buffer::Front, 0, 0), 0xf800);
}

#[test]
fn depth_write() {
    let mut voodoo = with_layout(ChipType::Voodoo1);
    write(&mut voodoo, regs::FBZ_MODE, RGB_MASK | 1 << 10);
    corner_triangle(&mut voodoo, 0, 0, 0xff);
    write(&mut voodoo, regs::START_Z, 0x1234 << 12);
    write(&mut voodoo, regs::TRIANGLE_CMD, 0);

    assert_eq!(pixel(&voodoo, Buffer::Front, 2, 2), 0x001f);
    assert_eq!(super::aux_pixel(&voodoo, 2, 2), 0x1234);
}

#[test]
fn chroma_key() {
    let mut voodoo = with_layout(ChipType::Voodoo1);
    write(&mut voodoo, regs::CHROMA_KEY, 0x00ff_0000);
    write(&mut voodoo, regs::FBZ_MODE, RGB_MASK | 1 << 1);
    corner_triangle(&mut voodoo, 0xff, 0, 0);
    write(&mut voodoo, regs::TRIANGLE_CMD, 0);

    assert_eq!(read(&mut voodoo, regs::FBI_CHROMA_FAIL), CORNER_PIXELS);
    assert_eq!(read(&mut voodoo, regs::FBI_PIXELS_OUT), 0);

    corner_triangle(&mut voodoo, 0xfe, 0, 0);
    write(&mut voodoo, regs::TRIANGLE_CMD, 0);
    assert_eq!(read(&mut voodoo, regs::FBI_PIXELS_OUT), CORNER_PIXELS);
}

#[test]
fn alpha_test() {
    let mut voodoo = with_layout(ChipType::Voodoo1);
    // Greater than 0x80.
    write(&mut voodoo, regs::ALPHA_MODE, 1 | 4 << 1 | 0x80 << 24);
    write(&mut voodoo, regs::FBZ_MODE, RGB_MASK);
    corner_triangle(&mut voodoo, 0xff, 0, 0);
    write(&mut voodoo, regs::START_A, 0x40 << 12);
    write(&mut voodoo, regs::TRIANGLE_CMD, 0);

    assert_eq!(read(&mut voodoo, regs::FBI_AFUNC_FAIL), CORNER_PIXELS);
    assert_eq!(read(&mut voodoo, regs::FBI_PIXELS_OUT), 0);

    write(&mut voodoo, regs::START_A, 0xc0 << 12);
    write(&mut voodoo, regs::TRIANGLE_CMD, 0);
    assert_eq!(read(&mut voodoo, regs::FBI_PIXELS_OUT), CORNER_PIXELS);
}

#[test]
fn stipple_rotates_per_pixel() {
    let mut voodoo = with_layout(ChipType::Voodoo1);
    write(&mut voodoo, regs::STIPPLE, 0x8000_0000);
    write(&mut voodoo, regs::FBZ_MODE, RGB_MASK | 1 << 2);
    corner_triangle(&mut voodoo, 0xff, 0, 0);
    write(&mut voodoo, regs::TRIANGLE_CMD, 0);

    // Every 32nd pixel passes, and the pattern is left rotated by 120.
    assert_eq!(read(&mut voodoo, regs::FBI_PIXELS_OUT), 3);
    assert_eq!(voodoo.regs().get_u32(regs::STIPPLE), 0x0080_0000);
}

#[test]
fn subpixel_correction_moves_start() {
    let mut voodoo = with_layout(ChipType::Voodoo1);
    write(&mut voodoo, regs::FBZ_COLOR_PATH, 1 << 26);
    write(&mut voodoo, regs::FBZ_MODE, RGB_MASK);
    corner_triangle(&mut voodoo, 0, 0, 0);
    write(&mut voodoo, regs::D_R_DX, 1 << 12);
    write(&mut voodoo, regs::TRIANGLE_CMD, 0);

    // Half a pixel into the gradient.
    assert_eq!(voodoo.fbi().grad.startr, 1 << 11);
}

fn setup_vertex(voodoo: &mut Voodoo, x: f32, y: f32, cmd: usize) {
    write_f32(voodoo, regs::S_VX, x);
    write_f32(voodoo, regs::S_VY, y);
    write(voodoo, cmd, 0);
}

fn setup_triangle(voodoo: &mut Voodoo, mode: u32) {
    write(voodoo, regs::S_SETUP_MODE, mode);
    write(voodoo, regs::S_ARGB, 0x00ff_0000);
    setup_vertex(voodoo, 0.0, 0.0, regs::S_BEGIN_TRI_CMD);
    setup_vertex(voodoo, 16.0, 0.0, regs::S_DRAW_TRI_CMD);
    setup_vertex(voodoo, 0.0, 16.0, regs::S_DRAW_TRI_CMD);
}

#[test]
fn setup_engine_strip() {
    let mut voodoo = with_layout(ChipType::Voodoo2);
    write(&mut voodoo, regs::FBZ_MODE, RGB_MASK);
    setup_triangle(&mut voodoo, 1);

    assert_eq!(pixel(&voodoo, Buffer::Front, 0, 0), 0xf800);
    assert_eq!(pixel(&voodoo, Buffer::Front, 14, 0), 0xf800);
    assert_eq!(read(&mut voodoo, regs::FBI_PIXELS_OUT), CORNER_PIXELS);
    assert_eq!(read(&mut voodoo, regs::FBI_TRIANGLES_OUT), 1);
}

#[test]
fn setup_engine_needs_three_vertices() {
    let mut voodoo = with_layout(ChipType::Voodoo2);
    write(&mut voodoo, regs::FBZ_MODE, RGB_MASK);
    write(&mut voodoo, regs::S_SETUP_MODE, 1);
    setup_vertex(&mut voodoo, 0.0, 0.0, regs::S_BEGIN_TRI_CMD);
    setup_vertex(&mut voodoo, 16.0, 0.0, regs::S_DRAW_TRI_CMD);

    assert_eq!(read(&mut voodoo, regs::FBI_TRIANGLES_OUT), 0);
}

#[test]
fn setup_engine_culling() {
    let mut voodoo = with_layout(ChipType::Voodoo2);
    write(&mut voodoo, regs::FBZ_MODE, RGB_MASK);

    setup_triangle(&mut voodoo, 1 | 1 << 17);
    assert_eq!(read(&mut voodoo, regs::FBI_TRIANGLES_OUT), 0);
    assert_eq!(pixel(&voodoo, Buffer::Front, 0, 0), 0);

    setup_triangle(&mut voodoo, 1 | 1 << 17 | 1 << 18);
    assert_eq!(read(&mut voodoo, regs::FBI_TRIANGLES_OUT), 1);
    assert_eq!(pixel(&voodoo, Buffer::Front, 0, 0), 0xf800);
}

#[test]
fn setup_engine_drops_degenerate() {
    let mut voodoo = with_layout(ChipType::Voodoo2);
    write(&mut voodoo, regs::FBZ_MODE, RGB_MASK);
    write(&mut voodoo, regs::S_SETUP_MODE, 1);
    setup_vertex(&mut voodoo, 4.0, 4.0, regs::S_BEGIN_TRI_CMD);
    setup_vertex(&mut voodoo, 4.0, 4.0, regs::S_DRAW_TRI_CMD);
    setup_vertex(&mut voodoo, 4.0, 4.0, regs::S_DRAW_TRI_CMD);

    assert_eq!(read(&mut voodoo, regs::FBI_TRIANGLES_OUT), 0);
}

#[test]
fn colinear_triangle_is_culled() {
    for mode in [1 | 1 << 17, 1 | 1 << 17 | 1 << 18] {
        let mut voodoo = with_layout(ChipType::Voodoo2);
        write(&mut voodoo, regs::FBZ_MODE, RGB_MASK);
        write(&mut voodoo, regs::S_SETUP_MODE, mode);
        write(&mut voodoo, regs::S_ARGB, 0x00ff_0000);
        setup_vertex(&mut voodoo, 0.0, 0.0, regs::S_BEGIN_TRI_CMD);
        setup_vertex(&mut voodoo, 8.0, 8.0, regs::S_DRAW_TRI_CMD);
        setup_vertex(&mut voodoo, 16.0, 16.0, regs::S_DRAW_TRI_CMD);

        assert_eq!(pixel(&voodoo, Buffer::Front, 8, 8), 0);
        assert_eq!(read(&mut voodoo, regs::FBI_PIXELS_OUT), 0);
        assert_eq!(read(&mut voodoo, regs::FBI_TRIANGLES_OUT), 0);
    }
}
