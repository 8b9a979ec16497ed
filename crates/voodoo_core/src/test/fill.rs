use super::{aux_pixel, pixel, read, with_layout, write};

use crate::regs;
use crate::{Buffer, ChipType};

const RGB_MASK: u32 = 1 << 9;
const AUX_MASK: u32 = 1 << 10;

#[test]
fn fill_clip_rect() {
    let mut voodoo = with_layout(ChipType::Voodoo1);
    write(&mut voodoo, regs::CLIP_LEFT_RIGHT, 10 << 16 | 20);
    write(&mut voodoo, regs::CLIP_LOW_Y_HIGH_Y, 5 << 16 | 8);
    write(&mut voodoo, regs::COLOR1, 0x00ff_0000);
    write(&mut voodoo, regs::ZA_COLOR, 0x1234);
    write(&mut voodoo, regs::FBZ_MODE, RGB_MASK | AUX_MASK);
    write(&mut voodoo, regs::FASTFILL_CMD, 0);

    assert_eq!(pixel(&voodoo, Buffer::Front, 10, 5), 0xf800);
    assert_eq!(pixel(&voodoo, Buffer::Front, 19, 7), 0xf800);
    assert_eq!(pixel(&voodoo, Buffer::Front, 9, 5), 0);
    assert_eq!(pixel(&voodoo, Buffer::Front, 20, 5), 0);
    assert_eq!(pixel(&voodoo, Buffer::Front, 10, 8), 0);
    assert_eq!(pixel(&voodoo, Buffer::Back, 10, 5), 0);

    assert_eq!(aux_pixel(&voodoo, 10, 5), 0x1234);
    assert_eq!(aux_pixel(&voodoo, 20, 5), 0);

    assert_eq!(read(&mut voodoo, regs::FBI_PIXELS_OUT), 30);
}

#[test]
fn fill_needs_a_mask() {
    let mut voodoo = with_layout(ChipType::Voodoo1);
    write(&mut voodoo, regs::CLIP_LEFT_RIGHT, 20);
    write(&mut voodoo, regs::CLIP_LOW_Y_HIGH_Y, 20);
    write(&mut voodoo, regs::COLOR1, 0x00ff_ffff);
    write(&mut voodoo, regs::FASTFILL_CMD, 0);

    assert_eq!(pixel(&voodoo, Buffer::Front, 0, 0), 0);
    assert_eq!(read(&mut voodoo, regs::FBI_PIXELS_OUT), 0);
}

#[test]
fn inverted_clip_fills_nothing() {
    let mut voodoo = with_layout(ChipType::Voodoo1);
    write(&mut voodoo, regs::CLIP_LEFT_RIGHT, 8 << 16 | 4);
    write(&mut voodoo, regs::CLIP_LOW_Y_HIGH_Y, 2);
    write(&mut voodoo, regs::COLOR1, 0x00ff_0000);
    write(&mut voodoo, regs::ZA_COLOR, 0x1234);
    write(&mut voodoo, regs::FBZ_MODE, RGB_MASK | AUX_MASK);
    write(&mut voodoo, regs::FASTFILL_CMD, 0);

    for x in 0..10 {
        assert_eq!(pixel(&voodoo, Buffer::Front, x, 0), 0);
        assert_eq!(aux_pixel(&voodoo, x, 1), 0);
    }

    // Two rows of width -4.
    assert_eq!(read(&mut voodoo, regs::FBI_PIXELS_OUT), 0x00ff_fff8);
}

#[test]
fn fill_aux_only() {
    let mut voodoo = with_layout(ChipType::Voodoo1);
    write(&mut voodoo, regs::CLIP_LEFT_RIGHT, 4);
    write(&mut voodoo, regs::CLIP_LOW_Y_HIGH_Y, 4);
    write(&mut voodoo, regs::COLOR1, 0x00ff_ffff);
    write(&mut voodoo, regs::ZA_COLOR, 0xabcd_ffff);
    write(&mut voodoo, regs::FBZ_MODE, AUX_MASK);
    write(&mut voodoo, regs::FASTFILL_CMD, 0);

    assert_eq!(pixel(&voodoo, Buffer::Front, 0, 0), 0);
    assert_eq!(aux_pixel(&voodoo, 3, 3), 0xffff);
    assert_eq!(read(&mut voodoo, regs::FBI_PIXELS_OUT), 0);
}

#[test]
fn fill_back_buffer_and_swap() {
    let mut voodoo = with_layout(ChipType::Voodoo1);
    write(&mut voodoo, regs::CLIP_LEFT_RIGHT, 640);
    write(&mut voodoo, regs::CLIP_LOW_Y_HIGH_Y, 480);
    write(&mut voodoo, regs::COLOR1, 0x0000_00ff);
    write(&mut voodoo, regs::FBZ_MODE, RGB_MASK | 1 << 14);
    write(&mut voodoo, regs::FASTFILL_CMD, 0);

    assert_eq!(pixel(&voodoo, Buffer::Front, 639, 479), 0);
    assert_eq!(pixel(&voodoo, Buffer::Back, 639, 479), 0x001f);

    write(&mut voodoo, regs::SWAPBUFFER_CMD, 0);
    assert!(voodoo.buffer_words(Buffer::Front).iter().all(|&p| p == 0x001f));
    assert_eq!(pixel(&voodoo, Buffer::Back, 0, 0), 0);
}

#[test]
fn swap_can_be_held_on_voodoo2() {
    let mut voodoo = with_layout(ChipType::Voodoo2);
    write(&mut voodoo, regs::SWAPBUFFER_CMD, 1 << 9);
    assert_eq!(voodoo.fbi().frontbuf, 0);

    write(&mut voodoo, regs::SWAPBUFFER_CMD, 0);
    assert_eq!(voodoo.fbi().frontbuf, 1);
}

#[test]
fn fill_with_y_origin() {
    let mut voodoo = with_layout(ChipType::Voodoo1);
    write(&mut voodoo, regs::FBI_INIT3, 479 << 22);
    write(&mut voodoo, regs::CLIP_LEFT_RIGHT, 1);
    write(&mut voodoo, regs::CLIP_LOW_Y_HIGH_Y, 1);
    write(&mut voodoo, regs::COLOR1, 0x0000_ff00);
    write(&mut voodoo, regs::FBZ_MODE, RGB_MASK | 1 << 17);
    write(&mut voodoo, regs::FASTFILL_CMD, 0);

    assert_eq!(pixel(&voodoo, Buffer::Front, 0, 0), 0);
    assert_eq!(pixel(&voodoo, Buffer::Front, 0, 479), 0x07e0);
}

#[test]
fn dithered_fill_repeats_every_four_pixels() {
    let mut voodoo = with_layout(ChipType::Voodoo1);
    write(&mut voodoo, regs::CLIP_LEFT_RIGHT, 8);
    write(&mut voodoo, regs::CLIP_LOW_Y_HIGH_Y, 1);
    write(&mut voodoo, regs::COLOR1, 0x0080_8080);
    write(&mut voodoo, regs::FBZ_MODE, RGB_MASK | 1 << 8);
    write(&mut voodoo, regs::FASTFILL_CMD, 0);

    let row: Vec<u16> = (0..8).map(|x| pixel(&voodoo, Buffer::Front, x, 0)).collect();
    assert_ne!(row[0], row[1]);
    assert_eq!(row[..4], row[4..]);
}
