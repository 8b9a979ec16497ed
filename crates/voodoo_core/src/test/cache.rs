use super::{corner_triangle, with_layout, write};

use crate::raster::{PipelineRegs, RasterCache};
use crate::regs::{self, FbzMode, RegisterFile};
use crate::{ChipType, Voodoo, VoodooError};

fn draw(voodoo: &mut Voodoo) {
    corner_triangle(voodoo, 0x80, 0x80, 0x80);
    write(voodoo, regs::TRIANGLE_CMD, 0);
}

#[test]
fn same_modes_share_entry() {
    let mut voodoo = with_layout(ChipType::Voodoo1);
    write(&mut voodoo, regs::FBZ_MODE, 1 << 9);
    draw(&mut voodoo);
    draw(&mut voodoo);

    let cache = voodoo.raster_cache();
    assert_eq!(cache.len(), 1);

    let entry = &cache.entries()[0];
    assert_eq!((entry.hits, entry.polys), (1, 2));
    assert_eq!(cache.bucket(entry.key.bucket()), &[0]);
}

#[test]
fn mode_change_adds_entry() {
    let mut voodoo = with_layout(ChipType::Voodoo1);
    write(&mut voodoo, regs::FBZ_MODE, 1 << 9);
    draw(&mut voodoo);
    write(&mut voodoo, regs::FBZ_MODE, 1 << 9 | 1 << 8);
    draw(&mut voodoo);

    assert_eq!(voodoo.raster_cache().len(), 2);
}

#[test]
fn dont_care_bits_are_ignored() {
    let mut voodoo = with_layout(ChipType::Voodoo1);
    write(&mut voodoo, regs::FBZ_MODE, 1 << 9);
    draw(&mut voodoo);

    // Blend factors without blending, and another draw buffer.
    write(&mut voodoo, regs::ALPHA_MODE, 0x0000_ff00);
    write(&mut voodoo, regs::FBZ_MODE, 1 << 9 | 1 << 14);
    draw(&mut voodoo);

    assert_eq!(voodoo.raster_cache().len(), 1);
}

#[test]
fn textured_draw_gets_own_entry() {
    let mut voodoo = with_layout(ChipType::Voodoo1);
    write(&mut voodoo, regs::FBZ_MODE, 1 << 9);
    draw(&mut voodoo);
    write(&mut voodoo, regs::FBZ_COLOR_PATH, 1 << 27);
    draw(&mut voodoo);

    let cache = voodoo.raster_cache();
    assert_eq!(cache.len(), 2);
    assert_ne!(cache.entries()[0].routine, cache.entries()[1].routine);
}

#[test]
fn cache_overflow() {
    let mut cache = RasterCache::new();
    let mut regs = PipelineRegs::capture(&RegisterFile::new());

    for mode in 0..RasterCache::MAX_ENTRIES as u32 {
        regs.fbz_mode = FbzMode(mode);
        assert!(cache.resolve(&regs, 0).is_ok());
    }
    assert_eq!(cache.len(), RasterCache::MAX_ENTRIES);

    // Known keys are still found.
    regs.fbz_mode = FbzMode(5);
    assert!(cache.resolve(&regs, 0).is_ok());

    regs.fbz_mode = FbzMode(1 << 10);
    assert!(matches!(cache.resolve(&regs, 0), Err(VoodooError::RasterizerOverflow)));
}
