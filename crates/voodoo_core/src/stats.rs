use crate::regs::{self, RegisterFile};

/// Pixel counters collected while drawing. They are folded into the counter registers when
/// those are read.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Stats {
    pub pixels_in: u32,
    pub pixels_out: u32,
    pub chroma_fail: u32,
    pub zfunc_fail: u32,
    pub afunc_fail: u32,
    pub clip_fail: u32,
    pub stipple_count: u32,
}

impl Stats {
    pub fn add(&mut self, other: &Stats) {
        self.pixels_in = self.pixels_in.wrapping_add(other.pixels_in);
        self.pixels_out = self.pixels_out.wrapping_add(other.pixels_out);
        self.chroma_fail = self.chroma_fail.wrapping_add(other.chroma_fail);
        self.zfunc_fail = self.zfunc_fail.wrapping_add(other.zfunc_fail);
        self.afunc_fail = self.afunc_fail.wrapping_add(other.afunc_fail);
        self.clip_fail = self.clip_fail.wrapping_add(other.clip_fail);
        self.stipple_count = self.stipple_count.wrapping_add(other.stipple_count);
    }

    /// Add the counters that have a register to the register file. Clip and stipple counts
    /// are only kept for diagnostics.
    pub fn accumulate_into(&self, regs: &mut RegisterFile) {
        let counters = [
            (regs::FBI_PIXELS_IN, self.pixels_in),
            (regs::FBI_PIXELS_OUT, self.pixels_out),
            (regs::FBI_CHROMA_FAIL, self.chroma_fail),
            (regs::FBI_ZFUNC_FAIL, self.zfunc_fail),
            (regs::FBI_AFUNC_FAIL, self.afunc_fail),
        ];
        for (reg, count) in counters {
            regs.set(reg, regs.get_u32(reg).wrapping_add(count));
        }
    }
}

#[test]
fn accumulate_wraps() {
    let mut regs = RegisterFile::new();
    regs.set(regs::FBI_PIXELS_OUT, u32::MAX);
    let stats = Stats { pixels_out: 2, pixels_in: 5, ..Default::default() };
    stats.accumulate_into(&mut regs);
    assert_eq!(regs.get_u32(regs::FBI_PIXELS_OUT), 1);
    assert_eq!(regs.get_u32(regs::FBI_PIXELS_IN), 5);
}
