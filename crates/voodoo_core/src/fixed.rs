//! Fixed-point helpers shared by the setup engine and the pixel pipeline.

use std::sync::OnceLock;

/// Number of bits used to index the reciprocal/log table.
const RECIPLOG_LOOKUP_BITS: u32 = 9;

/// Fractional precision of the table entries.
const RECIPLOG_LOOKUP_PREC: u32 = 22;

/// Convert an IEEE single to a signed fixed-point value with `fixed_bits` fractional bits.
/// Out of range exponents truncate to zero or saturate.
pub fn float_to_int32(data: u32, fixed_bits: i32) -> i32 {
    let exp = ((data >> 23) & 0xff) as i32 - 127 - 23 + fixed_bits;
    let mut result = ((data & 0x7fffff) | 0x800000) as i32;
    if exp < 0 {
        result = if exp > -32 { result >> -exp } else { 0 };
    } else {
        result = if exp < 32 { result.wrapping_shl(exp as u32) } else { 0x7fffffff };
    }
    if data & 0x80000000 != 0 {
        result = result.wrapping_neg();
    }
    result
}

/// Same as [`float_to_int32`] with a 64-bit result.
pub fn float_to_int64(data: u32, fixed_bits: i32) -> i64 {
    let exp = ((data >> 23) & 0xff) as i32 - 127 - 23 + fixed_bits;
    let mut result = ((data & 0x7fffff) | 0x800000) as i64;
    if exp < 0 {
        result = if exp > -64 { result >> -exp } else { 0 };
    } else {
        result = if exp < 64 { result.wrapping_shl(exp as u32) } else { i64::MAX };
    }
    if data & 0x80000000 != 0 {
        result = result.wrapping_neg();
    }
    result
}

/// Pairs of 1/n and log2(n) for n between 1.0 and 2.0.
fn reciplog_table() -> &'static [u32] {
    static TABLE: OnceLock<Box<[u32]>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let entries = 1 << RECIPLOG_LOOKUP_BITS;
        let mut table = vec![0; (2 << RECIPLOG_LOOKUP_BITS) + 2];
        for i in 0..=entries {
            let value = entries + i;
            table[i as usize * 2] = (1 << (RECIPLOG_LOOKUP_PREC + RECIPLOG_LOOKUP_BITS)) / value;
            table[i as usize * 2 + 1] = ((value as f64 / entries as f64).log2()
                * (1 << RECIPLOG_LOOKUP_PREC) as f64) as u32;
        }
        table.into_boxed_slice()
    })
}

/// Reciprocal of a 16.32 value as 16.16, along with log2 of the reciprocal as 24.8.
///
/// Zero maps to a saturated reciprocal with a huge log.
pub fn fast_reciplog(value: i64) -> (i64, i32) {
    let table = reciplog_table();

    let neg = value < 0;
    let value = value.wrapping_abs();

    let mut exp: i32 = 0;
    let mut temp = if value & 0xffff_0000_0000 != 0 {
        exp -= 16;
        (value >> 16) as u32
    } else {
        value as u32
    };

    if temp == 0 {
        return (if neg { 0x80000000 } else { 0x7fffffff }, 1000 << 8);
    }

    let lz = temp.leading_zeros();
    temp <<= lz;
    exp += lz as i32;

    let idx = ((temp >> (31 - RECIPLOG_LOOKUP_BITS - 1)) & ((2 << RECIPLOG_LOOKUP_BITS) - 2)) as usize;
    let interp = (temp >> (31 - RECIPLOG_LOOKUP_BITS - 8)) & 0xff;

    let rlog = (table[idx + 1] * (0x100 - interp) + table[idx + 3] * interp) >> 8;
    let mut recip = ((table[idx] * (0x100 - interp) + table[idx + 2] * interp) >> 8) as u64;

    // Round the log fraction down to 8 bits.
    let rlog = ((rlog + (1 << 13)) >> 14) as i32;
    let log = ((exp + 1) << 8) - rlog;

    exp -= 6;
    if exp < 0 {
        recip >>= -exp;
    } else {
        recip <<= exp;
    }

    let recip = recip as i64;
    (if neg { -recip } else { recip }, log)
}

/// Round to the nearest integer, with exact halves rounding down.
pub fn round_coordinate(value: f32) -> i32 {
    let result = value.floor() as i32;
    result + (value - result as f32 > 0.5) as i32
}

/// Convert an iterated 48-bit W to the 16-bit floating encoding used for depth and fog.
pub fn wfloat(iterw: i64) -> i32 {
    if iterw & 0xffff_0000_0000 != 0 {
        return 0;
    }
    let temp = iterw as u32;
    if temp & 0xffff_0000 == 0 {
        return 0xffff;
    }
    float_depth(temp)
}

/// The same floating encoding applied to an iterated Z, used when depth float select is on.
pub fn zfloat(iterz: i32) -> i32 {
    if iterz as u32 & 0xf000_0000 != 0 {
        return 0;
    }
    let temp = (iterz as u32) << 4;
    if temp & 0xffff_0000 == 0 {
        return 0xffff;
    }
    float_depth(temp)
}

fn float_depth(temp: u32) -> i32 {
    let exp = temp.leading_zeros() as i32;
    let value = (exp << 12) | ((!temp >> (19 - exp)) & 0xfff) as i32;
    if value < 0xffff {
        value + 1
    } else {
        value
    }
}

/// Clamp an iterated 12.12 color channel to 8 bits, or wrap it like the hardware does when
/// clamping is disabled.
pub fn clamped_channel(iter: i32, clamp: bool) -> i32 {
    let value = iter >> 12;
    if clamp {
        value.clamp(0, 0xff)
    } else {
        match value & 0xfff {
            0xfff => 0,
            0x100 => 0xff,
            v => v & 0xff,
        }
    }
}

/// Clamp an iterated 20.12 Z to 16 bits.
pub fn clamped_z(iterz: i32, clamp: bool) -> i32 {
    let value = iterz >> 12;
    if clamp {
        value.clamp(0, 0xffff)
    } else {
        match value & 0xfffff {
            0xfffff => 0,
            0x10000 => 0xffff,
            v => v & 0xffff,
        }
    }
}

/// Clamp the integer part of an iterated 16.32 W to 8 bits.
pub fn clamped_w(iterw: i64, clamp: bool) -> i32 {
    let value = (iterw >> 32) as i16 as i32;
    if clamp {
        value.clamp(0, 0xff)
    } else {
        match value & 0xffff {
            0xffff => 0,
            0x100 => 0xff,
            v => v & 0xff,
        }
    }
}

#[test]
fn float_conversion() {
    assert_eq!(float_to_int32(1.0f32.to_bits(), 4), 16);
    assert_eq!(float_to_int32((-2.5f32).to_bits(), 4), -40);
    assert_eq!(float_to_int32(1.0f32.to_bits(), 12), 4096);
    assert_eq!(float_to_int64(1.0f32.to_bits(), 32), 1 << 32);
    assert_eq!(float_to_int64(0.5f32.to_bits(), 32), 1 << 31);
}

#[test]
fn reciplog_of_one() {
    let (recip, log) = fast_reciplog(1 << 32);
    assert_eq!(recip, 1 << 15);
    assert_eq!(log, 0);
}

#[test]
fn reciplog_of_zero() {
    assert_eq!(fast_reciplog(0), (0x7fffffff, 1000 << 8));
}

#[test]
fn reciplog_of_two() {
    let (recip, log) = fast_reciplog(2 << 32);
    assert_eq!(recip, 1 << 14);
    assert_eq!(log, -256);
}

#[test]
fn rounding() {
    assert_eq!(round_coordinate(1.5), 1);
    assert_eq!(round_coordinate(1.51), 2);
    assert_eq!(round_coordinate(-0.25), 0);
    assert_eq!(round_coordinate(-0.75), -1);
}

#[test]
fn clamps_are_idempotent() {
    for z in [-1 << 12, 0, 0x1234 << 12, 0xffff << 12, 0x10000 << 12, 0x7fff_ffff] {
        for clamp in [false, true] {
            let once = clamped_z(z, clamp);
            assert_eq!(clamped_z(once << 12, clamp), once);
        }
    }
    for w in [-1i64 << 32, 0, 0x80 << 32, 0xff << 32, 0x100 << 32, 0x7fff << 32] {
        for clamp in [false, true] {
            let once = clamped_w(w, clamp);
            assert_eq!(clamped_w((once as i64) << 32, clamp), once);
        }
    }
}

#[test]
fn wfloat_edges() {
    assert_eq!(wfloat(1 << 32), 0);
    assert_eq!(wfloat(0x0000_ffff), 0xffff);
    assert_eq!(wfloat(0x8000_0000), 0x1000);
    assert_eq!(wfloat(0xffff_ffff), 1);
}
