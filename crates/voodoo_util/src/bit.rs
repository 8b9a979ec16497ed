macro_rules! impl_bit {
    ($t:ident) => {
        impl Bit for $t {
            fn bit(self, n: usize) -> bool {
                (self >> n) & 1 == 1
            }

            fn bit_range(self, ls: usize, ms: usize) -> Self {
                let width = ms - ls + 1;
                if width >= $t::BITS as usize {
                    return self >> ls;
                }
                (self >> ls) & ((1 << width) - 1)
            }
        }
    }
}

macro_rules! impl_bit_set {
    ($t:ident) => {
        impl BitSet for $t {
            fn set_bit(self, bit: usize, val: bool) -> Self {
                (self & !(1 << bit)) | ((val as Self) << bit)
            }

            fn set_bit_range(self, ls: usize, ms: usize, val: Self) -> Self {
                let width = ms - ls + 1;
                let mask = if width >= $t::BITS as usize {
                    !0
                } else {
                    (1 << width) - 1
                };
                (self & !(mask << ls)) | ((val & mask) << ls)
            }
        }
    }
}

impl_bit!(u64);
impl_bit!(u32);
impl_bit!(u16);
impl_bit!(u8);

impl_bit_set!(u64);
impl_bit_set!(u32);
impl_bit_set!(u16);

/// Trait to extract a value between two given bit positions.
pub trait Bit {
    /// Extract a single bit.
    #[must_use]
    fn bit(self, n: usize) -> bool;

    /// Extract a range of bits. Both are inclusive.
    #[must_use]
    fn bit_range(self, ls: usize, ms: usize) -> Self;
}

/// Trait to replace bits of a value. Used when building register values.
pub trait BitSet {
    #[must_use]
    fn set_bit(self, bit: usize, val: bool) -> Self;

    #[must_use]
    fn set_bit_range(self, ls: usize, ms: usize, val: Self) -> Self;
}

#[test]
fn test_bit_range() {
    assert_eq!(0x3ff, 0xffff_ffff_u32.bit_range(22, 31));
    assert_eq!(0x1ff, (0x1ff_u32 << 11).bit_range(11, 19));
    assert_eq!(0xdead_beef, 0xdead_beef_u32.bit_range(0, 31));
    assert_eq!(0xf, 0xf0_u8.bit_range(4, 7));
}

#[test]
fn test_set_bit_range() {
    let a = 0_u32.set_bit_range(3, 4, 0b11);
    assert_eq!(0b11000, a);

    let a = 0_u32.set_bit_range(0, 10, u32::MAX);
    assert_eq!(0b11111111111, a);

    let a = 0_u32.set_bit_range(0, 31, 0x1234_5678);
    assert_eq!(0x1234_5678, a);

    let a = 0_u32.set_bit_range(14, 15, 0b01);
    assert_eq!(1 << 14, a);
}

#[test]
fn test_set_bit() {
    let a = 0_u32.set_bit(0, true);
    assert_eq!(1, a);

    let a = 0_u32.set_bit(27, true);
    assert_eq!(1 << 27, a);

    let a = 0b111_u32.set_bit(2, false);
    assert_eq!(0b011, a);
}
