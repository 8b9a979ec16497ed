//! Bit-field views of the mode registers.

use voodoo_util::Bit;

use std::fmt;

/// Comparison used by the depth and alpha tests.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CompareFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

impl CompareFunc {
    pub fn from_value(value: u32) -> Self {
        match value {
            0 => CompareFunc::Never,
            1 => CompareFunc::Less,
            2 => CompareFunc::Equal,
            3 => CompareFunc::LessEqual,
            4 => CompareFunc::Greater,
            5 => CompareFunc::NotEqual,
            6 => CompareFunc::GreaterEqual,
            7 => CompareFunc::Always,
            _ => unreachable!("Invalid compare function"),
        }
    }

    /// Returns true if `src` passes when compared against `reference`.
    pub fn passes(self, src: i32, reference: i32) -> bool {
        match self {
            CompareFunc::Never => false,
            CompareFunc::Less => src < reference,
            CompareFunc::Equal => src == reference,
            CompareFunc::LessEqual => src <= reference,
            CompareFunc::Greater => src > reference,
            CompareFunc::NotEqual => src != reference,
            CompareFunc::GreaterEqual => src >= reference,
            CompareFunc::Always => true,
        }
    }
}

impl fmt::Display for CompareFunc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match *self {
            CompareFunc::Never => "never",
            CompareFunc::Less => "less",
            CompareFunc::Equal => "equal",
            CompareFunc::LessEqual => "less or equal",
            CompareFunc::Greater => "greater",
            CompareFunc::NotEqual => "not equal",
            CompareFunc::GreaterEqual => "greater or equal",
            CompareFunc::Always => "always",
        })
    }
}

/// The fbzColorPath register. Controls the color combine unit.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FbzColorPath(pub u32);

impl FbzColorPath {
    /// Source of the "other" color. 0 iterated, 1 texture, 2 color1, 3 reserved.
    pub fn rgb_select(self) -> u32 {
        self.0.bit_range(0, 1)
    }

    /// Source of the "other" alpha. Same encoding as `rgb_select`.
    pub fn alpha_select(self) -> u32 {
        self.0.bit_range(2, 3)
    }

    /// Use color0 instead of the iterated color as the local color.
    pub fn local_select(self) -> bool {
        self.0.bit(4)
    }

    /// Source of the local alpha. 0 iterated, 1 color0, 2 clamped Z, 3 clamped W.
    pub fn alpha_local_select(self) -> u32 {
        self.0.bit_range(5, 6)
    }

    /// Pick the local color from the top bit of the texture alpha.
    pub fn local_select_override(self) -> bool {
        self.0.bit(7)
    }

    pub fn zero_other(self) -> bool {
        self.0.bit(8)
    }

    pub fn sub_clocal(self) -> bool {
        self.0.bit(9)
    }

    pub fn mselect(self) -> u32 {
        self.0.bit_range(10, 12)
    }

    pub fn reverse_blend(self) -> bool {
        self.0.bit(13)
    }

    pub fn add_aclocal(self) -> u32 {
        self.0.bit_range(14, 15)
    }

    pub fn invert_output(self) -> bool {
        self.0.bit(16)
    }

    pub fn alpha_zero_other(self) -> bool {
        self.0.bit(17)
    }

    pub fn alpha_sub_clocal(self) -> bool {
        self.0.bit(18)
    }

    pub fn alpha_mselect(self) -> u32 {
        self.0.bit_range(19, 21)
    }

    pub fn alpha_reverse_blend(self) -> bool {
        self.0.bit(22)
    }

    pub fn alpha_add_aclocal(self) -> u32 {
        self.0.bit_range(23, 24)
    }

    pub fn alpha_invert_output(self) -> bool {
        self.0.bit(25)
    }

    /// Adjust the start values for the sub-pixel position of vertex A.
    pub fn subpixel_adjust(self) -> bool {
        self.0.bit(26)
    }

    pub fn texture_enable(self) -> bool {
        self.0.bit(27)
    }

    /// Saturate iterated values instead of wrapping them. Voodoo2 only.
    pub fn rgbzw_clamp(self) -> bool {
        self.0.bit(28)
    }
}

/// The alphaMode register.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AlphaMode(pub u32);

impl AlphaMode {
    pub fn alpha_test(self) -> bool {
        self.0.bit(0)
    }

    pub fn alpha_func(self) -> CompareFunc {
        CompareFunc::from_value(self.0.bit_range(1, 3))
    }

    pub fn alpha_blend(self) -> bool {
        self.0.bit(4)
    }

    pub fn src_rgb_blend(self) -> u32 {
        self.0.bit_range(8, 11)
    }

    pub fn dst_rgb_blend(self) -> u32 {
        self.0.bit_range(12, 15)
    }

    pub fn src_alpha_blend(self) -> u32 {
        self.0.bit_range(16, 19)
    }

    pub fn dst_alpha_blend(self) -> u32 {
        self.0.bit_range(20, 23)
    }

    /// Reference value of the alpha test.
    pub fn alpha_ref(self) -> u32 {
        self.0.bit_range(24, 31)
    }
}

/// The fogMode register.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FogMode(pub u32);

impl FogMode {
    pub fn enabled(self) -> bool {
        self.0.bit(0)
    }

    pub fn fog_add(self) -> bool {
        self.0.bit(1)
    }

    pub fn fog_mult(self) -> bool {
        self.0.bit(2)
    }

    /// Source of the fog blend factor. 0 table, 1 iterated alpha, 2 clamped Z, 3 clamped W.
    pub fn zalpha(self) -> u32 {
        self.0.bit_range(3, 4)
    }

    pub fn constant(self) -> bool {
        self.0.bit(5)
    }

    pub fn dither(self) -> bool {
        self.0.bit(6)
    }

    pub fn zones(self) -> bool {
        self.0.bit(7)
    }
}

/// The fbzMode register.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FbzMode(pub u32);

impl FbzMode {
    pub fn clipping(self) -> bool {
        self.0.bit(0)
    }

    pub fn chroma_key(self) -> bool {
        self.0.bit(1)
    }

    pub fn stipple(self) -> bool {
        self.0.bit(2)
    }

    /// Use the floating W value as depth instead of Z.
    pub fn wbuffer_select(self) -> bool {
        self.0.bit(3)
    }

    pub fn depth_buffer(self) -> bool {
        self.0.bit(4)
    }

    pub fn depth_func(self) -> CompareFunc {
        CompareFunc::from_value(self.0.bit_range(5, 7))
    }

    pub fn dithering(self) -> bool {
        self.0.bit(8)
    }

    pub fn rgb_mask(self) -> bool {
        self.0.bit(9)
    }

    pub fn aux_mask(self) -> bool {
        self.0.bit(10)
    }

    /// Use the 2x2 dither matrix instead of the 4x4 one.
    pub fn dither_2x2(self) -> bool {
        self.0.bit(11)
    }

    /// Use the stipple register as a fixed pattern instead of rotating it.
    pub fn stipple_pattern(self) -> bool {
        self.0.bit(12)
    }

    pub fn alpha_mask(self) -> bool {
        self.0.bit(13)
    }

    /// 0 front buffer, 1 back buffer, otherwise reserved.
    pub fn draw_buffer(self) -> u32 {
        self.0.bit_range(14, 15)
    }

    pub fn depth_bias(self) -> bool {
        self.0.bit(16)
    }

    pub fn y_origin(self) -> bool {
        self.0.bit(17)
    }

    /// Store alpha in the aux buffer instead of depth.
    pub fn alpha_planes(self) -> bool {
        self.0.bit(18)
    }

    pub fn alpha_dither_subtract(self) -> bool {
        self.0.bit(19)
    }

    /// Compare against zaColor instead of the computed depth.
    pub fn depth_source_compare(self) -> bool {
        self.0.bit(20)
    }

    /// Voodoo2 only.
    pub fn depth_float_select(self) -> bool {
        self.0.bit(21)
    }
}

/// The lfbMode register.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LfbMode(pub u32);

impl LfbMode {
    pub fn write_format(self) -> u32 {
        self.0.bit_range(0, 3)
    }

    pub fn write_buffer(self) -> u32 {
        self.0.bit_range(4, 5)
    }

    pub fn read_buffer(self) -> u32 {
        self.0.bit_range(6, 7)
    }

    pub fn pixel_pipeline(self) -> bool {
        self.0.bit(8)
    }

    /// Lane order of the written channels. 0 ARGB, 1 ABGR, 2 RGBA, 3 BGRA.
    pub fn rgba_lanes(self) -> u32 {
        self.0.bit_range(9, 10)
    }

    pub fn word_swap_writes(self) -> bool {
        self.0.bit(11)
    }

    pub fn byte_swizzle_writes(self) -> bool {
        self.0.bit(12)
    }

    pub fn y_origin(self) -> bool {
        self.0.bit(13)
    }

    pub fn word_swap_reads(self) -> bool {
        self.0.bit(15)
    }

    pub fn byte_swizzle_reads(self) -> bool {
        self.0.bit(16)
    }
}

/// The chromaRange register. Voodoo2 only.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ChromaRange(pub u32);

impl ChromaRange {
    pub fn blue_high(self) -> u32 {
        self.0.bit_range(0, 7)
    }

    pub fn green_high(self) -> u32 {
        self.0.bit_range(8, 15)
    }

    pub fn red_high(self) -> u32 {
        self.0.bit_range(16, 23)
    }

    pub fn blue_exclusive(self) -> bool {
        self.0.bit(24)
    }

    pub fn green_exclusive(self) -> bool {
        self.0.bit(25)
    }

    pub fn red_exclusive(self) -> bool {
        self.0.bit(26)
    }

    /// Reject when any channel is in range instead of when all are.
    pub fn union_mode(self) -> bool {
        self.0.bit(27)
    }

    pub fn enabled(self) -> bool {
        self.0.bit(28)
    }
}

/// The textureMode register of a texture unit.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TextureMode(pub u32);

impl TextureMode {
    pub fn perspective(self) -> bool {
        self.0.bit(0)
    }

    pub fn min_filter(self) -> bool {
        self.0.bit(1)
    }

    pub fn mag_filter(self) -> bool {
        self.0.bit(2)
    }

    pub fn clamp_neg_w(self) -> bool {
        self.0.bit(3)
    }

    pub fn lod_dither(self) -> bool {
        self.0.bit(4)
    }

    pub fn ncc_table(self) -> usize {
        self.0.bit(5) as usize
    }

    pub fn clamp_s(self) -> bool {
        self.0.bit(6)
    }

    pub fn clamp_t(self) -> bool {
        self.0.bit(7)
    }

    /// Texel format. Formats below 8 are 8 bits per texel, the rest 16.
    pub fn format(self) -> u32 {
        self.0.bit_range(8, 11)
    }

    pub fn zero_other(self) -> bool {
        self.0.bit(12)
    }

    pub fn sub_clocal(self) -> bool {
        self.0.bit(13)
    }

    pub fn mselect(self) -> u32 {
        self.0.bit_range(14, 16)
    }

    pub fn reverse_blend(self) -> bool {
        self.0.bit(17)
    }

    pub fn add_aclocal(self) -> u32 {
        self.0.bit_range(18, 19)
    }

    pub fn invert_output(self) -> bool {
        self.0.bit(20)
    }

    pub fn alpha_zero_other(self) -> bool {
        self.0.bit(21)
    }

    pub fn alpha_sub_clocal(self) -> bool {
        self.0.bit(22)
    }

    pub fn alpha_mselect(self) -> u32 {
        self.0.bit_range(23, 25)
    }

    pub fn alpha_reverse_blend(self) -> bool {
        self.0.bit(26)
    }

    pub fn alpha_add_aclocal(self) -> u32 {
        self.0.bit_range(27, 28)
    }

    pub fn alpha_invert_output(self) -> bool {
        self.0.bit(29)
    }

    /// Download 8-bit textures four texels per word.
    pub fn seq_8_downld(self) -> bool {
        self.0.bit(31)
    }
}

/// The tLOD register.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TexLod(pub u32);

impl TexLod {
    pub fn lod_min(self) -> u32 {
        self.0.bit_range(0, 5)
    }

    pub fn lod_max(self) -> u32 {
        self.0.bit_range(6, 11)
    }

    pub fn lod_bias(self) -> u32 {
        self.0.bit_range(12, 17)
    }

    pub fn lod_odd(self) -> bool {
        self.0.bit(18)
    }

    pub fn lod_tsplit(self) -> bool {
        self.0.bit(19)
    }

    pub fn s_is_wider(self) -> bool {
        self.0.bit(20)
    }

    pub fn aspect(self) -> u32 {
        self.0.bit_range(21, 22)
    }

    pub fn data_swizzle(self) -> bool {
        self.0.bit(25)
    }

    pub fn data_swap(self) -> bool {
        self.0.bit(26)
    }

    /// Voodoo2 only.
    pub fn direct_write(self) -> bool {
        self.0.bit(27)
    }
}

/// The tDetail register.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TexDetail(pub u32);

impl TexDetail {
    pub fn detail_max(self) -> u32 {
        self.0.bit_range(0, 7)
    }

    pub fn detail_bias(self) -> u32 {
        self.0.bit_range(8, 13)
    }

    pub fn detail_scale(self) -> u32 {
        self.0.bit_range(14, 16)
    }

    pub fn separate_rgba_filter(self) -> bool {
        self.0.bit(21)
    }
}

#[test]
fn compare_funcs() {
    assert!(!CompareFunc::Never.passes(1, 1));
    assert!(CompareFunc::Less.passes(0, 1));
    assert!(!CompareFunc::Less.passes(1, 1));
    assert!(CompareFunc::GreaterEqual.passes(1, 1));
    assert!(CompareFunc::Always.passes(5, 1));
}
