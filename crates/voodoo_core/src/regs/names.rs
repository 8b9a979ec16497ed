/// Register names, indexed by register number. Registers past the end of the table are reserved.
const REG_NAMES: [&str; 225] = [
    "status", "intrCtrl", "vertexAx", "vertexAy",
    "vertexBx", "vertexBy", "vertexCx", "vertexCy",
    "startR", "startG", "startB", "startZ",
    "startA", "startS", "startT", "startW",
    "dRdX", "dGdX", "dBdX", "dZdX",
    "dAdX", "dSdX", "dTdX", "dWdX",
    "dRdY", "dGdY", "dBdY", "dZdY",
    "dAdY", "dSdY", "dTdY", "dWdY",
    "triangleCMD", "reserved084", "fvertexAx", "fvertexAy",
    "fvertexBx", "fvertexBy", "fvertexCx", "fvertexCy",
    "fstartR", "fstartG", "fstartB", "fstartZ",
    "fstartA", "fstartS", "fstartT", "fstartW",
    "fdRdX", "fdGdX", "fdBdX", "fdZdX",
    "fdAdX", "fdSdX", "fdTdX", "fdWdX",
    "fdRdY", "fdGdY", "fdBdY", "fdZdY",
    "fdAdY", "fdSdY", "fdTdY", "fdWdY",
    "ftriangleCMD", "fbzColorPath", "fogMode", "alphaMode",
    "fbzMode", "lfbMode", "clipLeftRight", "clipLowYHighY",
    "nopCMD", "fastfillCMD", "swapbufferCMD", "fogColor",
    "zaColor", "chromaKey", "chromaRange", "userIntrCMD",
    "stipple", "color0", "color1", "fbiPixelsIn",
    "fbiChromaFail", "fbiZfuncFail", "fbiAfuncFail", "fbiPixelsOut",
    "fogTable160", "fogTable164", "fogTable168", "fogTable16c",
    "fogTable170", "fogTable174", "fogTable178", "fogTable17c",
    "fogTable180", "fogTable184", "fogTable188", "fogTable18c",
    "fogTable190", "fogTable194", "fogTable198", "fogTable19c",
    "fogTable1a0", "fogTable1a4", "fogTable1a8", "fogTable1ac",
    "fogTable1b0", "fogTable1b4", "fogTable1b8", "fogTable1bc",
    "fogTable1c0", "fogTable1c4", "fogTable1c8", "fogTable1cc",
    "fogTable1d0", "fogTable1d4", "fogTable1d8", "fogTable1dc",
    "cmdFifoBaseAddr", "cmdFifoBump", "cmdFifoRdPtr", "cmdFifoAMin",
    "cmdFifoAMax", "cmdFifoDepth", "cmdFifoHoles", "reserved1fc",
    "fbiInit4", "vRetrace", "backPorch", "videoDimensions",
    "fbiInit0", "fbiInit1", "fbiInit2", "fbiInit3",
    "hSync", "vSync", "clutData", "dacData",
    "maxRgbDelta", "hBorder", "vBorder", "borderColor",
    "hvRetrace", "fbiInit5", "fbiInit6", "fbiInit7",
    "reserved250", "reserved254", "fbiSwapHistory", "fbiTrianglesOut",
    "sSetupMode", "sVx", "sVy", "sARGB",
    "sRed", "sGreen", "sBlue", "sAlpha",
    "sVz", "sWb", "sWtmu0", "sS_Wtmu0",
    "sT_Wtmu0", "sWtmu1", "sS_Wtmu1", "sT_Wtmu1",
    "sDrawTriCMD", "sBeginTriCMD", "reserved2a8", "reserved2ac",
    "reserved2b0", "reserved2b4", "reserved2b8", "reserved2bc",
    "bltSrcBaseAddr", "bltDstBaseAddr", "bltXYStrides", "bltSrcChromaRange",
    "bltDstChromaRange", "bltClipX", "bltClipY", "reserved2dc",
    "bltSrcXY", "bltDstXY", "bltSize", "bltRop",
    "bltColor", "reserved2f4", "bltCommand", "bltData",
    "textureMode", "tLOD", "tDetail", "texBaseAddr",
    "texBaseAddr_1", "texBaseAddr_2", "texBaseAddr_3_8", "trexInit0",
    "trexInit1", "nccTable0.0", "nccTable0.1", "nccTable0.2",
    "nccTable0.3", "nccTable0.4", "nccTable0.5", "nccTable0.6",
    "nccTable0.7", "nccTable0.8", "nccTable0.9", "nccTable0.A",
    "nccTable0.B", "nccTable1.0", "nccTable1.1", "nccTable1.2",
    "nccTable1.3", "nccTable1.4", "nccTable1.5", "nccTable1.6",
    "nccTable1.7", "nccTable1.8", "nccTable1.9", "nccTable1.A",
    "nccTable1.B",
];

/// Name of a register, for logging.
pub fn reg_name(reg: usize) -> &'static str {
    REG_NAMES.get(reg & 0xff).copied().unwrap_or("reserved")
}

/// Register number of a name, ignoring case.
pub fn reg_by_name(name: &str) -> Option<usize> {
    REG_NAMES
        .iter()
        .position(|reg| *reg != "reserved" && reg.eq_ignore_ascii_case(name))
}

#[test]
fn known_names() {
    assert_eq!(reg_name(0x00), "status");
    assert_eq!(reg_name(0x41), "fbzColorPath");
    assert_eq!(reg_name(0xa3), "sS_Wtmu0");
    assert_eq!(reg_name(0xe0), "nccTable1.B");
    assert_eq!(reg_name(0xff), "reserved");
}

#[test]
fn lookup_by_name() {
    assert_eq!(reg_by_name("fbzMode"), Some(0x44));
    assert_eq!(reg_by_name("FASTFILLCMD"), Some(0x49));
    assert_eq!(reg_by_name("reserved"), None);
    assert_eq!(reg_by_name("bogus"), None);
}
