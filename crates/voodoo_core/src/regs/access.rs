use crate::config::ChipType;
use crate::regs::*;

/// Access rights of a single register.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Access(pub u8);

const R: u8 = Access::READ;
const W: u8 = Access::WRITE;
const P: u8 = Access::PIPELINED;
const F: u8 = Access::FIFO;
const T: u8 = Access::WRITE_THRU;

const RW: u8 = R | W;
const RP: u8 = R | P;
const WF: u8 = W | F;
const WT: u8 = W | T;
const RWF: u8 = RW | F;
const RWT: u8 = RW | T;
const WPF: u8 = W | P | F;
const RWPF: u8 = RW | P | F;
const RWPT: u8 = RW | P | T;

impl Access {
    pub const READ: u8 = 0x01;
    pub const WRITE: u8 = 0x02;
    pub const PIPELINED: u8 = 0x04;
    pub const FIFO: u8 = 0x08;
    pub const WRITE_THRU: u8 = 0x10;

    pub fn readable(self) -> bool {
        self.0 & Self::READ != 0
    }

    pub fn writable(self) -> bool {
        self.0 & Self::WRITE != 0
    }

    /// Writes go through the pixel pipeline and must wait for it to drain.
    pub fn pipelined(self) -> bool {
        self.0 & Self::PIPELINED != 0
    }

    /// Writes are queued in the PCI FIFO.
    pub fn fifo(self) -> bool {
        self.0 & Self::FIFO != 0
    }

    pub fn write_thru(self) -> bool {
        self.0 & Self::WRITE_THRU != 0
    }

    /// Look up the access rights of a register for a given chip.
    pub fn of(chip: ChipType, reg: usize) -> Self {
        let table = match chip {
            ChipType::Voodoo1 | ChipType::Voodoo1Dtmu => &VOODOO1_ACCESS,
            ChipType::Voodoo2 => &VOODOO2_ACCESS,
        };
        Self(table[reg & 0xff])
    }
}

/// Flatten sixteen rows of sixteen registers into a table.
const fn flatten(rows: [[u8; 16]; 16]) -> [u8; 256] {
    let mut table = [0; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = rows[i / 16][i % 16];
        i += 1;
    }
    table
}

const VOODOO1_ACCESS: [u8; 256] = flatten([
    [RP, 0, WPF, WPF, WPF, WPF, WPF, WPF, WPF, WPF, WPF, WPF, WPF, WPF, WPF, WPF],
    [WPF; 16],
    [WPF, 0, WPF, WPF, WPF, WPF, WPF, WPF, WPF, WPF, WPF, WPF, WPF, WPF, WPF, WPF],
    [WPF; 16],
    [WPF, RWPF, RWPF, RWPF, RWF, RWF, RWF, RWF, WF, WF, WF, WF, WF, WF, 0, 0],
    [RWF, RWF, RWF, R, R, R, R, R, WF, WF, WF, WF, WF, WF, WF, WF],
    [WF; 16],
    [WF, WF, WF, WF, WF, WF, WF, WF, 0, 0, 0, 0, 0, 0, 0, 0],
    [RW, R, RW, RW, RW, RW, RW, RW, W, W, W, W, W, 0, 0, 0],
    [0; 16],
    [0; 16],
    [0; 16],
    [WPF, WPF, WPF, WPF, WPF, WPF, WPF, WF, WF, WF, WF, WF, WF, WF, WF, WF],
    [WF; 16],
    [WF, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0; 16],
]);

const VOODOO2_ACCESS: [u8; 256] = flatten([
    [RP, RWPT, WPF, WPF, WPF, WPF, WPF, WPF, WPF, WPF, WPF, WPF, WPF, WPF, WPF, WPF],
    [WPF; 16],
    [WPF; 16],
    [WPF; 16],
    [WPF, RWPF, RWPF, RWPF, RWF, RWF, RWF, RWF, WF, WF, WF, WF, WF, WF, WF, WF],
    [RWF, RWF, RWF, R, R, R, R, R, WF, WF, WF, WF, WF, WF, WF, WF],
    [WF; 16],
    [WF, WF, WF, WF, WF, WF, WF, WF, RWT, RWT, RWT, RWT, RWT, RWT, RWT, RW],
    [RWT, R, RWT, RWT, RWT, RWT, RWT, RWT, WT, WT, WF, WT, WT, WT, WT, WT],
    [R, RWT, RWT, RWT, 0, 0, R, R, WPF, WPF, WPF, WPF, WPF, WPF, WPF, WPF],
    [WPF, WPF, WPF, WPF, WPF, WPF, WPF, WPF, WPF, WPF, 0, 0, 0, 0, 0, 0],
    [RWPF, RWPF, RWPF, RWPF, RWPF, RWPF, RWPF, RWPF, RWPF, RWPF, RWPF, RWPF, RWPF, RWPF, RWPF, WPF],
    [WPF, WPF, WPF, WPF, WPF, WPF, WPF, WF, WF, WF, WF, WF, WF, WF, WF, WF],
    [WF; 16],
    [WF, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0; 16],
]);

/// Remapping of the first 64 registers when the alternate register map is enabled in fbiInit3.
/// Each gradient is grouped with its X and Y deltas.
pub const ALIAS_MAP: [u8; 0x40] = {
    const fn r(reg: usize) -> u8 {
        reg as u8
    }
    [
        r(STATUS), 0x01, r(VERTEX_AX), r(VERTEX_AY),
        r(VERTEX_BX), r(VERTEX_BY), r(VERTEX_CX), r(VERTEX_CY),
        r(START_R), r(D_R_DX), r(D_R_DY), r(START_G),
        r(D_G_DX), r(D_G_DY), r(START_B), r(D_B_DX),
        r(D_B_DY), r(START_Z), r(D_Z_DX), r(D_Z_DY),
        r(START_A), r(D_A_DX), r(D_A_DY), r(START_S),
        r(D_S_DX), r(D_S_DY), r(START_T), r(D_T_DX),
        r(D_T_DY), r(START_W), r(D_W_DX), r(D_W_DY),

        r(TRIANGLE_CMD), 0x21, r(VERTEX_AX + FLOAT_OFFSET), r(VERTEX_AY + FLOAT_OFFSET),
        r(VERTEX_BX + FLOAT_OFFSET), r(VERTEX_BY + FLOAT_OFFSET),
        r(VERTEX_CX + FLOAT_OFFSET), r(VERTEX_CY + FLOAT_OFFSET),
        r(START_R + FLOAT_OFFSET), r(D_R_DX + FLOAT_OFFSET), r(D_R_DY + FLOAT_OFFSET),
        r(START_G + FLOAT_OFFSET), r(D_G_DX + FLOAT_OFFSET), r(D_G_DY + FLOAT_OFFSET),
        r(START_B + FLOAT_OFFSET), r(D_B_DX + FLOAT_OFFSET), r(D_B_DY + FLOAT_OFFSET),
        r(START_Z + FLOAT_OFFSET), r(D_Z_DX + FLOAT_OFFSET), r(D_Z_DY + FLOAT_OFFSET),
        r(START_A + FLOAT_OFFSET), r(D_A_DX + FLOAT_OFFSET), r(D_A_DY + FLOAT_OFFSET),
        r(START_S + FLOAT_OFFSET), r(D_S_DX + FLOAT_OFFSET), r(D_S_DY + FLOAT_OFFSET),
        r(START_T + FLOAT_OFFSET), r(D_T_DX + FLOAT_OFFSET), r(D_T_DY + FLOAT_OFFSET),
        r(START_W + FLOAT_OFFSET), r(D_W_DX + FLOAT_OFFSET), r(D_W_DY + FLOAT_OFFSET),
    ]
};

#[test]
fn voodoo1_gating() {
    assert!(Access::of(ChipType::Voodoo1, STATUS).readable());
    assert!(!Access::of(ChipType::Voodoo1, STATUS).writable());
    assert!(!Access::of(ChipType::Voodoo1, CHROMA_RANGE).writable());
    assert!(Access::of(ChipType::Voodoo2, CHROMA_RANGE).writable());
    assert!(!Access::of(ChipType::Voodoo1, S_SETUP_MODE).writable());
    assert!(Access::of(ChipType::Voodoo1, FBI_PIXELS_OUT).readable());
    assert!(!Access::of(ChipType::Voodoo1, FBI_PIXELS_OUT).writable());
    assert!(Access::of(ChipType::Voodoo1, NCC_TABLE + 23).writable());
    assert!(!Access::of(ChipType::Voodoo1, NCC_TABLE + 24).writable());
}

#[test]
fn alias_map_groups_gradients() {
    assert_eq!(ALIAS_MAP[9] as usize, D_R_DX);
    assert_eq!(ALIAS_MAP[0x28] as usize, START_R + FLOAT_OFFSET);
    assert_eq!(ALIAS_MAP[0x3f] as usize, D_W_DY + FLOAT_OFFSET);
}
