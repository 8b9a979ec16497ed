//! The external RAMDAC. Only enough of it is modelled for drivers to detect it.

#[derive(Default)]
pub struct Dac {
    regs: [u8; 8],
    /// Result of the last read command, returned through fbiInit2.
    pub read_result: u8,
}

impl Dac {
    pub fn write(&mut self, reg: usize, data: u8) {
        self.regs[reg & 7] = data;
    }

    /// Latch the value of `reg` into the read result.
    pub fn read(&mut self, reg: usize) {
        self.read_result = match reg & 7 {
            // Manufacturer and device identification, depending on the index in register 7.
            5 => match self.regs[7] {
                0x01 => 0x55,
                0x07 => 0x71,
                0x0b => 0x79,
                _ => 0xff,
            },
            reg => self.regs[reg],
        };
    }
}

#[test]
fn identification() {
    let mut dac = Dac::default();
    dac.write(7, 0x07);
    dac.read(5);
    assert_eq!(dac.read_result, 0x71);
    dac.write(7, 0x02);
    dac.read(5);
    assert_eq!(dac.read_result, 0xff);
    dac.write(3, 0x42);
    dac.read(3);
    assert_eq!(dac.read_result, 0x42);
}
