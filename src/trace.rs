//! Text traces of bus accesses.
//!
//! One command per line, `#` starts a comment. Numbers are decimal or `0x` prefixed hex.
//!
//! ```text
//! init 1                  # initEnable
//! reg fbzMode 0x200       # register write by name or number
//! regf fvertexBx 16.0     # register write of a float
//! write 0x100000 0xf800   # word offset, data and an optional byte mask
//! read 0x57               # read a word and log it
//! vretrace 1
//! ```

use voodoo_core::regs;
use voodoo_core::{Voodoo, VoodooError};

use thiserror::Error;

use std::io;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Failed to read trace: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: {msg}")]
    Parse { line: usize, msg: String },

    #[error("line {line}: {err}")]
    Emulation { line: usize, err: VoodooError },
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Command {
    InitEnable(u32),
    Write { offset: u32, data: u32, mask: u32 },
    Read(u32),
    VRetrace(bool),
}

fn parse_u32(token: &str) -> Result<u32, String> {
    let result = match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(&hex.replace('_', ""), 16),
        None => token.replace('_', "").parse(),
    };
    result.map_err(|err| format!("invalid number '{token}': {err}"))
}

fn parse_reg(token: &str) -> Result<u32, String> {
    match regs::reg_by_name(token) {
        Some(reg) => Ok(reg as u32),
        None => parse_u32(token).map_err(|_| format!("unknown register '{token}'")),
    }
}

/// Parse a single line. Returns `None` for empty lines and comments.
pub fn parse_line(line: &str) -> Result<Option<Command>, String> {
    let line = line.split('#').next().unwrap_or("");
    let tokens: Vec<&str> = line.split_whitespace().collect();

    let Some((&name, args)) = tokens.split_first() else {
        return Ok(None);
    };

    let arg = |index: usize| {
        args.get(index)
            .copied()
            .ok_or_else(|| format!("'{name}' is missing argument {}", index + 1))
    };

    let command = match name {
        "init" => Command::InitEnable(parse_u32(arg(0)?)?),
        "reg" => Command::Write {
            offset: parse_reg(arg(0)?)?,
            data: parse_u32(arg(1)?)?,
            mask: 0xffff_ffff,
        },
        "regf" => {
            let token = arg(1)?;
            let val: f32 = token
                .parse()
                .map_err(|err| format!("invalid float '{token}': {err}"))?;
            Command::Write {
                offset: parse_reg(arg(0)?)?,
                data: val.to_bits(),
                mask: 0xffff_ffff,
            }
        }
        "write" => Command::Write {
            offset: parse_u32(arg(0)?)?,
            data: parse_u32(arg(1)?)?,
            mask: match args.get(2) {
                Some(mask) => parse_u32(mask)?,
                None => 0xffff_ffff,
            },
        },
        "read" => Command::Read(parse_u32(arg(0)?)?),
        "vretrace" => Command::VRetrace(parse_u32(arg(0)?)? != 0),
        _ => return Err(format!("unknown command '{name}'")),
    };

    Ok(Some(command))
}

/// Run every command of a trace. Returns the number of commands run.
pub fn replay(voodoo: &mut Voodoo, source: &str) -> Result<usize, TraceError> {
    let mut count = 0;
    for (index, line) in source.lines().enumerate() {
        let line_number = index + 1;
        let command = parse_line(line)
            .map_err(|msg| TraceError::Parse { line: line_number, msg })?;
        let Some(command) = command else {
            continue;
        };

        match command {
            Command::InitEnable(value) => voodoo.set_init_enable(value),
            Command::Write { offset, data, mask } => voodoo
                .write(offset, data, mask)
                .map_err(|err| TraceError::Emulation { line: line_number, err })?,
            Command::Read(offset) => {
                let value = voodoo.read(offset);
                info!("read {offset:06x} = {value:08x}");
            }
            Command::VRetrace(vretrace) => voodoo.set_vretrace(vretrace),
        }

        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    use voodoo_core::{Buffer, ChipType, Config};

    #[test]
    fn parse_commands() {
        assert_eq!(parse_line("  # nothing"), Ok(None));
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(parse_line("init 1"), Ok(Some(Command::InitEnable(1))));
        assert_eq!(
            parse_line("reg fbzMode 0x200 # rgb"),
            Ok(Some(Command::Write { offset: 0x44, data: 0x200, mask: 0xffff_ffff })),
        );
        assert_eq!(
            parse_line("regf 0x24 16.0"),
            Ok(Some(Command::Write { offset: 0x24, data: 16.0f32.to_bits(), mask: 0xffff_ffff })),
        );
        assert_eq!(
            parse_line("write 0x10_0000 0xf800 0xffff"),
            Ok(Some(Command::Write { offset: 0x10_0000, data: 0xf800, mask: 0xffff })),
        );
        assert_eq!(parse_line("vretrace 1"), Ok(Some(Command::VRetrace(true))));
    }

    #[test]
    fn parse_errors() {
        assert!(parse_line("bogus 1").is_err());
        assert!(parse_line("write 0x10").is_err());
        assert!(parse_line("reg notAReg 1").is_err());
        assert!(parse_line("init zz").is_err());
    }

    #[test]
    fn replay_fill() {
        let mut voodoo = Voodoo::new(&Config::preset(ChipType::Voodoo1)).unwrap();
        let trace = "
            init 1
            reg fbiInit1 0xa0
            reg fbiInit2 0x4b000
            reg clipLeftRight 4
            reg clipLowYHighY 2
            reg color1 0xff0000
            reg fbzMode 0x200
            reg fastfillCMD 0
        ";
        assert_eq!(replay(&mut voodoo, trace).unwrap(), 8);
        assert_eq!(voodoo.buffer_words(Buffer::Front)[0], 0xf800);
        assert_eq!(voodoo.buffer_words(Buffer::Front)[640 + 3], 0xf800);
        assert_eq!(voodoo.buffer_words(Buffer::Front)[4], 0);
    }

    #[test]
    fn replay_reports_line() {
        let mut voodoo = Voodoo::new(&Config::preset(ChipType::Voodoo1)).unwrap();
        let result = replay(&mut voodoo, "init 1\n\nnope\n");
        assert!(matches!(result, Err(TraceError::Parse { line: 3, .. })));
    }
}
