//! Headless replay of bus traces. Runs a trace against an emulated chip and dumps one of the
//! color buffers as an image.
//!
//! Usage: `voodoo <settings.toml> [trace]`

#[macro_use]
extern crate log;

mod settings;
mod trace;

use settings::{ImageFormat, Settings};
use trace::TraceError;

use voodoo_core::color::extract_565;
use voodoo_core::regs;
use voodoo_core::{Voodoo, VoodooError};

use thiserror::Error;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Error, Debug)]
enum ReplayError {
    #[error(transparent)]
    Voodoo(#[from] VoodooError),

    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error("Failed to write {}: {}", .path.display(), .err)]
    Output { path: PathBuf, err: io::Error },
}

/// Encode `pixels` of 5-6-5 color, `width` per row.
fn encode_image(format: ImageFormat, pixels: &[u16], width: usize) -> Vec<u8> {
    match format {
        ImageFormat::Raw => bytemuck::cast_slice(pixels).to_vec(),
        ImageFormat::Ppm => {
            let height = if width == 0 { 0 } else { pixels.len() / width };
            let mut image = format!("P6\n{width} {height}\n255\n").into_bytes();
            for &pixel in &pixels[..width * height] {
                let (r, g, b) = extract_565(pixel as u32);
                image.extend_from_slice(&[r as u8, g as u8, b as u8]);
            }
            image
        }
    }
}

fn write_image(path: &Path, image: &[u8]) -> io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.write_all(image)
}

fn log_counters(voodoo: &mut Voodoo) {
    let counters = [
        regs::FBI_PIXELS_IN,
        regs::FBI_CHROMA_FAIL,
        regs::FBI_ZFUNC_FAIL,
        regs::FBI_AFUNC_FAIL,
        regs::FBI_PIXELS_OUT,
        regs::FBI_TRIANGLES_OUT,
    ];
    for reg in counters {
        info!("{}: {}", regs::reg_name(reg), voodoo.read(reg as u32));
    }
    info!("{} rasterizers", voodoo.raster_cache().len());
}

fn run(settings: &Settings, trace_path: &Path) -> Result<(), ReplayError> {
    let mut voodoo = Voodoo::new(&settings.chip)?;

    let source = fs::read_to_string(trace_path).map_err(TraceError::from)?;
    let count = trace::replay(&mut voodoo, &source)?;
    info!("Replayed {count} commands from {}", trace_path.display());

    log_counters(&mut voodoo);

    let output = &settings.output;
    let width = voodoo.rowpixels() as usize;
    let image = encode_image(output.format, voodoo.buffer_words(output.buffer), width);
    write_image(&output.path, &image).map_err(|err| ReplayError::Output {
        path: output.path.clone(),
        err,
    })?;

    info!("Wrote {:?} buffer to {}", output.buffer, output.path.display());

    Ok(())
}

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let Some(settings_path) = args.next() else {
        eprintln!("usage: voodoo <settings.toml> [trace]");
        return ExitCode::FAILURE;
    };

    let settings = match Settings::load(Path::new(&settings_path)) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    env_logger::Builder::new()
        .parse_filters(&settings.log.level)
        .parse_env("RUST_LOG")
        .init();

    let Some(trace_path) = args.next().map(PathBuf::from).or_else(|| settings.trace.clone()) else {
        error!("No trace given");
        return ExitCode::FAILURE;
    };

    match run(&settings, &trace_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ppm_header_and_pixels() {
        let image = encode_image(ImageFormat::Ppm, &[0xf800, 0x07e0, 0x001f, 0xffff], 2);
        let header = b"P6\n2 2\n255\n";
        assert_eq!(&image[..header.len()], header);
        assert_eq!(&image[header.len()..], &[
            0xff, 0, 0,
            0, 0xff, 0,
            0, 0, 0xff,
            0xff, 0xff, 0xff,
        ]);
    }

    #[test]
    fn raw_is_little_endian() {
        let image = encode_image(ImageFormat::Raw, &[0xf800, 0x001f], 2);
        assert_eq!(image, [0x00, 0xf8, 0x1f, 0x00]);
    }
}
