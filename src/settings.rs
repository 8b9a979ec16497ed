use voodoo_core::{Buffer, Config};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::io;
use std::path::{Path, PathBuf};
use std::fs;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to deserialize config file: {0}")]
    Deserialize(#[from] toml::de::Error),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Binary RGB portable pixmap.
    Ppm,
    /// The 5-6-5 pixels as they are in memory, little endian.
    Raw,
}

#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default filter, overridden by `RUST_LOG`.
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub path: PathBuf,
    pub buffer: Buffer,
    pub format: ImageFormat,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("frame.ppm"),
            buffer: Buffer::Front,
            format: ImageFormat::Ppm,
        }
    }
}

/// Settings of a replay. Every section is optional.
#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chip: Config,
    pub log: LogSettings,
    pub output: OutputSettings,
    /// Trace to replay, if not given on the command line.
    pub trace: Option<PathBuf>,
}

impl Settings {
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::parse(&fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use voodoo_core::ChipType;

    #[test]
    fn empty_is_default() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings.chip.chip, ChipType::Voodoo1);
        assert_eq!(settings.log.level, "info");
        assert_eq!(settings.output.buffer, Buffer::Front);
        assert!(settings.trace.is_none());
    }

    #[test]
    fn full_settings() {
        let source = r#"
            trace = "frame.trace"

            [chip]
            chip = "voodoo2"
            fb_mem_mb = 4
            tmu_mem_mb = 4
            tmus = 2

            [log]
            level = "debug"

            [output]
            path = "out.raw"
            buffer = "back"
            format = "raw"
        "#;
        let settings = Settings::parse(source).unwrap();
        assert_eq!(settings.chip.chip, ChipType::Voodoo2);
        assert_eq!(settings.chip.tmus, 2);
        assert_eq!(settings.log.level, "debug");
        assert_eq!(settings.output.buffer, Buffer::Back);
        assert_eq!(settings.output.format, ImageFormat::Raw);
        assert_eq!(settings.trace, Some(PathBuf::from("frame.trace")));
    }

    #[test]
    fn bad_chip() {
        let source = "[chip]\nchip = \"voodoo5\"\nfb_mem_mb = 4\ntmu_mem_mb = 4\ntmus = 1\n";
        assert!(matches!(Settings::parse(source), Err(ConfigError::Deserialize(_))));
    }
}
