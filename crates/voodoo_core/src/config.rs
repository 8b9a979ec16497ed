use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::fmt;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{chip} supports at most {max} texture units, {tmus} requested")]
    TooManyTmus { chip: ChipType, tmus: usize, max: usize },

    #[error("at least one texture unit is required")]
    NoTmus,

    #[error("texture memory must be at least 1 MiB")]
    NoTextureMemory,

    #[error("frame buffer memory must be at least 1 MiB")]
    NoFrameBufferMemory,
}

/// The emulated chip generation.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChipType {
    /// SST-1 with a single texture unit.
    Voodoo1,
    /// SST-1 with two texture units.
    Voodoo1Dtmu,
    Voodoo2,
}

impl ChipType {
    pub fn is_voodoo2(self) -> bool {
        self == ChipType::Voodoo2
    }
}

impl Default for ChipType {
    fn default() -> Self {
        ChipType::Voodoo1
    }
}

impl fmt::Display for ChipType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match *self {
            ChipType::Voodoo1 => "Voodoo Graphics",
            ChipType::Voodoo1Dtmu => "Voodoo Graphics (dual TMU)",
            ChipType::Voodoo2 => "Voodoo2",
        })
    }
}

/// Board configuration of a single chip.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub chip: ChipType,
    /// Frame buffer memory in MiB.
    pub fb_mem_mb: usize,
    /// Memory of each texture unit in MiB.
    pub tmu_mem_mb: usize,
    /// Number of texture units.
    pub tmus: usize,
}

impl Config {
    pub fn preset(chip: ChipType) -> Self {
        match chip {
            ChipType::Voodoo1 => Self { chip, fb_mem_mb: 2, tmu_mem_mb: 2, tmus: 1 },
            ChipType::Voodoo1Dtmu => Self { chip, fb_mem_mb: 4, tmu_mem_mb: 4, tmus: 2 },
            ChipType::Voodoo2 => Self { chip, fb_mem_mb: 4, tmu_mem_mb: 4, tmus: 2 },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let max = match self.chip {
            ChipType::Voodoo1 => 1,
            ChipType::Voodoo1Dtmu | ChipType::Voodoo2 => 2,
        };
        if self.tmus == 0 {
            return Err(ConfigError::NoTmus);
        }
        if self.tmus > max {
            return Err(ConfigError::TooManyTmus { chip: self.chip, tmus: self.tmus, max });
        }
        if self.tmu_mem_mb == 0 {
            return Err(ConfigError::NoTextureMemory);
        }
        if self.fb_mem_mb == 0 {
            return Err(ConfigError::NoFrameBufferMemory);
        }
        Ok(())
    }

    pub fn fb_mem_bytes(&self) -> usize {
        self.fb_mem_mb << 20
    }

    pub fn tmu_mem_bytes(&self) -> usize {
        self.tmu_mem_mb << 20
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::preset(ChipType::default())
    }
}

#[test]
fn presets_are_valid() {
    for chip in [ChipType::Voodoo1, ChipType::Voodoo1Dtmu, ChipType::Voodoo2] {
        assert!(Config::preset(chip).validate().is_ok());
    }
    let config = Config { tmus: 2, ..Config::preset(ChipType::Voodoo1) };
    assert!(matches!(config.validate(), Err(ConfigError::TooManyTmus { .. })));
}
