//! Configuration protocol selection

use crate::error::DbError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How configuration bits are distributed across the fabric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigProtocol {
    /// Every memory cell is driven directly (point-to-point)
    Standalone,
    /// Memory cells form one shift register
    #[default]
    ScanChain,
    /// Memory cells are written through address decoders
    FrameBased,
    /// Memory cells are organised as word/bit lines
    MemoryBank,
}

impl ConfigProtocol {
    /// All supported protocols
    pub const ALL: [ConfigProtocol; 4] = [
        ConfigProtocol::Standalone,
        ConfigProtocol::ScanChain,
        ConfigProtocol::FrameBased,
        ConfigProtocol::MemoryBank,
    ];

    /// Canonical lower-case name
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigProtocol::Standalone => "standalone",
            ConfigProtocol::ScanChain => "scan_chain",
            ConfigProtocol::FrameBased => "frame_based",
            ConfigProtocol::MemoryBank => "memory_bank",
        }
    }

    /// Whether every configuration bit must appear in the fabric bitstream
    pub fn covers_all_bits(self) -> bool {
        !matches!(self, ConfigProtocol::MemoryBank)
    }
}

impl fmt::Display for ConfigProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ConfigProtocol {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "standalone" => Ok(ConfigProtocol::Standalone),
            "scan_chain" => Ok(ConfigProtocol::ScanChain),
            "frame_based" => Ok(ConfigProtocol::FrameBased),
            "memory_bank" => Ok(ConfigProtocol::MemoryBank),
            _ => Err(DbError::UnknownProtocol(s.to_string())),
        }
    }
}
