//! Top-level fabric bitstream construction
//!
//! Reorganizes the device bitstream for a specific fabric, so that bits come
//! out in the sequence the configuration protocol loads them. The device
//! bitstream itself is never modified; the result only references its bits.
//!
//! Must run after the device bitstream has been populated: this stage does
//! not decode anything from the circuit implementation.

use crate::chain::build_chain_bitstream;
use crate::error::{BitstreamError, Result};
use crate::fabric_bitstream::FabricBitstream;
use crate::frame::build_frame_bitstream;
use fabstream_db::{
    BitstreamManager, ConfigBlockId, ConfigProtocol, ModuleId, ModuleManager,
    FPGA_TOP_MODULE_NAME,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Report the size of the result
    #[serde(default)]
    pub verbose: bool,
    /// Name shared by the top module and the top configuration block
    #[serde(default = "default_top_module")]
    pub top_module: String,
}

fn default_top_module() -> String {
    FPGA_TOP_MODULE_NAME.to_string()
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            top_module: default_top_module(),
        }
    }
}

impl BuildOptions {
    /// Default options with verbose reporting
    pub fn verbose() -> Self {
        Self {
            verbose: true,
            ..Default::default()
        }
    }
}

/// Build the fabric-dependent bitstream for `protocol`
///
/// Memory-bank fabrics are addressed elsewhere, so for them the result is
/// empty and is not checked for coverage. For every other protocol the
/// result holds each configuration bit exactly once.
pub fn build_fabric_dependent_bitstream(
    blocks: &BitstreamManager,
    modules: &ModuleManager,
    protocol: ConfigProtocol,
    options: &BuildOptions,
) -> Result<FabricBitstream> {
    let start = Instant::now();
    let (top_block, top_module) = find_top(blocks, modules, &options.top_module)?;

    let mut fabric_bitstream = FabricBitstream::with_capacity(blocks.num_bits());
    match protocol {
        ConfigProtocol::Standalone => {
            build_chain_bitstream(blocks, modules, top_block, top_module, &mut fabric_bitstream)?;
        }
        ConfigProtocol::ScanChain => {
            build_chain_bitstream(blocks, modules, top_block, top_module, &mut fabric_bitstream)?;
            // The last bit shifted in ends up at the head of the chain
            fabric_bitstream.reverse();
        }
        ConfigProtocol::FrameBased => {
            build_frame_bitstream(blocks, modules, top_block, top_module, &mut fabric_bitstream)?;
        }
        ConfigProtocol::MemoryBank => {
            debug!("Memory bank addressing is not reordered; fabric bitstream left empty");
        }
    }

    if protocol.covers_all_bits() {
        validate_fabric_bitstream(blocks, &fabric_bitstream)?;
    }

    info!(
        "Built {} fabric bitstream in {:.2?}",
        protocol,
        start.elapsed()
    );
    if options.verbose {
        info!(
            "Built {} configuration bits for fabric",
            fabric_bitstream.num_bits()
        );
    }

    Ok(fabric_bitstream)
}

/// Locate the top module and the single top block, which must share a name
fn find_top(
    blocks: &BitstreamManager,
    modules: &ModuleManager,
    top_module_name: &str,
) -> Result<(ConfigBlockId, ModuleId)> {
    let top_module = modules
        .find_module(top_module_name)
        .filter(|&module| modules.valid_module_id(module))
        .ok_or_else(|| BitstreamError::TopModuleNotFound(top_module_name.to_string()))?;

    let top_blocks = blocks.top_blocks();
    let [top_block] = top_blocks[..] else {
        return Err(BitstreamError::TopBlockCount(top_blocks.len()));
    };

    let block_name = blocks.block_name(top_block);
    if block_name != top_module_name {
        return Err(BitstreamError::TopNameMismatch {
            block_name: block_name.to_string(),
            module_name: top_module_name.to_string(),
        });
    }

    Ok((top_block, top_module))
}

/// Check that `fabric_bitstream` holds every bit of `blocks` exactly once
pub fn validate_fabric_bitstream(
    blocks: &BitstreamManager,
    fabric_bitstream: &FabricBitstream,
) -> Result<()> {
    if fabric_bitstream.num_bits() != blocks.num_bits() {
        return Err(BitstreamError::BitCountMismatch {
            expected: blocks.num_bits(),
            actual: fabric_bitstream.num_bits(),
        });
    }

    let mut counts = vec![0usize; blocks.num_bits()];
    for config_bit in fabric_bitstream.config_bits() {
        let count = counts
            .get_mut(config_bit.index())
            .ok_or(BitstreamError::InvalidBit(config_bit))?;
        *count += 1;
    }

    for config_bit in blocks.bits() {
        let path = || blocks.block_path(blocks.bit_parent_block(config_bit));
        match counts[config_bit.index()] {
            1 => {}
            0 => {
                return Err(BitstreamError::BitNotCovered {
                    bit: config_bit,
                    path: path(),
                })
            }
            count => {
                return Err(BitstreamError::DuplicateBit {
                    bit: config_bit,
                    path: path(),
                    count,
                })
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabstream_db::ConfigBitId;

    fn create_single_lut_design() -> (BitstreamManager, ModuleManager) {
        let mut modules = ModuleManager::new();
        let top = modules.add_module(FPGA_TOP_MODULE_NAME).unwrap();
        let lut = modules.add_module("lut").unwrap();
        let instance = modules.add_child_module(top, lut).unwrap();
        modules.add_configurable_child(top, lut, instance).unwrap();

        let mut blocks = BitstreamManager::new();
        let top_block = blocks.add_block(FPGA_TOP_MODULE_NAME);
        let lut_block = blocks.add_child_block(top_block, "lut_0").unwrap();
        blocks.add_bit(lut_block, true).unwrap();
        blocks.add_bit(lut_block, false).unwrap();
        (blocks, modules)
    }

    #[test]
    fn test_missing_top_module() {
        let (blocks, modules) = create_single_lut_design();
        let options = BuildOptions {
            top_module: "top".to_string(),
            ..Default::default()
        };

        let err = build_fabric_dependent_bitstream(
            &blocks,
            &modules,
            ConfigProtocol::Standalone,
            &options,
        )
        .unwrap_err();
        assert!(matches!(err, BitstreamError::TopModuleNotFound(name) if name == "top"));
    }

    #[test]
    fn test_two_top_blocks() {
        let (mut blocks, modules) = create_single_lut_design();
        blocks.add_block("stray");

        let err = build_fabric_dependent_bitstream(
            &blocks,
            &modules,
            ConfigProtocol::ScanChain,
            &BuildOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BitstreamError::TopBlockCount(2)));
    }

    #[test]
    fn test_no_top_block() {
        let (_, modules) = create_single_lut_design();

        let err = build_fabric_dependent_bitstream(
            &BitstreamManager::new(),
            &modules,
            ConfigProtocol::ScanChain,
            &BuildOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BitstreamError::TopBlockCount(0)));
    }

    #[test]
    fn test_top_name_mismatch() {
        let (_, modules) = create_single_lut_design();
        let mut blocks = BitstreamManager::new();
        blocks.add_block("core");

        let err = build_fabric_dependent_bitstream(
            &blocks,
            &modules,
            ConfigProtocol::FrameBased,
            &BuildOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            BitstreamError::TopNameMismatch { ref block_name, .. } if block_name == "core"
        ));
    }

    #[test]
    fn test_validate_detects_duplicates() {
        let (blocks, _) = create_single_lut_design();
        let mut fabric = FabricBitstream::new();
        fabric.add_bit(ConfigBitId(0));
        fabric.add_bit(ConfigBitId(0));

        let err = validate_fabric_bitstream(&blocks, &fabric).unwrap_err();
        assert!(matches!(
            err,
            BitstreamError::DuplicateBit { count: 2, ref path, .. } if path == "/fpga_top/lut_0"
        ));
    }

    #[test]
    fn test_validate_detects_missing_bits() {
        let (blocks, _) = create_single_lut_design();
        let mut fabric = FabricBitstream::new();
        fabric.add_bit(ConfigBitId(1));
        fabric.add_bit(ConfigBitId(1));

        let err = validate_fabric_bitstream(&blocks, &fabric).unwrap_err();
        assert!(matches!(err, BitstreamError::BitNotCovered { bit: ConfigBitId(0), .. }));
    }

    #[test]
    fn test_validate_detects_unknown_bits() {
        let (blocks, _) = create_single_lut_design();
        let mut fabric = FabricBitstream::new();
        fabric.add_bit(ConfigBitId(0));
        fabric.add_bit(ConfigBitId(9));

        let err = validate_fabric_bitstream(&blocks, &fabric).unwrap_err();
        assert!(matches!(err, BitstreamError::InvalidBit(ConfigBitId(9))));
    }

    #[test]
    fn test_validate_detects_size_mismatch() {
        let (blocks, _) = create_single_lut_design();
        let mut fabric = FabricBitstream::new();
        fabric.add_bit(ConfigBitId(0));

        let err = validate_fabric_bitstream(&blocks, &fabric).unwrap_err();
        assert!(matches!(
            err,
            BitstreamError::BitCountMismatch { expected: 2, actual: 1 }
        ));
        fabric.add_bit(ConfigBitId(1));
        assert!(validate_fabric_bitstream(&blocks, &fabric).is_ok());
    }

    #[test]
    fn test_verbose_options() {
        let options = BuildOptions::verbose();
        assert!(options.verbose);
        assert_eq!(options.top_module, FPGA_TOP_MODULE_NAME);
    }
}
