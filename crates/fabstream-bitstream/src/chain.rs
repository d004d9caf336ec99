//! Chain-ordered bitstreams (standalone and scan-chain protocols)
//!
//! Walks the configurable children of each module depth first, in the order
//! the module lists them, and emits the bits of every leaf block it reaches.
//! The block store's own child order is only used for name lookup.

use crate::error::Result;
use crate::fabric_bitstream::FabricBitstream;
use crate::join::{check_internal_block, find_child_block};
use fabstream_db::{BitstreamManager, ConfigBlockId, ModuleId, ModuleManager};
use tracing::trace;

/// Append the bits under `top_block` in configuration chain order
pub fn build_chain_bitstream(
    blocks: &BitstreamManager,
    modules: &ModuleManager,
    top_block: ConfigBlockId,
    top_module: ModuleId,
    fabric_bitstream: &mut FabricBitstream,
) -> Result<()> {
    let mut stack = vec![(top_block, top_module)];

    while let Some((block, module)) = stack.pop() {
        if blocks.has_children(block) {
            check_internal_block(blocks, block)?;

            let num_children = modules.configurable_children(module).len();
            let children = (0..num_children)
                .map(|child_index| find_child_block(blocks, modules, block, module, child_index))
                .collect::<Result<Vec<_>>>()?;
            // Reversed so the first child is popped first
            stack.extend(children.into_iter().rev());
            continue;
        }

        let bits = blocks.block_bits(block);
        trace!("{}: {} bits", blocks.block_path(block), bits.len());
        for &config_bit in bits {
            fabric_bitstream.add_bit(config_bit);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BitstreamError;
    use fabstream_db::ConfigBitId;

    /// fpga_top -> [tile_0 -> [lut_0, lut_1], tile_1 -> [lut_0]]
    fn create_nested_design() -> (BitstreamManager, ModuleManager) {
        let mut modules = ModuleManager::new();
        let top = modules.add_module("fpga_top").unwrap();
        let tile = modules.add_module("tile").unwrap();
        let lut = modules.add_module("lut").unwrap();
        for _ in 0..2 {
            let instance = modules.add_child_module(top, tile).unwrap();
            modules.add_configurable_child(top, tile, instance).unwrap();
        }
        for _ in 0..2 {
            let instance = modules.add_child_module(tile, lut).unwrap();
            modules.add_configurable_child(tile, lut, instance).unwrap();
        }

        let mut blocks = BitstreamManager::new();
        let top_block = blocks.add_block("fpga_top");
        for tile_name in ["tile_0", "tile_1"] {
            let tile_block = blocks.add_child_block(top_block, tile_name).unwrap();
            for lut_name in ["lut_0", "lut_1"] {
                let lut_block = blocks.add_child_block(tile_block, lut_name).unwrap();
                blocks.add_bit(lut_block, true).unwrap();
                blocks.add_bit(lut_block, false).unwrap();
            }
        }
        (blocks, modules)
    }

    fn top_handles(blocks: &BitstreamManager, modules: &ModuleManager) -> (ConfigBlockId, ModuleId) {
        (blocks.top_blocks()[0], modules.find_module("fpga_top").unwrap())
    }

    #[test]
    fn test_depth_first_order() {
        let (blocks, modules) = create_nested_design();
        let (top_block, top_module) = top_handles(&blocks, &modules);

        let mut fabric = FabricBitstream::new();
        build_chain_bitstream(&blocks, &modules, top_block, top_module, &mut fabric).unwrap();

        let order: Vec<_> = fabric.config_bits().collect();
        let expected: Vec<_> = (0..8).map(ConfigBitId).collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn test_structural_order_drives_traversal() {
        let mut modules = ModuleManager::new();
        let top = modules.add_module("fpga_top").unwrap();
        let lut = modules.add_module("lut").unwrap();
        let first = modules.add_child_module(top, lut).unwrap();
        let second = modules.add_child_module(top, lut).unwrap();
        // Walk lut_1 before lut_0
        modules.add_configurable_child(top, lut, second).unwrap();
        modules.add_configurable_child(top, lut, first).unwrap();

        let mut blocks = BitstreamManager::new();
        let top_block = blocks.add_block("fpga_top");
        let lut0 = blocks.add_child_block(top_block, "lut_0").unwrap();
        let lut1 = blocks.add_child_block(top_block, "lut_1").unwrap();
        let b0 = blocks.add_bit(lut0, false).unwrap();
        let b1 = blocks.add_bit(lut1, true).unwrap();

        let mut fabric = FabricBitstream::new();
        build_chain_bitstream(&blocks, &modules, top_block, top, &mut fabric).unwrap();

        assert_eq!(fabric.config_bits().collect::<Vec<_>>(), vec![b1, b0]);
    }

    #[test]
    fn test_missing_child_block() {
        let (mut blocks, mut modules) = create_nested_design();
        let tile = modules.find_module("tile").unwrap();
        let lut = modules.find_module("lut").unwrap();
        let extra = modules.add_child_module(tile, lut).unwrap();
        modules.add_configurable_child(tile, lut, extra).unwrap();
        let (top_block, top_module) = top_handles(&blocks, &modules);

        let mut fabric = FabricBitstream::new();
        let err = build_chain_bitstream(&blocks, &modules, top_block, top_module, &mut fabric)
            .unwrap_err();
        match err {
            BitstreamError::MissingChildBlock {
                parent_path,
                instance,
                module,
                ..
            } => {
                assert_eq!(parent_path, "/fpga_top/tile_0");
                assert_eq!(instance, "lut_2");
                assert_eq!(module, "tile");
            }
            other => panic!("unexpected error: {other}"),
        }

        // Adding the block in the wrong place does not help
        blocks.add_child_block(top_block, "lut_2").unwrap();
        let mut fabric = FabricBitstream::new();
        assert!(build_chain_bitstream(&blocks, &modules, top_block, top_module, &mut fabric).is_err());
    }

    #[test]
    fn test_internal_block_with_bits() {
        let (mut blocks, modules) = create_nested_design();
        let (top_block, top_module) = top_handles(&blocks, &modules);
        let tile = blocks.find_child_block(top_block, "tile_1").unwrap();
        blocks.add_bit(tile, true).unwrap();

        let mut fabric = FabricBitstream::new();
        let err = build_chain_bitstream(&blocks, &modules, top_block, top_module, &mut fabric)
            .unwrap_err();
        assert!(matches!(
            err,
            BitstreamError::InternalBlockOwnsBits { num_bits: 1, ref path, .. } if path == "/fpga_top/tile_1"
        ));
    }
}
