//! Joining the structural and configuration hierarchies
//!
//! Under a given configuration block, the block configuring the `i`-th
//! configurable child of the matching module is the child block named after
//! that instance.

use crate::error::{BitstreamError, Result};
use fabstream_db::{BitstreamManager, ConfigBlockId, ModuleId, ModuleManager};

/// Resolve the configuration block of the `child_index`-th configurable child
pub(crate) fn find_child_block(
    blocks: &BitstreamManager,
    modules: &ModuleManager,
    parent_block: ConfigBlockId,
    parent_module: ModuleId,
    child_index: usize,
) -> Result<(ConfigBlockId, ModuleId)> {
    let child_module = modules.configurable_children(parent_module)[child_index];
    let instance = modules.configurable_child_instances(parent_module)[child_index];
    let instance_name = modules.instance_name(parent_module, child_module, instance);

    match blocks.find_child_block(parent_block, &instance_name) {
        Some(child_block) if blocks.valid_block_id(child_block) => Ok((child_block, child_module)),
        _ => Err(BitstreamError::MissingChildBlock {
            parent_block,
            parent_path: blocks.block_path(parent_block),
            module: modules.module_name(parent_module).to_string(),
            instance: instance_name,
        }),
    }
}

/// Blocks with children must not own bits directly
pub(crate) fn check_internal_block(blocks: &BitstreamManager, block: ConfigBlockId) -> Result<()> {
    let num_bits = blocks.block_bits(block).len();
    if num_bits != 0 {
        return Err(BitstreamError::InternalBlockOwnsBits {
            block,
            path: blocks.block_path(block),
            num_bits,
        });
    }
    Ok(())
}
