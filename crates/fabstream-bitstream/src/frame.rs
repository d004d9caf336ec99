//! Frame-based bitstreams
//!
//! Each configuration bit is written through a tree of frame decoders. At
//! every level with more than one configurable child, the last configurable
//! child is the decoder of that level: it is never walked, only asked for the
//! width of its address port. The remaining children are selected by their
//! index, encoded in binary with that width. A level with a single
//! configurable child needs no decoder and adds no address bits.
//!
//! The address of a bit is the concatenation of the codes of every level
//! from the top of the fabric down to its leaf block:
//!
//! ```text
//! <address in fpga_top> ... <address in parent module>
//! ```
//!
//! and its data input is the configured value of the bit.

use crate::error::{BitstreamError, Result};
use crate::fabric_bitstream::FabricBitstream;
use crate::join::{check_internal_block, find_child_block};
use fabstream_db::{
    BitstreamManager, ConfigBlockId, ModuleId, ModuleManager, DECODER_ADDRESS_PORT_NAME,
};
use tracing::{debug, trace};

/// A block still to be visited, with the address accumulated above it
struct FrameTask {
    block: ConfigBlockId,
    module: ModuleId,
    address: Vec<bool>,
}

/// How the configurable children of one level are addressed
#[derive(Debug, Clone, Copy)]
enum LevelAddressing {
    /// Single child, address passed through unchanged
    PassThrough,
    /// The first `num_children` children are selected by a `width`-bit code
    Decoded { num_children: usize, width: usize },
}

/// Append the bits under `top_block` with their frame addresses
pub fn build_frame_bitstream(
    blocks: &BitstreamManager,
    modules: &ModuleManager,
    top_block: ConfigBlockId,
    top_module: ModuleId,
    fabric_bitstream: &mut FabricBitstream,
) -> Result<()> {
    let mut stack = vec![FrameTask {
        block: top_block,
        module: top_module,
        address: Vec::new(),
    }];

    while let Some(task) = stack.pop() {
        if blocks.has_children(task.block) {
            let addressing = match level_addressing(blocks, modules, task.block, task.module)? {
                Some(addressing) => addressing,
                None => continue,
            };
            check_internal_block(blocks, task.block)?;

            let num_children = match addressing {
                LevelAddressing::PassThrough => 1,
                LevelAddressing::Decoded { num_children, .. } => num_children,
            };
            let mut children = Vec::with_capacity(num_children);
            for child_index in 0..num_children {
                let (child_block, child_module) =
                    find_child_block(blocks, modules, task.block, task.module, child_index)?;

                let mut address = task.address.clone();
                if let LevelAddressing::Decoded { width, .. } = addressing {
                    let code = encode_address(child_index, width).ok_or_else(|| {
                        BitstreamError::AddressOverflow {
                            path: blocks.block_path(task.block),
                            index: child_index,
                            width,
                        }
                    })?;
                    address.extend(code);
                }

                children.push(FrameTask {
                    block: child_block,
                    module: child_module,
                    address,
                });
            }
            stack.extend(children.into_iter().rev());
            continue;
        }

        trace!(
            "{}: {} bits at address {:?}",
            blocks.block_path(task.block),
            blocks.block_bits(task.block).len(),
            task.address
        );
        for &config_bit in blocks.block_bits(task.block) {
            let fabric_bit = fabric_bitstream.add_bit(config_bit);
            fabric_bitstream.set_bit_address(fabric_bit, task.address.clone());
            fabric_bitstream.set_bit_din(fabric_bit, blocks.bit_value(config_bit));
        }
    }

    Ok(())
}

/// Decide how the children of a level are addressed; `None` if there are none
fn level_addressing(
    blocks: &BitstreamManager,
    modules: &ModuleManager,
    block: ConfigBlockId,
    module: ModuleId,
) -> Result<Option<LevelAddressing>> {
    let children = modules.configurable_children(module);
    match children.len() {
        0 => Ok(None),
        1 => Ok(Some(LevelAddressing::PassThrough)),
        2 => Err(BitstreamError::AmbiguousDecoderLevel {
            path: blocks.block_path(block),
            module: modules.module_name(module).to_string(),
        }),
        n => {
            let decoder = children[n - 1];
            let port = modules
                .find_module_port(decoder, DECODER_ADDRESS_PORT_NAME)
                .ok_or_else(|| BitstreamError::MissingDecoderPort {
                    path: blocks.block_path(block),
                    decoder: modules.module_name(decoder).to_string(),
                    port: DECODER_ADDRESS_PORT_NAME.to_string(),
                })?;
            debug!(
                "{}: {} data children behind {}-bit decoder '{}'",
                blocks.block_path(block),
                n - 1,
                port.width,
                modules.module_name(decoder)
            );
            Ok(Some(LevelAddressing::Decoded {
                num_children: n - 1,
                width: port.width,
            }))
        }
    }
}

/// Binary code of `index`, most significant bit first, zero-padded to `width`
///
/// Returns `None` if `index` needs more than `width` bits.
pub fn encode_address(index: usize, width: usize) -> Option<Vec<bool>> {
    let needed = (usize::BITS - index.leading_zeros()) as usize;
    if needed > width {
        return None;
    }
    Some(
        (0..width)
            .rev()
            .map(|bit| bit < usize::BITS as usize && (index >> bit) & 1 == 1)
            .collect(),
    )
}
