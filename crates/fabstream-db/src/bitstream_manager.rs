//! Device-level bitstream database
//!
//! Stores the configuration blocks of a fabric as a tree and the
//! configuration bits owned by its leaves. The enumeration order of
//! [`BitstreamManager::bits`] is creation order, which is the canonical
//! device order of the bitstream.
//!
//! The manager only guards against structural corruption it can see locally
//! (dangling handles, duplicate sibling names). Whether a block mixes child
//! blocks and bits is left to consumers to validate.

use crate::error::{DbError, Result};
use crate::ids::{ConfigBitId, ConfigBlockId};
use crate::naming::hierarchy_path;
use indexmap::IndexMap;

/// A node of the configuration hierarchy
#[derive(Debug, Clone)]
struct ConfigBlock {
    name: String,
    parent: Option<ConfigBlockId>,
    /// Child blocks keyed by name, in insertion order
    children: IndexMap<String, ConfigBlockId>,
    bits: Vec<ConfigBitId>,
}

/// A single configuration memory cell
#[derive(Debug, Clone, Copy)]
struct ConfigBit {
    value: bool,
    parent_block: ConfigBlockId,
}

/// Hierarchical database of configuration blocks and bits
#[derive(Debug, Clone, Default)]
pub struct BitstreamManager {
    blocks: Vec<ConfigBlock>,
    bits: Vec<ConfigBit>,
}

impl BitstreamManager {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Add a block without a parent
    pub fn add_block(&mut self, name: impl Into<String>) -> ConfigBlockId {
        let id = ConfigBlockId::from_index(self.blocks.len());
        self.blocks.push(ConfigBlock {
            name: name.into(),
            parent: None,
            children: IndexMap::new(),
            bits: Vec::new(),
        });
        id
    }

    /// Add a named block under `parent`
    pub fn add_child_block(
        &mut self,
        parent: ConfigBlockId,
        name: impl Into<String>,
    ) -> Result<ConfigBlockId> {
        let name = name.into();
        let parent_block = self
            .blocks
            .get(parent.index())
            .ok_or(DbError::InvalidBlock(parent))?;
        if parent_block.children.contains_key(&name) {
            return Err(DbError::DuplicateChildBlock {
                parent: parent_block.name.clone(),
                name,
            });
        }

        let id = self.add_block(name.clone());
        self.blocks[id.index()].parent = Some(parent);
        self.blocks[parent.index()].children.insert(name, id);
        Ok(id)
    }

    /// Append a configuration bit with the given value to `block`
    pub fn add_bit(&mut self, block: ConfigBlockId, value: bool) -> Result<ConfigBitId> {
        if !self.valid_block_id(block) {
            return Err(DbError::InvalidBlock(block));
        }
        let id = ConfigBitId::from_index(self.bits.len());
        self.bits.push(ConfigBit {
            value,
            parent_block: block,
        });
        self.blocks[block.index()].bits.push(id);
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------

    /// Check that `block` refers to a block of this database
    pub fn valid_block_id(&self, block: ConfigBlockId) -> bool {
        block.index() < self.blocks.len()
    }

    /// All blocks in creation order
    pub fn blocks(&self) -> impl ExactSizeIterator<Item = ConfigBlockId> {
        (0..self.blocks.len()).map(ConfigBlockId::from_index)
    }

    /// Number of blocks
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Name of a block
    ///
    /// Panics if `block` is not valid for this database.
    pub fn block_name(&self, block: ConfigBlockId) -> &str {
        &self.blocks[block.index()].name
    }

    /// Parent of a block, `None` for a top block
    pub fn block_parent(&self, block: ConfigBlockId) -> Option<ConfigBlockId> {
        self.blocks[block.index()].parent
    }

    /// Child blocks in insertion order
    pub fn block_children(
        &self,
        block: ConfigBlockId,
    ) -> impl ExactSizeIterator<Item = ConfigBlockId> + '_ {
        self.blocks[block.index()].children.values().copied()
    }

    /// Whether a block has any child blocks
    pub fn has_children(&self, block: ConfigBlockId) -> bool {
        !self.blocks[block.index()].children.is_empty()
    }

    /// Bits owned directly by a block, in insertion order
    pub fn block_bits(&self, block: ConfigBlockId) -> &[ConfigBitId] {
        &self.blocks[block.index()].bits
    }

    /// Find the child of `parent` called `name`
    pub fn find_child_block(&self, parent: ConfigBlockId, name: &str) -> Option<ConfigBlockId> {
        self.blocks
            .get(parent.index())
            .and_then(|block| block.children.get(name).copied())
    }

    /// Blocks without a parent
    ///
    /// A well-formed database has exactly one.
    pub fn top_blocks(&self) -> Vec<ConfigBlockId> {
        self.blocks()
            .filter(|&block| self.block_parent(block).is_none())
            .collect()
    }

    /// Blocks from the top of the hierarchy down to `block` (inclusive)
    pub fn block_hierarchy(&self, block: ConfigBlockId) -> Vec<ConfigBlockId> {
        let mut hierarchy = Vec::new();
        let mut current = Some(block);
        while let Some(id) = current {
            if !self.valid_block_id(id) {
                break;
            }
            hierarchy.push(id);
            current = self.block_parent(id);
        }
        hierarchy.reverse();
        hierarchy
    }

    /// Printable hierarchy path of a block, e.g. "/fpga_top/grid_0/clb_1"
    pub fn block_path(&self, block: ConfigBlockId) -> String {
        let hierarchy = self.block_hierarchy(block);
        hierarchy_path(hierarchy.iter().map(|&id| self.block_name(id)))
    }

    // ------------------------------------------------------------------
    // Bits
    // ------------------------------------------------------------------

    /// Check that `bit` refers to a bit of this database
    pub fn valid_bit_id(&self, bit: ConfigBitId) -> bool {
        bit.index() < self.bits.len()
    }

    /// All bits in canonical device order
    pub fn bits(&self) -> impl ExactSizeIterator<Item = ConfigBitId> {
        (0..self.bits.len()).map(ConfigBitId::from_index)
    }

    /// Number of configuration bits
    pub fn num_bits(&self) -> usize {
        self.bits.len()
    }

    /// Configured value of a bit
    pub fn bit_value(&self, bit: ConfigBitId) -> bool {
        self.bits[bit.index()].value
    }

    /// Block owning a bit
    pub fn bit_parent_block(&self, bit: ConfigBitId) -> ConfigBlockId {
        self.bits[bit.index()].parent_block
    }
}
