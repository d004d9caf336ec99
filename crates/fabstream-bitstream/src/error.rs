//! Error types for fabric bitstream generation
//!
//! Every variant is a fatal invariant violation: the configuration and
//! structural hierarchies disagree, or the builder produced an incomplete
//! result. Rebuilding from the same databases fails the same way.

use fabstream_db::{ConfigBitId, ConfigBlockId, DbError};
use thiserror::Error;

/// Errors that can occur while building a fabric bitstream
#[derive(Debug, Error)]
pub enum BitstreamError {
    /// No module with the top-level name
    #[error("Top module '{0}' not found")]
    TopModuleNotFound(String),

    /// The configuration hierarchy must have exactly one root
    #[error("Expected exactly one top configuration block, found {0}")]
    TopBlockCount(usize),

    /// Root block and top module disagree
    #[error("Top configuration block '{block_name}' does not match top module '{module_name}'")]
    TopNameMismatch {
        block_name: String,
        module_name: String,
    },

    /// A configurable child has no configuration block of the same name
    #[error("No configuration block '{instance}' under '{parent_path}' for configurable child of module '{module}'")]
    MissingChildBlock {
        parent_block: ConfigBlockId,
        parent_path: String,
        module: String,
        instance: String,
    },

    /// Blocks with children must not own configuration bits
    #[error("Block '{path}' has child blocks but owns {num_bits} configuration bits")]
    InternalBlockOwnsBits {
        block: ConfigBlockId,
        path: String,
        num_bits: usize,
    },

    /// Frame-based levels need one child or a decoder plus at least two
    #[error("Module '{module}' at '{path}' has exactly two configurable children; cannot tell a frame decoder from a data child")]
    AmbiguousDecoderLevel { path: String, module: String },

    /// Frame decoder lacks its address port
    #[error("Frame decoder '{decoder}' at '{path}' has no '{port}' port")]
    MissingDecoderPort {
        path: String,
        decoder: String,
        port: String,
    },

    /// Child index does not fit in the decoder address
    #[error("Child {index} at '{path}' does not fit in a {width}-bit frame address")]
    AddressOverflow {
        path: String,
        index: usize,
        width: usize,
    },

    /// Output and input bitstreams differ in size
    #[error("Fabric bitstream has {actual} bits but the device bitstream has {expected}")]
    BitCountMismatch { expected: usize, actual: usize },

    /// An input bit never reached the output
    #[error("Configuration bit {bit} of '{path}' is missing from the fabric bitstream")]
    BitNotCovered { bit: ConfigBitId, path: String },

    /// An input bit was emitted more than once
    #[error("Configuration bit {bit} of '{path}' appears {count} times in the fabric bitstream")]
    DuplicateBit {
        bit: ConfigBitId,
        path: String,
        count: usize,
    },

    /// The output references a bit the device bitstream does not have
    #[error("Fabric bitstream references unknown configuration bit {0}")]
    InvalidBit(ConfigBitId),

    /// Database error, including unknown protocol names
    #[error(transparent)]
    Database(#[from] DbError),
}

/// Result type for fabric bitstream operations
pub type Result<T> = std::result::Result<T, BitstreamError>;
