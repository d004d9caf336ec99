//! fabstream fabric bitstream generation
//!
//! This crate handles:
//! - Chain ordering for standalone and scan-chain fabrics
//! - Frame address encoding for frame-based fabrics
//! - Coverage validation of the result against the device bitstream
//!
//! The entry point is [`build_fabric_dependent_bitstream`].

pub mod builder;
pub mod chain;
pub mod error;
pub mod fabric_bitstream;
pub mod frame;
mod join;

pub use builder::{build_fabric_dependent_bitstream, validate_fabric_bitstream, BuildOptions};
pub use error::{BitstreamError, Result};
pub use fabric_bitstream::{FabricBit, FabricBitstream};
pub use frame::encode_address;
