//! fabstream configuration databases
//!
//! This crate holds the two hierarchies the fabric bitstream builder joins:
//! - `BitstreamManager`: configuration blocks and the bits they own
//! - `ModuleManager`: structural modules and their configurable children
//!
//! Both are keyed by the instance names produced in [`naming`], and can be
//! populated in lockstep from a [`DesignDescription`].

pub mod bitstream_manager;
pub mod design;
pub mod error;
pub mod ids;
pub mod module_manager;
pub mod naming;
pub mod protocol;

pub use bitstream_manager::BitstreamManager;
pub use design::{Design, DesignDescription, InstanceDescription, ModuleDescription};
pub use error::{DbError, Result};
pub use ids::{ConfigBitId, ConfigBlockId, FabricBitId, ModuleId};
pub use module_manager::{ModulePort, ModuleManager};
pub use naming::{generate_instance_name, DECODER_ADDRESS_PORT_NAME, FPGA_TOP_MODULE_NAME};
pub use protocol::ConfigProtocol;
