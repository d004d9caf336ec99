//! Declarative design descriptions
//!
//! A design description lists the modules of a fabric and, for the leaves of
//! the configuration hierarchy, the values of their configuration bits. Both
//! databases are built from it in lockstep, so every configuration block is
//! named with the instance name of the structural child it configures.
//!
//! ```toml
//! top = "fpga_top"
//!
//! [modules.fpga_top]
//! children = [{ module = "clb" }, { module = "clb" }, { module = "decoder" }]
//!
//! [modules.clb]
//! config_bits = 4
//!
//! [modules.decoder]
//! ports = { address = 1 }
//!
//! [bits]
//! "/fpga_top/clb_1" = "1010"
//! ```

use crate::bitstream_manager::BitstreamManager;
use crate::error::{DbError, Result};
use crate::ids::{ConfigBlockId, ModuleId};
use crate::module_manager::ModuleManager;
use crate::naming::FPGA_TOP_MODULE_NAME;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

fn default_top() -> String {
    FPGA_TOP_MODULE_NAME.to_string()
}

fn default_true() -> bool {
    true
}

/// Top-level design description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignDescription {
    /// Name of the top module (and of the top configuration block)
    #[serde(default = "default_top")]
    pub top: String,
    /// Module definitions, in declaration order
    #[serde(default)]
    pub modules: IndexMap<String, ModuleDescription>,
    /// Bit values keyed by block hierarchy path ("/fpga_top/clb_0")
    #[serde(default)]
    pub bits: IndexMap<String, String>,
}

/// One module definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleDescription {
    /// Port widths by name
    #[serde(default)]
    pub ports: IndexMap<String, usize>,
    /// Number of configuration bits owned by each instance of this module
    #[serde(default)]
    pub config_bits: usize,
    /// Sub-instances, in order
    #[serde(default)]
    pub children: Vec<InstanceDescription>,
}

/// A sub-instance inside a module
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceDescription {
    /// Instantiated module
    pub module: String,
    /// Explicit instance name; generated when absent
    #[serde(default)]
    pub name: Option<String>,
    /// Whether the instance carries configuration memory
    #[serde(default = "default_true")]
    pub configurable: bool,
}

/// Both databases of a fabric
#[derive(Debug, Clone, Default)]
pub struct Design {
    /// Configuration blocks and bits
    pub bitstream_manager: BitstreamManager,
    /// Structural modules
    pub module_manager: ModuleManager,
}

impl DesignDescription {
    /// Parse a TOML description
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| DbError::Parse(e.to_string()))
    }

    /// Parse a JSON description
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| DbError::Parse(e.to_string()))
    }

    /// Load a description from disk, choosing the format by extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            _ => Self::from_toml_str(&contents),
        }
    }

    /// Build both databases
    pub fn build(&self) -> Result<Design> {
        let mut design = Design::default();
        self.build_modules(&mut design.module_manager)?;

        let top_module = design
            .module_manager
            .find_module(&self.top)
            .ok_or_else(|| DbError::UnknownModule(self.top.clone()))?;
        let top_block = design.bitstream_manager.add_block(self.top.clone());

        let mut pending_bits = self.bits.clone();
        let mut active = Vec::new();
        self.build_blocks(
            &mut design,
            top_block,
            top_module,
            &mut active,
            &mut pending_bits,
        )?;

        if let Some((path, _)) = pending_bits.first() {
            return Err(DbError::UnknownBitPath(path.clone()));
        }

        debug!(
            "Built design '{}': {} modules, {} blocks, {} bits",
            self.top,
            design.module_manager.num_modules(),
            design.bitstream_manager.num_blocks(),
            design.bitstream_manager.num_bits()
        );
        Ok(design)
    }

    fn build_modules(&self, modules: &mut ModuleManager) -> Result<()> {
        for (name, description) in &self.modules {
            let module = modules.add_module(name.clone())?;
            for (port, &width) in &description.ports {
                modules.add_port(module, port.clone(), width)?;
            }
        }

        for (name, description) in &self.modules {
            let parent = modules
                .find_module(name)
                .ok_or_else(|| DbError::UnknownModule(name.clone()))?;
            for child in &description.children {
                let child_module = modules
                    .find_module(&child.module)
                    .ok_or_else(|| DbError::UnknownModule(child.module.clone()))?;
                let instance = modules.add_child_module(parent, child_module)?;
                if let Some(instance_name) = &child.name {
                    modules.set_child_instance_name(
                        parent,
                        child_module,
                        instance,
                        instance_name.clone(),
                    )?;
                }
                if child.configurable {
                    modules.add_configurable_child(parent, child_module, instance)?;
                }
            }
        }
        Ok(())
    }

    /// Create the bits of `block` and the blocks of all configurable children
    fn build_blocks(
        &self,
        design: &mut Design,
        block: ConfigBlockId,
        module: ModuleId,
        active: &mut Vec<ModuleId>,
        pending_bits: &mut IndexMap<String, String>,
    ) -> Result<()> {
        let module_name = design.module_manager.module_name(module).to_string();
        if active.contains(&module) {
            return Err(DbError::CyclicHierarchy(module_name));
        }
        active.push(module);

        let config_bits = self
            .modules
            .get(&module_name)
            .map_or(0, |description| description.config_bits);
        let path = design.bitstream_manager.block_path(block);
        let values = match pending_bits.shift_remove(&path) {
            Some(text) => parse_bit_values(&path, &text, config_bits)?,
            None => vec![false; config_bits],
        };
        for value in values {
            design.bitstream_manager.add_bit(block, value)?;
        }

        let children = design.module_manager.configurable_children(module).to_vec();
        let instances = design
            .module_manager
            .configurable_child_instances(module)
            .to_vec();
        for (child_module, instance) in children.into_iter().zip(instances) {
            let name = design
                .module_manager
                .instance_name(module, child_module, instance);
            let child_block = design.bitstream_manager.add_child_block(block, name)?;
            self.build_blocks(design, child_block, child_module, active, pending_bits)?;
        }

        active.pop();
        Ok(())
    }
}

fn parse_bit_values(path: &str, text: &str, expected: usize) -> Result<Vec<bool>> {
    let values = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .map(|c| match c {
            '0' => Ok(false),
            '1' => Ok(true),
            found => Err(DbError::InvalidBitValue {
                path: path.to_string(),
                found,
            }),
        })
        .collect::<Result<Vec<_>>>()?;
    if values.len() != expected {
        return Err(DbError::BitValueLength {
            path: path.to_string(),
            expected,
            found: values.len(),
        });
    }
    Ok(values)
}
