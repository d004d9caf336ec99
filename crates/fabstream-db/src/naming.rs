//! Naming contract shared by the configuration and structural hierarchies
//!
//! A configuration block is found under its parent by the instance name of
//! the structural child it configures. Both databases must be populated with
//! names produced here, otherwise the fabric bitstream builder cannot join
//! them.

/// Name of the top-level module of every fabric
pub const FPGA_TOP_MODULE_NAME: &str = "fpga_top";

/// Address port of a frame-based configuration decoder
pub const DECODER_ADDRESS_PORT_NAME: &str = "address";

/// Separator used when printing a block hierarchy path
pub const HIERARCHY_SEPARATOR: char = '/';

/// Generate the default name for the `instance`-th instance of a module
///
/// The instance index is always the text after the last underscore, so two
/// distinct `(module, instance)` pairs never map to the same name.
pub fn generate_instance_name(module_name: &str, instance: usize) -> String {
    format!("{}_{}", module_name, instance)
}

/// Join block names into a printable hierarchy path ("/fpga_top/grid_0")
pub fn hierarchy_path<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let mut path = String::new();
    for name in names {
        path.push(HIERARCHY_SEPARATOR);
        path.push_str(name);
    }
    path
}
