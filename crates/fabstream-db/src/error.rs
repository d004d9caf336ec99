//! Error types for building and loading the configuration databases

use crate::ids::{ConfigBlockId, ModuleId};
use thiserror::Error;

/// Result type for database operations
pub type Result<T> = std::result::Result<T, DbError>;

/// Errors that can occur while populating the databases
#[derive(Debug, Error)]
pub enum DbError {
    /// Block handle does not belong to this manager
    #[error("Invalid configuration block: {0}")]
    InvalidBlock(ConfigBlockId),

    /// Module handle does not belong to this manager
    #[error("Invalid module: {0}")]
    InvalidModule(ModuleId),

    /// Two child blocks under one parent share a name
    #[error("Block '{parent}' already has a child named '{name}'")]
    DuplicateChildBlock { parent: String, name: String },

    /// Module names must be unique
    #[error("Module '{0}' is already defined")]
    DuplicateModule(String),

    /// Module referenced by name was never defined
    #[error("Unknown module '{0}'")]
    UnknownModule(String),

    /// Port names must be unique within a module
    #[error("Module '{module}' already has a port named '{port}'")]
    DuplicatePort { module: String, port: String },

    /// Instance names must be unique within a parent module
    #[error("Module '{module}' already has an instance named '{name}'")]
    DuplicateInstanceName { module: String, name: String },

    /// The instance was never added to the parent
    #[error("Module '{parent}' has no instance {instance} of '{child}'")]
    InvalidInstance {
        parent: String,
        child: String,
        instance: usize,
    },

    /// A module instantiates itself through its descendants
    #[error("Cyclic module hierarchy through '{0}'")]
    CyclicHierarchy(String),

    /// Bit values supplied for a block do not match its declared size
    #[error("Block '{path}' expects {expected} configuration bits, got {found}")]
    BitValueLength {
        path: String,
        expected: usize,
        found: usize,
    },

    /// Bit strings may only contain '0' and '1'
    #[error("Invalid bit value '{found}' for block '{path}'")]
    InvalidBitValue { path: String, found: char },

    /// Bit values were given for a path that is not a leaf block
    #[error("No leaf block at '{0}' to receive bit values")]
    UnknownBitPath(String),

    /// Protocol name not recognised
    #[error("Unknown configuration protocol '{0}'")]
    UnknownProtocol(String),

    /// Design description could not be parsed
    #[error("Failed to parse design description: {0}")]
    Parse(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
