//! Structural module database
//!
//! Describes how the fabric is composed: which modules instantiate which,
//! which of those instances carry configuration memory (the configurable
//! children), and the ports of each module. Configuration values never live
//! here; see [`BitstreamManager`](crate::BitstreamManager).

use crate::error::{DbError, Result};
use crate::ids::ModuleId;
use crate::naming::generate_instance_name;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A named port of a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModulePort {
    /// Port name
    pub name: String,
    /// Width in bits
    pub width: usize,
}

#[derive(Debug, Clone)]
struct Module {
    name: String,
    ports: IndexMap<String, ModulePort>,
    /// Instances of each child module; entry `i` is the explicit name of
    /// instance `i`, if it was given one
    child_instances: IndexMap<ModuleId, Vec<Option<String>>>,
    /// Configurable children and their instance indices, always the same length
    configurable_children: Vec<ModuleId>,
    configurable_child_instances: Vec<usize>,
}

/// Hierarchical database of structural modules
#[derive(Debug, Clone, Default)]
pub struct ModuleManager {
    modules: Vec<Module>,
    module_lookup: HashMap<String, ModuleId>,
}

impl ModuleManager {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module with a unique name
    pub fn add_module(&mut self, name: impl Into<String>) -> Result<ModuleId> {
        let name = name.into();
        if self.module_lookup.contains_key(&name) {
            return Err(DbError::DuplicateModule(name));
        }
        let id = ModuleId::from_index(self.modules.len());
        self.module_lookup.insert(name.clone(), id);
        self.modules.push(Module {
            name,
            ports: IndexMap::new(),
            child_instances: IndexMap::new(),
            configurable_children: Vec::new(),
            configurable_child_instances: Vec::new(),
        });
        Ok(id)
    }

    /// Add a port to a module
    pub fn add_port(
        &mut self,
        module: ModuleId,
        name: impl Into<String>,
        width: usize,
    ) -> Result<()> {
        let name = name.into();
        let entry = self.module_mut(module)?;
        if entry.ports.contains_key(&name) {
            return Err(DbError::DuplicatePort {
                module: entry.name.clone(),
                port: name,
            });
        }
        entry.ports.insert(name.clone(), ModulePort { name, width });
        Ok(())
    }

    /// Instantiate `child` inside `parent`, returning the new instance index
    ///
    /// Fails if the generated name of the new instance is already used by a
    /// sibling that was given it explicitly.
    pub fn add_child_module(&mut self, parent: ModuleId, child: ModuleId) -> Result<usize> {
        let child_name = &self.module(child)?.name;
        let name = generate_instance_name(child_name, self.num_instances_checked(parent, child)?);
        if self.name_taken(parent, &name, None)? {
            return Err(DbError::DuplicateInstanceName {
                module: self.module_name(parent).to_string(),
                name,
            });
        }

        let instances = self
            .module_mut(parent)?
            .child_instances
            .entry(child)
            .or_default();
        instances.push(None);
        Ok(instances.len() - 1)
    }

    /// Give an instance an explicit name instead of the generated one
    pub fn set_child_instance_name(
        &mut self,
        parent: ModuleId,
        child: ModuleId,
        instance: usize,
        name: impl Into<String>,
    ) -> Result<()> {
        let name = name.into();
        self.check_instance(parent, child, instance)?;

        if self.name_taken(parent, &name, Some((child, instance)))? {
            return Err(DbError::DuplicateInstanceName {
                module: self.module_name(parent).to_string(),
                name,
            });
        }

        let entry = self.module_mut(parent)?;
        if let Some(slot) = entry
            .child_instances
            .get_mut(&child)
            .and_then(|instances| instances.get_mut(instance))
        {
            *slot = Some(name);
        }
        Ok(())
    }

    /// Register an existing instance as carrying configuration memory
    ///
    /// Configurable children are walked in registration order.
    pub fn add_configurable_child(
        &mut self,
        parent: ModuleId,
        child: ModuleId,
        instance: usize,
    ) -> Result<()> {
        self.check_instance(parent, child, instance)?;
        let entry = self.module_mut(parent)?;
        entry.configurable_children.push(child);
        entry.configurable_child_instances.push(instance);
        Ok(())
    }

    /// Check that `module` refers to a module of this database
    pub fn valid_module_id(&self, module: ModuleId) -> bool {
        module.index() < self.modules.len()
    }

    /// Look up a module by name
    pub fn find_module(&self, name: &str) -> Option<ModuleId> {
        self.module_lookup.get(name).copied()
    }

    /// Number of modules
    pub fn num_modules(&self) -> usize {
        self.modules.len()
    }

    /// Name of a module
    ///
    /// Panics if `module` is not valid for this database.
    pub fn module_name(&self, module: ModuleId) -> &str {
        &self.modules[module.index()].name
    }

    /// Configurable children in traversal order
    pub fn configurable_children(&self, module: ModuleId) -> &[ModuleId] {
        &self.modules[module.index()].configurable_children
    }

    /// Instance index of each configurable child, aligned with
    /// [`configurable_children`](Self::configurable_children)
    pub fn configurable_child_instances(&self, module: ModuleId) -> &[usize] {
        &self.modules[module.index()].configurable_child_instances
    }

    /// Number of instances of `child` inside `parent`
    pub fn num_instances(&self, parent: ModuleId, child: ModuleId) -> usize {
        self.modules[parent.index()]
            .child_instances
            .get(&child)
            .map_or(0, Vec::len)
    }

    /// Name of the `instance`-th instance of `child` inside `parent`
    ///
    /// Explicit names win; otherwise the name is generated from the child
    /// module name and the instance index.
    pub fn instance_name(&self, parent: ModuleId, child: ModuleId, instance: usize) -> String {
        self.modules
            .get(parent.index())
            .and_then(|module| module.child_instances.get(&child))
            .and_then(|instances| instances.get(instance))
            .and_then(|name| name.clone())
            .unwrap_or_else(|| generate_instance_name(self.module_name(child), instance))
    }

    /// Look up a port by name
    pub fn find_module_port(&self, module: ModuleId, name: &str) -> Option<&ModulePort> {
        self.modules
            .get(module.index())
            .and_then(|entry| entry.ports.get(name))
    }

    /// All ports of a module in declaration order
    pub fn module_ports(&self, module: ModuleId) -> impl Iterator<Item = &ModulePort> {
        self.modules[module.index()].ports.values()
    }

    fn module(&self, module: ModuleId) -> Result<&Module> {
        self.modules
            .get(module.index())
            .ok_or(DbError::InvalidModule(module))
    }

    fn module_mut(&mut self, module: ModuleId) -> Result<&mut Module> {
        self.modules
            .get_mut(module.index())
            .ok_or(DbError::InvalidModule(module))
    }

    fn instances(&self, parent: ModuleId) -> Result<impl Iterator<Item = (ModuleId, usize)> + '_> {
        Ok(self
            .module(parent)?
            .child_instances
            .iter()
            .flat_map(|(&child, instances)| (0..instances.len()).map(move |i| (child, i))))
    }

    fn num_instances_checked(&self, parent: ModuleId, child: ModuleId) -> Result<usize> {
        Ok(self
            .module(parent)?
            .child_instances
            .get(&child)
            .map_or(0, Vec::len))
    }

    /// Whether an instance of `parent` other than `except` is called `name`
    fn name_taken(
        &self,
        parent: ModuleId,
        name: &str,
        except: Option<(ModuleId, usize)>,
    ) -> Result<bool> {
        Ok(self.instances(parent)?.any(|(child, instance)| {
            Some((child, instance)) != except && self.instance_name(parent, child, instance) == name
        }))
    }

    fn check_instance(&self, parent: ModuleId, child: ModuleId, instance: usize) -> Result<()> {
        self.module(child)?;
        self.module(parent)?;
        if instance >= self.num_instances(parent, child) {
            return Err(DbError::InvalidInstance {
                parent: self.module_name(parent).to_string(),
                child: self.module_name(child).to_string(),
                instance,
            });
        }
        Ok(())
    }
}
