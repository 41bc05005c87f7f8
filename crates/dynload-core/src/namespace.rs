//! Seam to the logical-name registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use dynload_store::ArtifactStore;
use dynload_types::{LoadError, UnitName};

use crate::emit::IrDefinition;
use crate::module::ModuleRecord;

/// Maps logical module and member names onto runtime records and IR.
///
/// External collaborator: the registry owns the module table (including
/// each module's backing store, if any) and the IR index. The loader only
/// ever reads through this seam.
pub trait NamespaceRegistry: Send + Sync {
    /// The shared record for `module`. Unknown modules fail with
    /// [`LoadError::NotFound`] naming the module's metadata artifact.
    fn find_module(&self, module: &str) -> Result<Arc<ModuleRecord>, LoadError>;

    /// The IR definition for one raw member name, or `None` when the module
    /// has no such member.
    fn find_member_ir(&self, module: &ModuleRecord, member: &str) -> Option<IrDefinition>;
}

/// Map-backed namespace registry for tests and the CLI image harness.
#[derive(Default, Debug)]
pub struct InMemoryNamespace {
    modules: RwLock<HashMap<String, Arc<ModuleRecord>>>,
    irs: RwLock<HashMap<(String, String), IrDefinition>>,
}

impl InMemoryNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module with no backing store.
    pub fn add_module(&self, name: &str) -> Arc<ModuleRecord> {
        let record = Arc::new(ModuleRecord::new(name));
        self.modules.write().insert(name.to_string(), Arc::clone(&record));
        record
    }

    /// Register a module backed by a precompiled artifact store.
    pub fn add_module_with_store(
        &self,
        name: &str,
        store: Arc<dyn ArtifactStore>,
    ) -> Arc<ModuleRecord> {
        let record = Arc::new(ModuleRecord::with_store(name, store));
        self.modules.write().insert(name.to_string(), Arc::clone(&record));
        record
    }

    /// Register the IR definition for one member.
    pub fn add_member_ir(&self, module: &str, member: &str, ir: impl Into<Arc<[u8]>>) {
        self.irs.write().insert(
            (module.to_string(), member.to_string()),
            IrDefinition::new(member, ir),
        );
    }

    pub fn module_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.modules.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl NamespaceRegistry for InMemoryNamespace {
    fn find_module(&self, module: &str) -> Result<Arc<ModuleRecord>, LoadError> {
        self.modules
            .read()
            .get(module)
            .cloned()
            .ok_or_else(|| LoadError::not_found(UnitName::module_metadata(module).as_str()))
    }

    fn find_member_ir(&self, module: &ModuleRecord, member: &str) -> Option<IrDefinition> {
        self.irs
            .read()
            .get(&(module.name().to_string(), member.to_string()))
            .cloned()
    }
}
