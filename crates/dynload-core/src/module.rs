//! Shared runtime records for named modules.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use dynload_store::ArtifactStore;
use dynload_types::UnitHandle;

/// Shared runtime representation of a named module.
///
/// Produced by the namespace registry and shared by reference. The metadata
/// handle is set exactly once during the module's finishing step; after that
/// the record is effectively read-only apart from member registration, which
/// only ever adds entries.
pub struct ModuleRecord {
    name: String,
    store: Option<Arc<dyn ArtifactStore>>,
    metadata: OnceLock<UnitHandle>,
    members: RwLock<BTreeMap<String, UnitHandle>>,
}

impl ModuleRecord {
    /// A module with no backing artifact store: every precompiled lookup for
    /// it is answered "absent" without I/O.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store: None,
            metadata: OnceLock::new(),
            members: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn with_store(name: impl Into<String>, store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            name: name.into(),
            store: Some(store),
            metadata: OnceLock::new(),
            members: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The module's precompiled artifact store, if it has one.
    pub fn store(&self) -> Option<&Arc<dyn ArtifactStore>> {
        self.store.as_ref()
    }

    /// The module's shared metadata unit, once materialized.
    pub fn metadata(&self) -> Option<UnitHandle> {
        self.metadata.get().cloned()
    }

    /// Record the metadata unit. Returns `true` only for the first caller;
    /// losers of a race observe `false` and must not repeat one-time
    /// post-processing.
    pub fn note_metadata(&self, unit: &UnitHandle) -> bool {
        self.metadata.set(unit.clone()).is_ok()
    }

    /// Register a defined member unit under its raw member name.
    pub fn register_member(&self, member: &str, unit: UnitHandle) {
        self.members.write().insert(member.to_string(), unit);
    }

    pub fn member(&self, member: &str) -> Option<UnitHandle> {
        self.members.read().get(member).cloned()
    }

    pub fn member_names(&self) -> Vec<String> {
        self.members.read().keys().cloned().collect()
    }
}

impl std::fmt::Debug for ModuleRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRecord")
            .field("name", &self.name)
            .field("has_store", &self.store.is_some())
            .field("materialized", &self.metadata.get().is_some())
            .field("members", &self.members.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_is_set_once() {
        let module = ModuleRecord::new("pkgA");
        assert!(module.metadata().is_none());

        let first = UnitHandle::new("dyn.pkgA.$Module", vec![1]);
        let second = UnitHandle::new("dyn.pkgA.$Module", vec![2]);
        assert!(module.note_metadata(&first));
        assert!(!module.note_metadata(&second));
        assert!(module.metadata().unwrap().same_unit(&first));
    }

    #[test]
    fn members_register_under_raw_names() {
        let module = ModuleRecord::new("pkgA");
        module.register_member("Widget", UnitHandle::new("dyn.pkgA.Widget", vec![1]));
        module.register_member("Widget$", UnitHandle::new("dyn.pkgA.Widget$", vec![2]));
        assert_eq!(module.member_names(), vec!["Widget", "Widget$"]);
        assert_eq!(module.member("Widget$").unwrap().bytes(), &[2]);
        assert!(module.member("Gadget").is_none());
    }
}
