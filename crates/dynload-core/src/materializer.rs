//! Idempotent module materialization.

use std::sync::Arc;

use tracing::{debug, warn};

use dynload_types::{LoadError, UnitHandle, UnitName, METADATA_MEMBER};

use crate::emit::Emitter;
use crate::host::HostRegistry;
use crate::loader::UnitLoader;
use crate::module::ModuleRecord;

/// Ensures a module's shared constant/metadata artifact is defined before
/// any of its members load.
///
/// Materialization is idempotent: the module's set-once metadata slot and
/// the host's registry answer repeat calls without repeating work, and the
/// finishing step runs at most once per module. It always completes
/// synchronously, because member definition assumes the module's constant
/// pool already exists in the running process.
pub struct ModuleMaterializer {
    host: Arc<dyn HostRegistry>,
    emitter: Arc<dyn Emitter>,
}

impl ModuleMaterializer {
    pub fn new(host: Arc<dyn HostRegistry>, emitter: Arc<dyn Emitter>) -> Self {
        Self { host, emitter }
    }

    pub fn ensure_materialized(
        &self,
        module: &Arc<ModuleRecord>,
        loader: &UnitLoader,
    ) -> Result<UnitHandle, LoadError> {
        if let Some(unit) = module.metadata() {
            return Ok(unit);
        }

        let name = UnitName::module_metadata(module.name());
        if let Some(unit) = self.host.already_defined(&name) {
            module.note_metadata(&unit);
            return Ok(unit);
        }

        // Precompiled metadata, when the module's store carries it.
        if let Some(store) = module.store() {
            if let Some(bytes) = store.lookup(module.name(), METADATA_MEMBER) {
                match self.host.define(&name, &bytes) {
                    Ok(unit) => {
                        debug!(module = module.name(), "materialized from precompiled metadata");
                        self.finish_module(module, &unit);
                        return Ok(unit);
                    }
                    Err(e) => {
                        warn!(
                            module = module.name(),
                            error = %e,
                            "precompiled module metadata rejected, emitting live"
                        );
                    }
                }
            }
        }

        // Live emission of the metadata and member-type scaffolding.
        let bytes = self.emitter.emit_module(module, loader)?;
        let unit = self.host.define(&name, &bytes)?;
        module.note_metadata(&unit);
        debug!(module = module.name(), "materialized via emission");
        Ok(unit)
    }

    /// One-time post-processing for metadata that arrived precompiled:
    /// record the handle on the module and run the emitter-side bookkeeping
    /// skipped by the precompiled path. Losers of a race do nothing.
    pub fn finish_module(&self, module: &Arc<ModuleRecord>, unit: &UnitHandle) {
        if module.note_metadata(unit) {
            self.emitter.note_precompiled_module(module, unit);
        }
    }
}
