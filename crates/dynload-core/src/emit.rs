//! Seam to the Emitter, the external IR-to-bytes translator.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use dynload_types::{LoadError, UnitHandle, UnitName};

use crate::loader::UnitLoader;
use crate::module::ModuleRecord;

/// One member type's IR definition, as handed out by the namespace
/// registry. Opaque to the loader; only the emitter interprets the bytes.
#[derive(Debug, Clone)]
pub struct IrDefinition {
    /// Raw member name within its module.
    pub member: String,
    /// The IR payload.
    pub ir: Arc<[u8]>,
}

impl IrDefinition {
    pub fn new(member: impl Into<String>, ir: impl Into<Arc<[u8]>>) -> Self {
        Self {
            member: member.into(),
            ir: ir.into(),
        }
    }
}

/// Translates IR definitions into host-executable bytes.
///
/// Emission is deterministic for a given IR input. It may recursively
/// trigger loads of dependency units through the loader it is handed;
/// re-entrant `resolve`/`stage` calls are expected and must not deadlock
/// (the loader holds no lock across emission).
pub trait Emitter: Send + Sync {
    /// Produce the module's shared constant/metadata artifact.
    fn emit_module(
        &self,
        module: &ModuleRecord,
        loader: &UnitLoader,
    ) -> Result<Box<[u8]>, LoadError>;

    /// Translate one member type.
    fn emit_type(
        &self,
        module: &ModuleRecord,
        ir: &IrDefinition,
        loader: &UnitLoader,
    ) -> Result<Box<[u8]>, LoadError>;

    /// One-time bookkeeping for a module metadata artifact that arrived
    /// precompiled, bypassing [`emit_module`](Emitter::emit_module).
    fn note_precompiled_module(&self, module: &ModuleRecord, unit: &UnitHandle) {
        let _ = (module, unit);
    }

    /// One-time bookkeeping for a member type that arrived precompiled,
    /// bypassing the live path (e.g. registering line-number or reflection
    /// metadata that normally happens during emission).
    fn note_precompiled_type(&self, module: &ModuleRecord, member: &str, unit: &UnitHandle) {
        let _ = (module, member, unit);
    }
}

#[derive(Clone, Default, Debug)]
struct MockType {
    bytes: Option<Arc<[u8]>>,
    companions: Vec<(String, Arc<[u8]>)>,
    dependencies: Vec<UnitName>,
    fail: Option<String>,
}

/// Table-driven emitter for tests and the CLI image harness.
///
/// Unconfigured types translate deterministically to `unit:<ir bytes>`;
/// unconfigured modules to `meta:<module name>`. Configured entries can
/// override the output, declare companion buffers to stage (or eagerly
/// define) as a side effect of emitting their primary, declare dependency
/// units to resolve re-entrantly mid-emission, or fail outright. Every
/// call is counted.
#[derive(Default, Debug)]
pub struct MockEmitter {
    modules: Mutex<HashMap<String, Arc<[u8]>>>,
    types: Mutex<HashMap<(String, String), MockType>>,
    eager_companions: AtomicBool,
    module_calls: Mutex<HashMap<String, usize>>,
    type_calls: Mutex<HashMap<(String, String), usize>>,
    noted_modules: Mutex<Vec<String>>,
    noted_types: Mutex<Vec<String>>,
}

impl MockEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define companions through `load_staged` (immediately) instead of
    /// leaving them staged for the caller's retry.
    pub fn set_eager_companions(&self, eager: bool) {
        self.eager_companions.store(eager, Ordering::SeqCst);
    }

    /// Override the metadata bytes emitted for `module`.
    pub fn add_module_metadata(&self, module: &str, bytes: impl Into<Arc<[u8]>>) {
        self.modules.lock().insert(module.to_string(), bytes.into());
    }

    /// Override the bytes emitted for one member type.
    pub fn add_type(&self, module: &str, member: &str, bytes: impl Into<Arc<[u8]>>) {
        self.entry(module, member).bytes = Some(bytes.into());
    }

    /// Declare a companion buffer produced as a side effect of emitting
    /// `primary`.
    pub fn add_companion(
        &self,
        module: &str,
        primary: &str,
        companion: &str,
        bytes: impl Into<Arc<[u8]>>,
    ) {
        self.entry(module, primary)
            .companions
            .push((companion.to_string(), bytes.into()));
    }

    /// Declare a dependency unit resolved re-entrantly while emitting
    /// `member`.
    pub fn add_dependency(&self, module: &str, member: &str, dependency: &str) {
        self.entry(module, member)
            .dependencies
            .push(UnitName::new(dependency));
    }

    /// Make emission of `member` fail.
    pub fn fail_type(&self, module: &str, member: &str, detail: &str) {
        self.entry(module, member).fail = Some(detail.to_string());
    }

    pub fn module_call_count(&self, module: &str) -> usize {
        *self.module_calls.lock().get(module).unwrap_or(&0)
    }

    pub fn type_call_count(&self, module: &str, member: &str) -> usize {
        *self
            .type_calls
            .lock()
            .get(&(module.to_string(), member.to_string()))
            .unwrap_or(&0)
    }

    /// Unit names passed to `note_precompiled_type`, in order.
    pub fn noted_precompiled_types(&self) -> Vec<String> {
        self.noted_types.lock().clone()
    }

    /// Module names passed to `note_precompiled_module`, in order.
    pub fn noted_precompiled_modules(&self) -> Vec<String> {
        self.noted_modules.lock().clone()
    }

    fn entry(&self, module: &str, member: &str) -> parking_lot::MappedMutexGuard<'_, MockType> {
        parking_lot::MutexGuard::map(self.types.lock(), |types| {
            types
                .entry((module.to_string(), member.to_string()))
                .or_default()
        })
    }
}

impl Emitter for MockEmitter {
    fn emit_module(
        &self,
        module: &ModuleRecord,
        _loader: &UnitLoader,
    ) -> Result<Box<[u8]>, LoadError> {
        *self
            .module_calls
            .lock()
            .entry(module.name().to_string())
            .or_insert(0) += 1;
        if let Some(bytes) = self.modules.lock().get(module.name()) {
            return Ok(bytes.as_ref().into());
        }
        Ok(format!("meta:{}", module.name()).into_bytes().into_boxed_slice())
    }

    fn emit_type(
        &self,
        module: &ModuleRecord,
        ir: &IrDefinition,
        loader: &UnitLoader,
    ) -> Result<Box<[u8]>, LoadError> {
        let key = (module.name().to_string(), ir.member.clone());
        *self.type_calls.lock().entry(key.clone()).or_insert(0) += 1;

        // Clone the entry out so no lock is held across re-entrant loads.
        let entry = self.types.lock().get(&key).cloned().unwrap_or_default();

        if let Some(detail) = entry.fail {
            return Err(LoadError::EmissionFailure {
                name: UnitName::for_member(module.name(), &ir.member).as_str().to_string(),
                detail,
            });
        }

        for dependency in &entry.dependencies {
            loader.resolve(dependency)?;
        }

        let eager = self.eager_companions.load(Ordering::SeqCst);
        for (companion, bytes) in &entry.companions {
            let name = UnitName::for_member(module.name(), companion);
            if eager {
                loader.load_staged(&name, bytes.as_ref())?;
            } else {
                loader.stage(&name, bytes.as_ref());
            }
        }

        match entry.bytes {
            Some(bytes) => Ok(bytes.as_ref().into()),
            None => {
                let mut out = b"unit:".to_vec();
                out.extend_from_slice(&ir.ir);
                Ok(out.into_boxed_slice())
            }
        }
    }

    fn note_precompiled_module(&self, module: &ModuleRecord, _unit: &UnitHandle) {
        self.noted_modules.lock().push(module.name().to_string());
    }

    fn note_precompiled_type(&self, module: &ModuleRecord, member: &str, _unit: &UnitHandle) {
        self.noted_types
            .lock()
            .push(UnitName::for_member(module.name(), member).as_str().to_string());
    }
}
