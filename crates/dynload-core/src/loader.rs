//! The unit loader: resolution state machine over all loading paths.

use std::sync::Arc;

use tracing::{debug, warn};

use dynload_store::FallbackSearchPath;
use dynload_types::{LoadError, LoaderConfig, UnitHandle, UnitName};

use crate::emit::Emitter;
use crate::host::HostRegistry;
use crate::materializer::ModuleMaterializer;
use crate::namespace::NamespaceRegistry;
use crate::pending::PendingTable;

/// Foreign names known to live in optional platform archives, with the
/// setup hint surfaced when they fail to resolve.
const NATIVE_LIBRARY_HINTS: &[(&str, &str)] = &[(
    "gfx.native",
    "the native graphics archive is not installed; place gfx.pack under the platform extension directory",
)];

fn native_library_hint(name: &str) -> Option<String> {
    NATIVE_LIBRARY_HINTS
        .iter()
        .find(|(pattern, _)| name.contains(pattern))
        .map(|(_, hint)| hint.to_string())
}

/// Resolves unit names into defined units.
///
/// For a name under the reserved namespace, resolution tries, strictly in
/// order: the host's already-defined answer, the pending-artifact handoff,
/// the module's precompiled store, module readiness (which alone satisfies
/// metadata requests), the companion primary-then-retry step, and finally
/// live emission. Names outside the namespace go straight to the fallback
/// search path and touch none of the above.
///
/// The loader holds no lock across store I/O, definition, or emission, so
/// emitters may re-enter [`resolve`](UnitLoader::resolve) and
/// [`stage`](UnitLoader::stage) for dependency units from any depth.
pub struct UnitLoader {
    pending: PendingTable,
    materializer: ModuleMaterializer,
    fallback: FallbackSearchPath,
    host: Arc<dyn HostRegistry>,
    emitter: Arc<dyn Emitter>,
    namespace: Arc<dyn NamespaceRegistry>,
}

impl UnitLoader {
    /// Assemble a loader, discovering the fallback search path from
    /// `config`.
    pub fn new(
        config: &LoaderConfig,
        host: Arc<dyn HostRegistry>,
        emitter: Arc<dyn Emitter>,
        namespace: Arc<dyn NamespaceRegistry>,
    ) -> Self {
        Self::with_fallback(host, emitter, namespace, FallbackSearchPath::discover(config))
    }

    /// Assemble a loader around an explicitly constructed fallback list.
    pub fn with_fallback(
        host: Arc<dyn HostRegistry>,
        emitter: Arc<dyn Emitter>,
        namespace: Arc<dyn NamespaceRegistry>,
        fallback: FallbackSearchPath,
    ) -> Self {
        Self {
            pending: PendingTable::new(),
            materializer: ModuleMaterializer::new(Arc::clone(&host), Arc::clone(&emitter)),
            fallback,
            host,
            emitter,
            namespace,
        }
    }

    /// Stage a just-produced buffer for `name`; the next `resolve(name)`
    /// will observe and consume exactly this buffer.
    pub fn stage(&self, name: &UnitName, bytes: impl Into<Box<[u8]>>) {
        self.pending.stage(name, bytes);
    }

    /// Stage `bytes` and immediately resolve `name`: the producer-facing
    /// two-phase handoff in one call.
    pub fn load_staged(
        &self,
        name: &UnitName,
        bytes: impl Into<Box<[u8]>>,
    ) -> Result<UnitHandle, LoadError> {
        self.stage(name, bytes);
        self.resolve(name)
    }

    /// Ensure `module`'s shared metadata artifact is defined, and return it.
    pub fn ensure_module(&self, module: &str) -> Result<UnitHandle, LoadError> {
        let record = self.namespace.find_module(module)?;
        self.materializer.ensure_materialized(&record, self)
    }

    /// Resolve `name` into a defined unit.
    pub fn resolve(&self, name: &UnitName) -> Result<UnitHandle, LoadError> {
        self.resolve_inner(name, false)
    }

    fn resolve_inner(
        &self,
        name: &UnitName,
        companion_retry: bool,
    ) -> Result<UnitHandle, LoadError> {
        // The host registry is authoritative: never race past an
        // already-defined answer.
        if let Some(unit) = self.host.already_defined(name) {
            return Ok(unit);
        }

        // Foreign names delegate to the fallback search path and never
        // touch the pending table, the store, or the materializer.
        if !name.is_namespaced() {
            return self.resolve_fallback(name);
        }

        // 1. Pending handoff: the caller already produced authoritative
        // bytes for exactly this name.
        if let Some(bytes) = self.pending.take_if_present(name) {
            debug!(unit = %name, len = bytes.len(), "defining staged buffer");
            return self.host.define(name, &bytes);
        }

        let split = name
            .split()
            .ok_or_else(|| LoadError::not_found(name.as_str()))?;
        let module = self.namespace.find_module(split.module)?;

        // 2. Precompiled store.
        if let Some(store) = module.store() {
            if let Some(bytes) = store.lookup(split.module, split.member) {
                if split.is_metadata() {
                    match self.host.define(name, &bytes) {
                        Ok(unit) => {
                            self.materializer.finish_module(&module, &unit);
                            return Ok(unit);
                        }
                        Err(e) => {
                            warn!(unit = %name, error = %e, "precompiled artifact rejected");
                        }
                    }
                } else {
                    // Member definition assumes the module's constant pool
                    // exists; materialize before defining the member.
                    self.materializer.ensure_materialized(&module, self)?;
                    match self.host.define(name, &bytes) {
                        Ok(unit) => {
                            // The precompiled path skipped the emitter's
                            // normal per-type bookkeeping; run it now.
                            self.emitter.note_precompiled_type(&module, split.member, &unit);
                            module.register_member(split.member, unit.clone());
                            return Ok(unit);
                        }
                        Err(e) => {
                            warn!(unit = %name, error = %e, "precompiled artifact rejected");
                        }
                    }
                }
            }
        }

        // 3. Module readiness; a metadata request is satisfied by this
        // step alone.
        let metadata = self.materializer.ensure_materialized(&module, self)?;
        if split.is_metadata() {
            return Ok(metadata);
        }

        // 4. Companion names load their primary first, then retry once:
        // the primary's materialization registers the companion as a side
        // effect, so the retry lands on the already-defined or pending
        // fast path.
        if let Some((primary, kind)) = split.companion() {
            if companion_retry {
                return Err(LoadError::not_found(name.as_str()));
            }
            debug!(unit = %name, primary, kind = ?kind, "loading primary before companion");
            let primary_name = UnitName::for_member(split.module, primary);
            self.resolve_inner(&primary_name, false)?;
            return self.resolve_inner(name, true);
        }

        // 5. Live emission.
        let ir = self
            .namespace
            .find_member_ir(&module, split.member)
            .ok_or_else(|| LoadError::not_found(name.as_str()))?;
        let bytes = self.emitter.emit_type(&module, &ir, self)?;
        let unit = self.host.define(name, &bytes)?;
        module.register_member(split.member, unit.clone());
        Ok(unit)
    }

    // 6. Fallback delegation for names this subsystem does not own.
    fn resolve_fallback(&self, name: &UnitName) -> Result<UnitHandle, LoadError> {
        if let Some(bytes) = self.fallback.lookup(name.as_str()) {
            debug!(unit = %name, "defining from fallback archive");
            return self.host.define(name, &bytes);
        }
        Err(LoadError::NotFound {
            name: name.as_str().to_string(),
            hint: native_library_hint(name.as_str()),
        })
    }
}
