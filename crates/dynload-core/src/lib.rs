//! Unit resolution engine.
//!
//! A request for a named unit flows through [`loader::UnitLoader::resolve`],
//! which coordinates three resolution paths in strict priority order — the
//! pending-artifact handoff, the precompiled artifact store, and live
//! emission from IR — and delegates foreign names to the fallback search
//! path. The host's unit registry (the [`host::HostRegistry`] seam) is the
//! single authority for at-most-once definition.
//!
//! ## Key components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`pending::PendingTable`] | Two-phase stage/define buffer handoff |
//! | [`module::ModuleRecord`] | Shared runtime record of a named module |
//! | [`materializer::ModuleMaterializer`] | Idempotent module metadata materialization |
//! | [`loader::UnitLoader`] | The resolve state machine |
//! | [`emit::Emitter`] | Seam to the IR-to-bytes translator |
//! | [`host::HostRegistry`] | Seam to the host's unit registry |
//! | [`namespace::NamespaceRegistry`] | Seam to the logical-name registry |

pub mod emit;
pub mod host;
pub mod loader;
pub mod materializer;
pub mod module;
pub mod namespace;
pub mod pending;

pub use emit::{Emitter, IrDefinition, MockEmitter};
pub use host::{HostRegistry, InMemoryHost};
pub use loader::UnitLoader;
pub use materializer::ModuleMaterializer;
pub use module::ModuleRecord;
pub use namespace::{InMemoryNamespace, NamespaceRegistry};
pub use pending::PendingTable;
