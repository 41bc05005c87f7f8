//! Integration tests for end-to-end resolution
//!
//! Test coverage areas:
//! - Pending handoff against a real filesystem store
//! - Precompiled store precedence and module-readiness ordering
//! - Companion round-trips through live emission
//! - Fallback search path discovery from a configured extension directory
//! - Graceful degradation with every precompiled path unavailable

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use dynload_core::{
    Emitter, HostRegistry, InMemoryHost, InMemoryNamespace, MockEmitter, NamespaceRegistry,
    UnitLoader,
};
use dynload_store::paths::artifact_path;
use dynload_store::{ArtifactStore, FallbackSearchPath, FsArtifactStore};
use dynload_types::{LoaderConfig, UnitName};

fn write_store_artifact(root: &Path, module: &str, member: &str, bytes: &[u8]) {
    let path = artifact_path(root, module, member);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, bytes).unwrap();
}

struct Harness {
    host: Arc<InMemoryHost>,
    emitter: Arc<MockEmitter>,
    namespace: Arc<InMemoryNamespace>,
}

impl Harness {
    fn new() -> Self {
        Self {
            host: Arc::new(InMemoryHost::new()),
            emitter: Arc::new(MockEmitter::new()),
            namespace: Arc::new(InMemoryNamespace::new()),
        }
    }

    fn loader(&self, config: &LoaderConfig) -> UnitLoader {
        UnitLoader::new(
            config,
            Arc::clone(&self.host) as Arc<dyn HostRegistry>,
            Arc::clone(&self.emitter) as Arc<dyn Emitter>,
            Arc::clone(&self.namespace) as Arc<dyn NamespaceRegistry>,
        )
    }

    fn loader_without_fallback(&self) -> UnitLoader {
        UnitLoader::with_fallback(
            Arc::clone(&self.host) as Arc<dyn HostRegistry>,
            Arc::clone(&self.emitter) as Arc<dyn Emitter>,
            Arc::clone(&self.namespace) as Arc<dyn NamespaceRegistry>,
            FallbackSearchPath::empty(),
        )
    }
}

// =============================================================================
// Resolution paths against a filesystem store
// =============================================================================

#[test]
fn staged_buffer_wins_with_no_store_entry() {
    let store_dir = TempDir::new().unwrap();
    let harness = Harness::new();
    let store = Arc::new(FsArtifactStore::new(store_dir.path()));
    harness
        .namespace
        .add_module_with_store("pkgA", store as Arc<dyn ArtifactStore>);

    let loader = harness.loader_without_fallback();
    let name = UnitName::new("dyn.pkgA.Widget");
    loader.stage(&name, b"staged-widget".to_vec());

    let unit = loader.resolve(&name).unwrap();
    assert_eq!(unit.bytes(), b"staged-widget");
    assert_eq!(harness.emitter.type_call_count("pkgA", "Widget"), 0);
}

#[test]
fn store_backed_member_defines_module_first() {
    let store_dir = TempDir::new().unwrap();
    write_store_artifact(store_dir.path(), "pkgA", "$Module", b"pool-pkgA");
    write_store_artifact(store_dir.path(), "pkgA", "Widget", b"widget-bytes");

    let harness = Harness::new();
    let store = Arc::new(FsArtifactStore::new(store_dir.path()));
    harness
        .namespace
        .add_module_with_store("pkgA", store as Arc<dyn ArtifactStore>);

    let loader = harness.loader_without_fallback();
    let unit = loader.resolve(&UnitName::new("dyn.pkgA.Widget")).unwrap();

    assert_eq!(unit.bytes(), b"widget-bytes");
    assert_eq!(harness.emitter.type_call_count("pkgA", "Widget"), 0);
    assert_eq!(harness.emitter.module_call_count("pkgA"), 0);
    assert_eq!(
        harness.host.define_log(),
        vec!["dyn.pkgA.$Module", "dyn.pkgA.Widget"]
    );
    // Resolving a second member reuses the materialized module.
    write_store_artifact(store_dir.path(), "pkgA", "Gadget", b"gadget-bytes");
    loader.resolve(&UnitName::new("dyn.pkgA.Gadget")).unwrap();
    assert_eq!(harness.host.define_count("dyn.pkgA.$Module"), 1);
}

#[test]
fn companion_resolves_through_primary_emission() {
    let harness = Harness::new();
    harness.namespace.add_module("pkgA");
    harness
        .namespace
        .add_member_ir("pkgA", "Widget", b"ir-widget".to_vec());
    harness
        .emitter
        .add_companion("pkgA", "Widget", "Widget$", b"widget-body".to_vec());

    let loader = harness.loader_without_fallback();
    let unit = loader.resolve(&UnitName::new("dyn.pkgA.Widget$")).unwrap();

    assert_eq!(unit.bytes(), b"widget-body");
    assert_eq!(
        harness.host.define_log(),
        vec!["dyn.pkgA.$Module", "dyn.pkgA.Widget", "dyn.pkgA.Widget$"]
    );
}

// =============================================================================
// Fallback search path through a configured extension directory
// =============================================================================

#[test]
fn fallback_archives_resolve_foreign_names() {
    let ext_dir = TempDir::new().unwrap();
    let base_archive = ext_dir.path().join("vendor.pack");
    std::fs::create_dir_all(&base_archive).unwrap();
    std::fs::write(base_archive.join("org.vendor.Widget.unit"), b"vendor-widget").unwrap();

    let plat_dir = ext_dir.path().join("linux-x86_64");
    let plat_archive = plat_dir.join("native.pack");
    std::fs::create_dir_all(&plat_archive).unwrap();
    std::fs::write(plat_archive.join("org.vendor.Native.unit"), b"vendor-native").unwrap();

    let harness = Harness::new();
    let config = LoaderConfig::new(ext_dir.path(), "linux-x86_64");
    let loader = harness.loader(&config);

    let base = loader.resolve(&UnitName::new("org.vendor.Widget")).unwrap();
    assert_eq!(base.bytes(), b"vendor-widget");
    let plat = loader.resolve(&UnitName::new("org.vendor.Native")).unwrap();
    assert_eq!(plat.bytes(), b"vendor-native");

    // Foreign resolution never consulted the namespace.
    assert!(harness.namespace.module_names().is_empty());
}

#[test]
fn graceful_degradation_without_any_precompiled_path() {
    let scratch = TempDir::new().unwrap();
    let harness = Harness::new();
    // The store root exists but is empty, and the ext dir does not exist.
    let store = Arc::new(FsArtifactStore::new(scratch.path().join("empty-store")));
    harness
        .namespace
        .add_module_with_store("pkgA", store as Arc<dyn ArtifactStore>);
    harness
        .namespace
        .add_member_ir("pkgA", "Widget", b"ir-widget".to_vec());

    let config = LoaderConfig::new(scratch.path().join("missing-ext"), "linux-x86_64");
    let loader = harness.loader(&config);

    let unit = loader.resolve(&UnitName::new("dyn.pkgA.Widget")).unwrap();
    assert_eq!(unit.bytes(), b"unit:ir-widget");
    assert_eq!(
        harness.host.define_log(),
        vec!["dyn.pkgA.$Module", "dyn.pkgA.Widget"]
    );
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn concurrent_resolution_defines_each_unit_once() {
    let store_dir = TempDir::new().unwrap();
    write_store_artifact(store_dir.path(), "pkgA", "$Module", b"pool-pkgA");
    write_store_artifact(store_dir.path(), "pkgA", "Widget", b"widget-bytes");

    let harness = Harness::new();
    let store = Arc::new(FsArtifactStore::new(store_dir.path()));
    harness
        .namespace
        .add_module_with_store("pkgA", store as Arc<dyn ArtifactStore>);
    harness
        .namespace
        .add_member_ir("pkgA", "Gadget", b"ir-gadget".to_vec());

    let loader = Arc::new(harness.loader_without_fallback());
    let mut threads = Vec::new();
    for i in 0..12 {
        let loader = Arc::clone(&loader);
        // Half the threads race on the store path, half on live emission.
        let name = if i % 2 == 0 {
            UnitName::new("dyn.pkgA.Widget")
        } else {
            UnitName::new("dyn.pkgA.Gadget")
        };
        threads.push(std::thread::spawn(move || loader.resolve(&name).unwrap()));
    }
    for thread in threads {
        thread.join().unwrap();
    }

    assert_eq!(harness.host.define_count("dyn.pkgA.$Module"), 1);
    assert_eq!(harness.host.define_count("dyn.pkgA.Widget"), 1);
    assert_eq!(harness.host.define_count("dyn.pkgA.Gadget"), 1);
}
