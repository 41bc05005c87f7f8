//! Declarative resolution images.
//!
//! An image is a JSON description of a namespace: modules, their member IR
//! definitions, companion buffers produced alongside a primary, and buffers
//! to pre-stage in the pending table. The CLI loads an image and wires it
//! into an in-memory namespace, emitter, and host so a resolution can be
//! driven and observed end to end without a real emitter on the path.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};

use dynload_core::{InMemoryHost, InMemoryNamespace, MockEmitter, UnitLoader};
use dynload_store::{ArtifactStore, FsArtifactStore};
use dynload_types::UnitName;

/// Root of an image file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub modules: Vec<ModuleImage>,
    /// Buffers staged into the pending table before resolving.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub staged: Vec<StagedImage>,
}

/// One module in an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleImage {
    pub name: String,
    /// Attach the CLI's `--store-root` store to this module.
    #[serde(default)]
    pub use_store: bool,
    /// Explicit metadata bytes; when absent the emitter synthesizes them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<MemberImage>,
}

/// One member type and its emission side effects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberImage {
    pub name: String,
    pub ir_base64: String,
    /// Companion buffers registered while this member is emitted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub companions: Vec<CompanionImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanionImage {
    pub name: String,
    pub bytes_base64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedImage {
    /// Full unit name (e.g. `dyn.pkgA.Widget`).
    pub name: String,
    pub bytes_base64: String,
}

/// The wired-up fixture an image produces.
#[derive(Debug)]
pub struct ImageHarness {
    pub host: Arc<InMemoryHost>,
    pub emitter: Arc<MockEmitter>,
    pub namespace: Arc<InMemoryNamespace>,
}

impl Image {
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read image {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("parse image {}", path.display()))
    }

    /// Build the namespace, emitter, and host this image describes.
    /// `store_root` backs the modules flagged `use_store`.
    pub fn build(&self, store_root: Option<&Path>) -> Result<ImageHarness> {
        let host = Arc::new(InMemoryHost::new());
        let emitter = Arc::new(MockEmitter::new());
        let namespace = Arc::new(InMemoryNamespace::new());
        let store: Option<Arc<dyn ArtifactStore>> = store_root
            .map(|root| Arc::new(FsArtifactStore::new(root)) as Arc<dyn ArtifactStore>);

        for module in &self.modules {
            if module.use_store {
                let store = store.clone().ok_or_else(|| {
                    anyhow!(
                        "module {} is flagged use_store but no --store-root was given",
                        module.name
                    )
                })?;
                namespace.add_module_with_store(&module.name, store);
            } else {
                namespace.add_module(&module.name);
            }

            if let Some(metadata) = &module.metadata_base64 {
                emitter.add_module_metadata(&module.name, decode(metadata)?);
            }

            for member in &module.members {
                namespace.add_member_ir(&module.name, &member.name, decode(&member.ir_base64)?);
                for companion in &member.companions {
                    emitter.add_companion(
                        &module.name,
                        &member.name,
                        &companion.name,
                        decode(&companion.bytes_base64)?,
                    );
                }
            }
        }

        Ok(ImageHarness {
            host,
            emitter,
            namespace,
        })
    }

    /// Stage the image's pre-staged buffers into `loader`.
    pub fn stage_into(&self, loader: &UnitLoader) -> Result<()> {
        for staged in &self.staged {
            loader.stage(&UnitName::new(staged.name.as_str()), decode(&staged.bytes_base64)?);
        }
        Ok(())
    }
}

fn decode(b64: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(b64)
        .map_err(|e| anyhow!("invalid base64 payload: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b64(bytes: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    #[test]
    fn parse_and_build_minimal_image() {
        let json = format!(
            r#"{{
                "modules": [
                    {{
                        "name": "pkgA",
                        "members": [
                            {{ "name": "Widget", "ir_base64": "{}" }}
                        ]
                    }}
                ]
            }}"#,
            b64(b"ir-w")
        );
        let image: Image = serde_json::from_str(&json).unwrap();
        assert_eq!(image.modules.len(), 1);
        assert!(!image.modules[0].use_store);

        let harness = image.build(None).unwrap();
        assert_eq!(harness.namespace.module_names(), vec!["pkgA"]);
    }

    #[test]
    fn use_store_without_root_is_an_error() {
        let image = Image {
            modules: vec![ModuleImage {
                name: "pkgA".to_string(),
                use_store: true,
                metadata_base64: None,
                members: Vec::new(),
            }],
            staged: Vec::new(),
        };
        let err = image.build(None).unwrap_err();
        assert!(err.to_string().contains("--store-root"));
    }
}
