//! Operator CLI for the dynload subsystem.
//!
//! **Key modes**
//! - Store inspection: `dynload inspect-store --root <dir>` lists every
//!   module's precompiled artifacts.
//! - Driven resolution: `dynload resolve <name> --image <image.json>` wires
//!   an in-memory namespace/emitter/host from a JSON image, runs the
//!   resolution state machine, and reports what was defined.
//!
//! Resolution in the library never prints; set `RUST_LOG=dynload=debug` (or
//! finer) to watch the state machine through the tracing subscriber
//! installed here.

mod args;
mod image;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dynload_core::UnitLoader;
use dynload_types::{LoaderConfig, UnitName};

use crate::args::{Args, Command};
use crate::image::Image;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match args.command {
        Command::InspectStore { root } => inspect_store(&root),
        Command::Resolve {
            name,
            image,
            store_root,
            ext_dir,
            platform,
            show_defines,
        } => resolve(
            &name,
            &image,
            store_root.as_deref(),
            ext_dir,
            platform,
            show_defines,
        ),
    }
}

fn inspect_store(root: &Path) -> Result<()> {
    let entries = std::fs::read_dir(root)
        .with_context(|| format!("read store root {}", root.display()))?;

    let mut modules: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    modules.sort();

    if modules.is_empty() {
        println!("store {} holds no modules", root.display());
        return Ok(());
    }

    let mut total = 0usize;
    for module_dir in &modules {
        let module = module_dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("?");
        let mut artifacts: Vec<(String, u64)> = std::fs::read_dir(module_dir)
            .with_context(|| format!("read module dir {}", module_dir.display()))?
            .flatten()
            .filter_map(|e| {
                let path = e.path();
                if path.extension().and_then(|s| s.to_str()) != Some("unit") {
                    return None;
                }
                let stem = path.file_stem()?.to_str()?.to_string();
                let len = e.metadata().ok()?.len();
                Some((stem, len))
            })
            .collect();
        artifacts.sort();

        println!("{} ({} artifacts)", module, artifacts.len());
        for (stem, len) in &artifacts {
            println!("  {:<32} {:>8} bytes", stem, len);
        }
        total += artifacts.len();
    }
    println!("{} modules, {} artifacts", modules.len(), total);
    Ok(())
}

fn resolve(
    name: &str,
    image_path: &Path,
    store_root: Option<&Path>,
    ext_dir: Option<PathBuf>,
    platform: Option<String>,
    show_defines: bool,
) -> Result<()> {
    let image = Image::from_file(image_path)?;
    let harness = image.build(store_root)?;
    tracing::debug!(
        image = %image_path.display(),
        modules = image.modules.len(),
        staged = image.staged.len(),
        "image loaded"
    );

    let ext_dir = match ext_dir {
        Some(dir) => dir,
        None => default_ext_dir()?,
    };
    let platform = platform.unwrap_or_else(LoaderConfig::host_platform);
    let config = LoaderConfig::new(ext_dir, platform);

    let loader = UnitLoader::new(
        &config,
        harness.host.clone(),
        harness.emitter.clone(),
        harness.namespace.clone(),
    );
    image.stage_into(&loader)?;

    let unit = loader
        .resolve(&UnitName::new(name))
        .map_err(|e| anyhow!("{}", e))?;
    println!("resolved {} ({} bytes)", unit.name(), unit.len());

    if show_defines {
        println!("definitions, in order:");
        for defined in harness.host.define_log() {
            println!("  {}", defined);
        }
    }
    Ok(())
}

fn default_ext_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(home.join("lib").join("dynload").join("ext"))
}
