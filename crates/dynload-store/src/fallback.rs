//! Fallback search path for names outside the reserved namespace.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use dynload_types::LoaderConfig;

use crate::paths::fallback_unit_path;

/// Extension marking a directory as a fallback unit archive.
pub const ARCHIVE_EXT: &str = "pack";

/// A fixed, process-wide list of external unit archives.
///
/// Assembled once at startup from the base extension directory and the
/// platform-specific subdirectory beneath it, in that order. Missing
/// directories and enumeration failures degrade to an empty (or shorter)
/// list; startup never fails on account of the fallback path.
pub struct FallbackSearchPath {
    archives: Vec<PathBuf>,
}

impl FallbackSearchPath {
    /// Discover archives under `<ext_dir>` and `<ext_dir>/<platform>`.
    pub fn discover(config: &LoaderConfig) -> Self {
        let mut archives = Vec::new();
        collect_archives(&config.ext_dir, &mut archives);
        collect_archives(&config.ext_dir.join(&config.platform), &mut archives);
        debug!(count = archives.len(), "assembled fallback search path");
        Self { archives }
    }

    /// An explicitly assembled list; used by tests and embedders that manage
    /// their own archive discovery.
    pub fn from_archives(archives: Vec<PathBuf>) -> Self {
        Self { archives }
    }

    pub fn empty() -> Self {
        Self {
            archives: Vec::new(),
        }
    }

    pub fn archives(&self) -> &[PathBuf] {
        &self.archives
    }

    /// Search every archive in order for `<name>.unit`. Read failures skip
    /// to the next archive.
    pub fn lookup(&self, name: &str) -> Option<Box<[u8]>> {
        for archive in &self.archives {
            let path = fallback_unit_path(archive, name);
            if !path.exists() {
                continue;
            }
            match std::fs::read(&path) {
                Ok(bytes) => return Some(bytes.into_boxed_slice()),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to read fallback unit, trying next archive"
                    );
                }
            }
        }
        None
    }
}

fn collect_archives(dir: &Path, acc: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "skipping fallback directory");
            return;
        }
    };
    let mut found = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() && path.extension().and_then(|s| s.to_str()) == Some(ARCHIVE_EXT) {
            found.push(path);
        }
    }
    // Deterministic order regardless of directory iteration order.
    found.sort();
    acc.extend(found);
}
