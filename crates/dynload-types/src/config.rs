//! Startup configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration supplied once at subsystem startup, immutable afterward.
///
/// Only the fallback search path is configurable: the base extension
/// directory and the platform identifier selecting its platform-specific
/// subdirectory (e.g. `linux-x86_64`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Base directory holding fallback unit archives.
    pub ext_dir: PathBuf,
    /// Platform identifier naming the subdirectory of `ext_dir` searched
    /// after `ext_dir` itself.
    pub platform: String,
}

impl LoaderConfig {
    pub fn new(ext_dir: impl Into<PathBuf>, platform: impl Into<String>) -> Self {
        Self {
            ext_dir: ext_dir.into(),
            platform: platform.into(),
        }
    }

    /// Platform identifier for the running process, `<os>-<arch>`.
    pub fn host_platform() -> String {
        format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_platform_shape() {
        let platform = LoaderConfig::host_platform();
        assert!(platform.contains('-'));
        assert!(!platform.starts_with('-'));
        assert!(!platform.ends_with('-'));
    }

    #[test]
    fn round_trips_through_json() {
        let config = LoaderConfig::new("/opt/dynload/ext", "linux-x86_64");
        let json = serde_json::to_string(&config).unwrap();
        let back: LoaderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ext_dir, config.ext_dir);
        assert_eq!(back.platform, "linux-x86_64");
    }
}
