//! Path derivation for on-disk artifact stores.

use std::path::{Path, PathBuf};

/// File extension for precompiled unit artifacts.
pub const UNIT_EXT: &str = "unit";

/// Map a raw member name to its on-disk file stem.
///
/// Member names may carry `$` (metadata and companion conventions); `$` is
/// stored as `_` on disk. Assumes member names contain no literal `_`, so
/// the mapping stays injective for the names the emitter produces.
pub fn member_file_stem(member: &str) -> String {
    member.replace('$', "_")
}

/// Full path of one member's precompiled artifact under a store root.
pub fn artifact_path(store_root: &Path, module: &str, member: &str) -> PathBuf {
    store_root
        .join(module)
        .join(format!("{}.{}", member_file_stem(member), UNIT_EXT))
}

/// Full path of a fallback unit inside an archive directory.
///
/// Fallback names are foreign (outside the reserved namespace) and used
/// verbatim as file stems.
pub fn fallback_unit_path(archive: &Path, name: &str) -> PathBuf {
    archive.join(format!("{}.{}", name, UNIT_EXT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_paths_are_deterministic() {
        let root = Path::new("/var/store");
        let path = artifact_path(root, "pkgA", "Widget");
        assert_eq!(path, Path::new("/var/store/pkgA/Widget.unit"));
    }

    #[test]
    fn dollar_names_are_mapped() {
        let root = Path::new("/var/store");
        assert_eq!(
            artifact_path(root, "pkgA", "$Module"),
            Path::new("/var/store/pkgA/_Module.unit")
        );
        assert_eq!(
            artifact_path(root, "pkgA", "Widget$"),
            Path::new("/var/store/pkgA/Widget_.unit")
        );
        assert_eq!(
            artifact_path(root, "pkgA", "IOErr$Val"),
            Path::new("/var/store/pkgA/IOErr_Val.unit")
        );
    }

    #[test]
    fn fallback_paths_use_the_full_name() {
        let archive = Path::new("/opt/ext/widgets.pack");
        assert_eq!(
            fallback_unit_path(archive, "org.vendor.Widget"),
            Path::new("/opt/ext/widgets.pack/org.vendor.Widget.unit")
        );
    }
}
