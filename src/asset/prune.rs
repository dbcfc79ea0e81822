//! Stale output removal.

use std::fs;
use std::path::Path;

use rustc_hash::FxHashSet;

use super::copy::collect_files;
use crate::log;
use crate::utils::path::relative_slash;

/// Remove files under `out_dir` that are neither in `keep` nor the manifest.
///
/// `keep` holds `/`-separated names relative to `out_dir`. Returns the
/// number of files removed. Failures are logged and skipped; the published
/// manifest is already in place at this point.
pub fn prune_stale(out_dir: &Path, keep: &FxHashSet<&str>, manifest: &Path) -> usize {
    if !out_dir.is_dir() {
        return 0;
    }

    let mut removed = 0;
    for file in collect_files(out_dir) {
        if file == manifest {
            continue;
        }
        let rel = relative_slash(&file, out_dir);
        if keep.contains(rel.as_str()) {
            continue;
        }
        match fs::remove_file(&file) {
            Ok(()) => removed += 1,
            Err(e) => log!("warning"; "failed to remove stale {}: {}", rel, e),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::path::normalize_path;
    use crate::utils::testutil::write;
    use tempfile::TempDir;

    #[test]
    fn test_prune_keeps_manifest_and_live_files() {
        let dir = TempDir::new().unwrap();
        let out = &normalize_path(dir.path());
        write(out, "main.bundle.new.js", "new");
        write(out, "main.bundle.old.js", "old");
        write(out, "img/logo.png", "png");
        let manifest = write(out, "manifest.json", "{}");

        let keep: FxHashSet<&str> = ["main.bundle.new.js", "img/logo.png"].into_iter().collect();
        let removed = prune_stale(out, &keep, &manifest);

        assert_eq!(removed, 1);
        assert!(!out.join("main.bundle.old.js").exists());
        assert!(out.join("main.bundle.new.js").exists());
        assert!(out.join("img/logo.png").exists());
        assert!(manifest.exists());
    }
}
