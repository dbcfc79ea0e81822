//! Verbatim static copies.

use std::fs;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;

use super::AssetEmitter;
use crate::config::StaticCopy;
use crate::error::{BuildError, BuildResult};
use crate::utils::path::to_slash;

const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Collect all files under `dir`, sorted.
pub fn collect_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<_> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .map(|e| e.path())
        .collect();
    files.sort();
    files
}

/// Copy one `static_copies` entry into the output directory.
///
/// Returns the `/`-separated destinations written, in sorted order.
pub fn copy_static(copy: &StaticCopy, emitter: &mut AssetEmitter) -> BuildResult<Vec<String>> {
    let source = copy.source();
    let dest = copy.destination();

    if source.is_file() {
        let bytes = fs::read(source).map_err(|e| BuildError::read(source, e))?;
        let rel = to_slash(&dest).into_owned();
        return Ok(vec![emitter.emit_fixed(&rel, &bytes)?]);
    }

    let mut written = Vec::new();
    for file in collect_files(source) {
        let Ok(inner) = file.strip_prefix(source) else {
            continue;
        };
        let bytes = fs::read(&file).map_err(|e| BuildError::read(&file, e))?;
        let rel = to_slash(&dest.join(inner)).into_owned();
        written.push(emitter.emit_fixed(&rel, &bytes)?);
    }
    Ok(written)
}
