//! Scoped file writes.
//!
//! Every output goes through a temp file in the destination directory that
//! is later persisted (renamed) into place. The temp handle is released and
//! the temp file removed on every exit path, so readers never observe a
//! half-written file.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Check if file content is the same as new content
pub fn content_matches(path: &Path, content: &[u8]) -> bool {
    path.is_file() && fs::read(path).is_ok_and(|existing| existing == content)
}

/// Write `content` to a temp file next to `path`, flushed and synced.
///
/// The returned handle must be persisted to take effect; dropping it
/// discards the write.
pub fn stage(path: &Path, content: &[u8]) -> io::Result<NamedTempFile> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    Ok(temp)
}
