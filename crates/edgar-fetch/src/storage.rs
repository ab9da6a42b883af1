//! Filesystem helpers for the fetch run. The storage tree doubles as the
//! completion ledger: a non-empty file at a task's path means "done".

use std::io::{self, Write};
use std::path::Path;

/// Create `dir` and any missing parents. Repeating it is harmless.
pub fn ensure_dir(dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dir)
}

/// True if `path` is a regular file with at least one byte.
pub fn is_complete(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.len() > 0)
        .unwrap_or(false)
}

/// Write `contents` to `path` via a temp file in the same directory,
/// renamed into place once fully flushed. Readers see either the old file
/// or the complete new one.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| io::Error::other(format!("{} has no parent directory", path.display())))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

/// Check that new files can still be created directly under `root`.
pub fn probe_writable(root: &Path) -> io::Result<()> {
    tempfile::tempfile_in(root).map(drop)
}
