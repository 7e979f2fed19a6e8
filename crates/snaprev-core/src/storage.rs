//! Local file lifecycle: per-attempt temp destinations and atomic writes.
//!
//! A temp destination is a `tempfile::NamedTempFile`; dropping it deletes the
//! file, so an abandoned download attempt never leaves a partial archive behind.

use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, TempPath};

const TEMP_PREFIX: &str = "snaprev-";
/// Suffix for in-flight archive downloads.
pub const TEMP_SUFFIX: &str = ".zip.part";

/// Creates a fresh temp destination in `dir`, or the system temp dir when `None`.
pub fn temp_destination(dir: Option<&Path>) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(TEMP_PREFIX).suffix(TEMP_SUFFIX);
    match dir {
        Some(d) => builder.tempfile_in(d),
        None => builder.tempfile(),
    }
}

/// Truncates `file` and moves its cursor to the start so a new body can be streamed in.
pub fn rewind(file: &mut File) -> io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    Ok(())
}

/// Writes `bytes` to `path` via a sibling temp file and rename, so readers never
/// observe a half-written file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;
    let mut tmp = NamedTempFile::new_in(&parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Moves a finished temp archive to `dest`. Falls back to copy when the rename
/// crosses filesystems; the temp file is removed either way.
pub fn keep_temp(temp: TempPath, dest: &Path) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    match temp.persist(dest) {
        Ok(()) => Ok(()),
        Err(e) => {
            let temp = e.path;
            std::fs::copy(&temp, dest)?;
            drop(temp);
            Ok(())
        }
    }
}
