//! Unpack a fetched archive into an output directory.
//!
//! Entry paths are sanitized by the reader, so a hostile archive cannot write
//! outside `out_dir`. Unix permission bits stored in the archive are restored.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use zip::ZipArchive;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("create {path}: {source}")]
    OutputDir { path: PathBuf, source: io::Error },
    #[error("open {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("read archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Extracts `archive` into `out_dir`, creating the directory first. Existing
/// files with the same names are overwritten.
pub fn extract_zip(archive: &Path, out_dir: &Path) -> Result<(), ExtractError> {
    std::fs::create_dir_all(out_dir).map_err(|source| ExtractError::OutputDir {
        path: out_dir.to_path_buf(),
        source,
    })?;
    let file = File::open(archive).map_err(|source| ExtractError::Open {
        path: archive.to_path_buf(),
        source,
    })?;
    let mut zip = ZipArchive::new(file)?;
    tracing::info!(
        archive = %archive.display(),
        out_dir = %out_dir.display(),
        entries = zip.len(),
        "extracting"
    );
    zip.extract(out_dir)?;
    Ok(())
}
