//! `snaprev fetch` – download (and optionally extract) the running platform's archive.

use anyhow::{Context, Result};
use snaprev_core::checksum;
use snaprev_core::config::SnaprevConfig;
use snaprev_core::extract;
use snaprev_core::fetcher::Fetcher;
use snaprev_core::platform::PlatformDescriptor;
use snaprev_core::table::RevisionTable;
use snaprev_core::Revision;
use std::path::{Path, PathBuf};

use super::progress::spawn_progress;
use crate::cli::FetchSource;

fn revision_from_table(path: &Path, descriptor: &PlatformDescriptor) -> Result<Revision> {
    let table = RevisionTable::load_from_path(path)?;
    table
        .revision_for(descriptor)
        .with_context(|| format!("{} has no entry for {}", path.display(), descriptor))
}

pub async fn run_fetch(
    cfg: &SnaprevConfig,
    source: &FetchSource,
    max_attempts: Option<u32>,
    out_dir: Option<PathBuf>,
    keep_archive: Option<PathBuf>,
) -> Result<()> {
    let descriptor = PlatformDescriptor::current()?;
    let revision = match &source.table {
        Some(path) => revision_from_table(path, &descriptor)?,
        None => {
            super::base_revision(cfg, source.chrome_version.as_deref(), source.base_revision)
                .await?
        }
    };
    let max_attempts = max_attempts.unwrap_or(cfg.max_attempts);

    let fetcher = Fetcher::new(super::transport(cfg), cfg.locator()?, descriptor, max_attempts);
    println!("Fetching {} archive from r{}", descriptor, revision);
    let (events, progress) = spawn_progress();
    let result = fetcher.fetch_archive(revision, 0, Some(&events)).await;
    drop(events);
    progress.await.context("progress task join")?;
    let archive = result.context("fetch archive")?;

    let path = archive.path().to_path_buf();
    let digest = tokio::task::spawn_blocking(move || checksum::sha256_file(&path))
        .await
        .context("checksum task join")?
        .context("checksum archive")?;
    println!("r{}  {} bytes  sha256 {}", archive.revision, archive.bytes, digest);
    println!("  {}", archive.url);

    if let Some(out_dir) = out_dir {
        let path = archive.path().to_path_buf();
        let dir = out_dir.clone();
        tokio::task::spawn_blocking(move || extract::extract_zip(&path, &dir))
            .await
            .context("extract task join")??;
        println!("Extracted into {}", out_dir.display());
    }

    if let Some(dest) = keep_archive {
        let kept = archive
            .keep(&dest)
            .with_context(|| format!("keep archive at {}", dest.display()))?;
        println!("Archive kept at {}", kept.display());
    }
    Ok(())
}
