//! CLI command handlers, one file per command.

mod fetch;
mod platforms;
mod probe;
mod progress;
mod resolve;

pub use fetch::run_fetch;
pub use platforms::run_platforms;
pub use probe::run_probe;
pub use resolve::run_resolve;

use anyhow::{bail, Context, Result};
use snaprev_core::config::SnaprevConfig;
use snaprev_core::transport::{ArchiveTransport, CurlTransport};
use snaprev_core::version::BaseRevisionSource;
use snaprev_core::Revision;
use std::sync::Arc;

fn transport(cfg: &SnaprevConfig) -> Arc<dyn ArchiveTransport> {
    Arc::new(CurlTransport::new(cfg.transport_options()))
}

/// An explicit `--base-revision` wins; otherwise the version is looked up.
async fn base_revision(
    cfg: &SnaprevConfig,
    version: Option<&str>,
    base_revision: Option<Revision>,
) -> Result<Revision> {
    if let Some(rev) = base_revision {
        return Ok(rev);
    }
    let Some(version) = version else {
        bail!("either --version or --base-revision is required");
    };
    let lookup = cfg.version_lookup()?;
    let version = version.to_string();
    let rev = tokio::task::spawn_blocking(move || lookup.base_revision(&version).map(|r| (version, r)))
        .await
        .context("version lookup task join")?;
    let (version, rev) = rev.context("look up base revision")?;
    println!("Chromium {} has base revision {}", version, rev);
    Ok(rev)
}
