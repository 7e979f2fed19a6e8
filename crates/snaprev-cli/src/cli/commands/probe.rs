//! `snaprev probe` – one existence check, for debugging archive naming.

use anyhow::{Context, Result};
use snaprev_core::config::SnaprevConfig;
use snaprev_core::platform::{Architecture, Platform, PlatformDescriptor};
use snaprev_core::prober::ExistenceProber;
use snaprev_core::Revision;

pub async fn run_probe(
    cfg: &SnaprevConfig,
    revision: Revision,
    platform: Platform,
    arch: Option<Architecture>,
) -> Result<()> {
    let descriptor = PlatformDescriptor::new(platform, arch);
    let prober = ExistenceProber::new(super::transport(cfg), cfg.locator()?);
    for url in prober.locator().candidate_urls(revision, &descriptor) {
        println!("  {}", url);
    }
    let found = prober
        .check(revision, descriptor)
        .await
        .with_context(|| format!("probe {} r{}", descriptor, revision))?;
    if found {
        println!("[{}] r{}: published", descriptor, revision);
    } else {
        println!("[{}] r{}: not published", descriptor, revision);
    }
    Ok(())
}
