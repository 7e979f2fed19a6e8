//! `snaprev resolve` – discover and persist the fleet's revision table.

use anyhow::{Context, Result};
use snaprev_core::config::SnaprevConfig;
use snaprev_core::fleet;
use snaprev_core::prober::ExistenceProber;
use snaprev_core::table::JsonFileSink;
use std::path::PathBuf;
use std::sync::Arc;

use super::progress::spawn_progress;
use crate::cli::BaseArgs;

pub async fn run_resolve(
    cfg: &SnaprevConfig,
    base: &BaseArgs,
    max_attempts: Option<u32>,
    output: Option<PathBuf>,
) -> Result<()> {
    let base_revision =
        super::base_revision(cfg, base.chrome_version.as_deref(), base.base_revision).await?;
    let max_attempts = max_attempts.unwrap_or(cfg.max_attempts);
    let output = output.unwrap_or_else(|| cfg.output_path.clone());

    let prober = Arc::new(ExistenceProber::new(super::transport(cfg), cfg.locator()?));
    let sink = JsonFileSink::new(&output);

    println!(
        "Resolving {} platform(s) from r{} (up to {} decrement(s))",
        cfg.fleet.len(),
        base_revision,
        max_attempts
    );
    let (events, progress) = spawn_progress();
    let result = fleet::discover_and_persist(
        prober,
        base_revision,
        &cfg.fleet,
        max_attempts,
        &sink,
        Some(events),
    )
    .await;
    progress.await.context("progress task join")?;
    let table = result.context("resolve fleet")?;

    println!("{:<12} {}", "PLATFORM", "REVISION");
    for entry in table.entries() {
        println!("{:<12} {}", entry.descriptor.to_string(), entry.revision);
    }
    println!("Wrote {}", sink.path().display());
    Ok(())
}
