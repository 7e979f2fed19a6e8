//! `snaprev platforms` – show the configured fleet.

use snaprev_core::config::SnaprevConfig;
use snaprev_core::platform::PlatformDescriptor;

pub fn run_platforms(cfg: &SnaprevConfig) {
    let current = PlatformDescriptor::current().ok();
    for d in &cfg.fleet {
        let marker = if Some(*d) == current { "*" } else { " " };
        println!("{} {}", marker, d);
    }
    if current.is_none() {
        println!("(this machine has no published snapshot platform)");
    }
}
