//! Candidate archive URLs for a (revision, platform) pair.
//!
//! Snapshot archives live under `{base}{Dir}%2F{revision}%2F{archive}.zip?alt=media`.
//! `Dir` carries the `_x64` suffix only for 64-bit builds. Some platforms were
//! published under more than one archive name over time, so a probe has to try
//! every name that platform ever used.

use anyhow::{Context, Result};
use url::Url;

use crate::platform::{Architecture, Platform, PlatformDescriptor};
use crate::Revision;

/// Default bucket listing endpoint for Chromium snapshots.
pub const DEFAULT_CDN_BASE_URL: &str =
    "https://www.googleapis.com/download/storage/v1/b/chromium-browser-snapshots/o/";

/// Builds candidate archive URLs from a validated CDN base.
#[derive(Debug, Clone)]
pub struct ArchiveLocator {
    base: String,
}

impl ArchiveLocator {
    /// Validates `base` as an absolute http(s) URL. A trailing `/` is added when missing.
    pub fn new(base: &str) -> Result<Self> {
        let parsed = Url::parse(base).with_context(|| format!("invalid CDN base URL: {}", base))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            anyhow::bail!("CDN base URL must be http(s): {}", base);
        }
        let mut base = base.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self { base })
    }

    /// All URLs an archive for `descriptor` at `revision` may be published under,
    /// in preference order (current name first).
    pub fn candidate_urls(&self, revision: Revision, descriptor: &PlatformDescriptor) -> Vec<String> {
        let dir = platform_dir(descriptor);
        archive_names(descriptor.platform)
            .iter()
            .map(|name| {
                format!(
                    "{}{}%2F{}%2F{}.zip?alt=media",
                    self.base, dir, revision, name
                )
            })
            .collect()
    }
}

impl Default for ArchiveLocator {
    fn default() -> Self {
        Self {
            base: DEFAULT_CDN_BASE_URL.to_string(),
        }
    }
}

fn platform_dir(descriptor: &PlatformDescriptor) -> String {
    let base = match descriptor.platform {
        Platform::Linux => "Linux",
        Platform::Windows => "Win",
        Platform::MacOs => "Mac",
    };
    match descriptor.architecture {
        Some(Architecture::X64) => format!("{}_x64", base),
        Some(Architecture::X86) | None => base.to_string(),
    }
}

/// Archive (and top-level folder) names per platform. Windows snapshots were
/// renamed from `chrome-win32` to `chrome-win`; both are still served.
pub fn archive_names(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::Linux => &["chrome-linux"],
        Platform::Windows => &["chrome-win", "chrome-win32"],
        Platform::MacOs => &["chrome-mac"],
    }
}
