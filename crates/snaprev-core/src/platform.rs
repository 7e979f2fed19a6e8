//! Platform/architecture descriptors and the default fleet.
//!
//! Serialized names follow the historical snapshot tooling (`linux`, `win32`,
//! `darwin`; `x32`, `x64`) so revision tables stay readable by older consumers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating system family a snapshot archive is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "linux")]
    Linux,
    #[serde(rename = "win32", alias = "windows")]
    Windows,
    #[serde(rename = "darwin", alias = "macos")]
    MacOs,
}

/// CPU architecture, when the archive naming distinguishes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Architecture {
    #[serde(rename = "x32", alias = "x86")]
    X86,
    #[serde(rename = "x64")]
    X64,
}

/// One build target in the fleet. `architecture: None` means the platform's
/// archive naming has no architecture distinction (e.g. the macOS build).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformDescriptor {
    pub platform: Platform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<Architecture>,
}

impl PlatformDescriptor {
    pub const fn new(platform: Platform, architecture: Option<Architecture>) -> Self {
        Self {
            platform,
            architecture,
        }
    }

    /// Descriptor for the platform this binary was compiled for.
    pub fn current() -> Result<Self, UnsupportedPlatform> {
        Self::from_target(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Only x86_64 selects the `_x64` directory. Any other CPU maps to the
    /// unsuffixed platform directory.
    pub(crate) fn from_target(os: &str, arch: &str) -> Result<Self, UnsupportedPlatform> {
        let platform = match os {
            "linux" => Platform::Linux,
            "windows" => Platform::Windows,
            "macos" => Platform::MacOs,
            other => return Err(UnsupportedPlatform::os(other)),
        };
        let architecture = match (platform, arch) {
            (Platform::MacOs, _) => None,
            (_, "x86_64") => Some(Architecture::X64),
            (_, "x86") => Some(Architecture::X86),
            (_, _) => None,
        };
        Ok(Self::new(platform, architecture))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Linux => "linux",
            Platform::Windows => "win32",
            Platform::MacOs => "darwin",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Architecture::X86 => f.write_str("x32"),
            Architecture::X64 => f.write_str("x64"),
        }
    }
}

impl fmt::Display for PlatformDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.architecture {
            Some(arch) => write!(f, "{} {}", self.platform, arch),
            None => write!(f, "{}", self.platform),
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(Platform::Linux),
            "win32" | "windows" | "win" => Ok(Platform::Windows),
            "darwin" | "macos" | "mac" => Ok(Platform::MacOs),
            other => Err(format!("unknown platform {:?} (expected linux, win32 or darwin)", other)),
        }
    }
}

impl std::str::FromStr for Architecture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x32" | "x86" => Ok(Architecture::X86),
            "x64" | "x86_64" => Ok(Architecture::X64),
            other => Err(format!("unknown architecture {:?} (expected x32 or x64)", other)),
        }
    }
}

/// The running OS has no published snapshot archives.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unsupported platform: {detail}")]
pub struct UnsupportedPlatform {
    detail: String,
}

impl UnsupportedPlatform {
    fn os(os: &str) -> Self {
        Self {
            detail: format!("os {}", os),
        }
    }
}

/// Fleet resolved by `snaprev resolve` when the config does not override it.
pub fn default_fleet() -> Vec<PlatformDescriptor> {
    vec![
        PlatformDescriptor::new(Platform::Linux, Some(Architecture::X64)),
        PlatformDescriptor::new(Platform::Windows, Some(Architecture::X86)),
        PlatformDescriptor::new(Platform::Windows, Some(Architecture::X64)),
        PlatformDescriptor::new(Platform::MacOs, None),
    ]
}
