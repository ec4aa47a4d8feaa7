//! CPU architectures supported by the macOS toolchain

use crate::error::{ResolveError, ResolveResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Architecture names accepted for macOS builds, in diagnostic order.
pub const SUPPORTED_ARCHITECTURES: &[&str] = &["x86_64", "arm64"];

/// A validated target CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    /// 64-bit Intel
    #[serde(rename = "x86_64")]
    X86_64,
    /// Apple Silicon
    Arm64,
}

impl Architecture {
    /// Name used in `-arch` flags and option values
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Arm64 => "arm64",
        }
    }

    /// Oldest macOS release the produced binaries run on.
    pub fn macos_min_version(self) -> &'static str {
        match self {
            Self::X86_64 => "10.12",
            Self::Arm64 => "11.0",
        }
    }

    /// Leading part of the osxcross target triple, e.g. `arm64-apple-`.
    pub fn triple_prefix(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64-apple-",
            Self::Arm64 => "arm64-apple-",
        }
    }

    /// Map the architecture of the running host to an option value, if the
    /// host is one of the supported architectures.
    pub fn host() -> Option<Self> {
        match std::env::consts::ARCH {
            "x86_64" => Some(Self::X86_64),
            "aarch64" | "arm64" => Some(Self::Arm64),
            _ => None,
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x86_64" => Ok(Self::X86_64),
            "arm64" => Ok(Self::Arm64),
            _ => Err(unsupported(s, SUPPORTED_ARCHITECTURES)),
        }
    }
}

fn unsupported(requested: &str, supported: &[&str]) -> ResolveError {
    ResolveError::UnsupportedArchitecture {
        requested: requested.to_string(),
        supported: supported.iter().map(|s| (*s).to_string()).collect(),
    }
}

/// Check `requested` against `supported`.
pub fn validate(requested: &str, supported: &[&str]) -> ResolveResult<()> {
    if supported.contains(&requested) {
        Ok(())
    } else {
        Err(unsupported(requested, supported))
    }
}
