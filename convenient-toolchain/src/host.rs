//! Access to the host process environment
//!
//! The resolver never reads `std::env` directly. Everything it needs from the
//! machine it runs on goes through [`Host`], so tests can supply a fixed view.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// Presence enables the osxcross toolchain; value is its install root.
pub const OSXCROSS_ROOT: &str = "OSXCROSS_ROOT";

/// Install prefix of MacPorts.
pub const MACPORTS_PREFIX: &str = "MACPORTS_PREFIX";

/// Compiler cache command to put in front of cross compilers.
pub const CCACHE: &str = "CCACHE";

/// Read-only view of the host the resolver runs on.
pub trait Host {
    /// Value of an environment variable, `None` when unset
    fn var(&self, name: &str) -> Option<String>;

    /// Home directory of the current user
    fn home_dir(&self) -> Option<PathBuf>;

    /// Path of an Apple SDK (`macosx`, `iphoneos`, ...) as reported by xcrun
    fn sdk_path(&self, sdk: &str) -> Option<PathBuf>;

    /// Expand a leading `~` to the home directory.
    fn expand_user(&self, path: &Path) -> PathBuf {
        match (path.strip_prefix("~"), self.home_dir()) {
            (Ok(rest), Some(home)) => home.join(rest),
            _ => path.to_path_buf(),
        }
    }
}

/// The real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

impl Host for SystemHost {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.var("HOME").filter(|h| !h.is_empty()).map(PathBuf::from)
    }

    fn sdk_path(&self, sdk: &str) -> Option<PathBuf> {
        let output = match Command::new("xcrun")
            .args(["--sdk", sdk, "--show-sdk-path"])
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                debug!("Could not run xcrun: {}", e);
                return None;
            }
        };

        if !output.status.success() {
            warn!(
                "xcrun --sdk {} --show-sdk-path failed: {}",
                sdk,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return None;
        }

        String::from_utf8(output.stdout)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
    }
}

/// A fixed, in-memory host.
#[derive(Debug, Default, Clone)]
pub struct StaticHost {
    vars: HashMap<String, String>,
    home: Option<PathBuf>,
    sdks: HashMap<String, PathBuf>,
}

impl StaticHost {
    /// Empty host: no variables, no home, no SDKs
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an environment variable
    #[must_use]
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.vars.insert(name.into(), value.into());
        self
    }

    /// Set the home directory
    #[must_use]
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Register the path xcrun reports for `sdk`
    #[must_use]
    pub fn with_sdk(mut self, sdk: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let _ = self.sdks.insert(sdk.into(), path.into());
        self
    }
}

impl Host for StaticHost {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }

    fn sdk_path(&self, sdk: &str) -> Option<PathBuf> {
        self.sdks.get(sdk).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_host() {
        let host = StaticHost::new()
            .with_var(CCACHE, "ccache")
            .with_home("/Users/dev")
            .with_sdk("macosx", "/sdk/MacOSX.sdk");

        assert_eq!(host.var(CCACHE).as_deref(), Some("ccache"));
        assert_eq!(host.var(OSXCROSS_ROOT), None);
        assert_eq!(host.sdk_path("macosx"), Some(PathBuf::from("/sdk/MacOSX.sdk")));
        assert_eq!(host.sdk_path("iphoneos"), None);
    }

    #[test]
    fn test_expand_user() {
        let host = StaticHost::new().with_home("/Users/dev");
        assert_eq!(
            host.expand_user(Path::new("~/VulkanSDK/1.3")),
            PathBuf::from("/Users/dev/VulkanSDK/1.3")
        );
        assert_eq!(host.expand_user(Path::new("/opt/sdk")), PathBuf::from("/opt/sdk"));

        let homeless = StaticHost::new();
        assert_eq!(homeless.expand_user(Path::new("~/sdk")), PathBuf::from("~/sdk"));
    }
}
