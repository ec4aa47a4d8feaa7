//! Error types for option validation and configuration resolution

use std::path::PathBuf;
use thiserror::Error;

/// Exit status for generic validation failures.
pub const EXIT_VALIDATION: i32 = 1;

/// Exit status for missing external dependencies.
pub const EXIT_DISCOVERY: i32 = 255;

/// Fatal errors raised while resolving a configuration.
///
/// No partial configuration is produced when one of these is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Requested CPU architecture is not supported on the target platform
    #[error(
        "Unsupported CPU architecture \"{requested}\" for macOS. Supported architectures are: {}.",
        supported.join(", ")
    )]
    UnsupportedArchitecture {
        /// Value that was requested
        requested: String,
        /// Every supported architecture
        supported: Vec<String>,
    },

    /// Vulkan is enabled but no MoltenVK library was found
    #[error(
        "MoltenVK SDK installation directory not found, use 'vulkan_sdk_path' option to specify SDK path."
    )]
    MoltenVkNotFound,

    /// Native build without a usable macOS SDK path
    #[error(
        "Failed to find the macOS SDK path while running 'xcrun --sdk {sdk} --show-sdk-path', use 'macos_sdk_path' option to specify SDK path."
    )]
    MacosSdkNotFound {
        /// SDK name passed to xcrun
        sdk: String,
    },
}

impl ResolveError {
    /// Whether this is a discovery failure (as opposed to a validation error).
    pub fn is_discovery_failure(&self) -> bool {
        matches!(
            self,
            Self::MoltenVkNotFound | Self::MacosSdkNotFound { .. }
        )
    }

    /// Process exit status the outermost caller should use.
    pub fn exit_code(&self) -> i32 {
        if self.is_discovery_failure() {
            EXIT_DISCOVERY
        } else {
            EXIT_VALIDATION
        }
    }
}

/// Result alias for resolution
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors raised while turning raw option values into [`crate::BuildOptions`].
#[derive(Debug, Error)]
pub enum OptionError {
    /// Option name not declared in the registry
    #[error("Unknown option: {0}")]
    Unknown(String),

    /// Boolean option with an unrecognised value
    #[error("Invalid value \"{value}\" for boolean option '{name}'")]
    InvalidBool {
        /// Option name
        name: String,
        /// Rejected value
        value: String,
    },

    /// Enum option with a value outside its allowed set
    #[error("Invalid value \"{value}\" for option '{name}', allowed values are: {}", allowed.join(", "))]
    InvalidChoice {
        /// Option name
        name: String,
        /// Rejected value
        value: String,
        /// Allowed values
        allowed: Vec<String>,
    },

    /// Command-line assignment without `=`
    #[error("Malformed option assignment \"{0}\", expected key=value")]
    MalformedAssignment(String),

    /// Options file could not be read
    #[error("Failed to read options file {0:?}: {1}")]
    Io(PathBuf, String),

    /// Options file is not a mapping of scalars
    #[error("Failed to parse options file {0:?}: {1}")]
    Parse(PathBuf, String),
}

/// Result alias for option handling
pub type OptionResult<T> = Result<T, OptionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_arch_message() {
        let err = ResolveError::UnsupportedArchitecture {
            requested: "armv7".to_string(),
            supported: vec!["x86_64".to_string(), "arm64".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Unsupported CPU architecture \"armv7\" for macOS. Supported architectures are: x86_64, arm64."
        );
        assert_eq!(err.exit_code(), EXIT_VALIDATION);
        assert!(!err.is_discovery_failure());
    }

    #[test]
    fn test_discovery_exit_code() {
        assert_eq!(ResolveError::MoltenVkNotFound.exit_code(), 255);
        assert!(ResolveError::MoltenVkNotFound.to_string().contains("vulkan_sdk_path"));
    }
}
