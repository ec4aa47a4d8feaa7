//! Strongly-typed build options
//!
//! [`BuildOptions`] is the validated, immutable input of a resolution run.
//! Raw `name=value` strings are turned into it by [`crate::OptionRegistry`].

use crate::arch::Architecture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

macro_rules! option_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $value:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            /// Every accepted option value
            pub const VALUES: &'static [&'static str] = &[$($value),+];

            /// Option value spelling
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }

            /// Parse an option value
            pub fn from_value(value: &str) -> Option<Self> {
                match value {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

option_enum! {
    /// Overall build intent
    TargetMode {
        /// Optimized build
        Release => "release",
        /// Optimized build that keeps debug facilities
        ReleaseDebug => "release_debug",
        /// Unoptimized build with full debug info
        Debug => "debug",
    }
}

option_enum! {
    /// What release builds optimize for
    OptimizeMode {
        /// Execution speed
        Speed => "speed",
        /// Binary size
        Size => "size",
    }
}

option_enum! {
    /// Link-time optimization mode as requested
    LtoMode {
        /// Let the platform decide
        Auto => "auto",
        /// No LTO
        None => "none",
        /// Full LTO
        Full => "full",
        /// ThinLTO
        Thin => "thin",
    }
}

option_enum! {
    /// Clang distribution installed through MacPorts
    MacportsClang {
        /// Use the system clang
        No => "no",
        /// llvm-5.0
        V5_0 => "5.0",
        /// llvm-devel
        Devel => "devel",
    }
}

impl LtoMode {
    /// Resolve `auto` to a concrete mode. LTO gains on macOS are not
    /// established, so `auto` means no LTO.
    pub fn normalize(self) -> Self {
        match self {
            Self::Auto => Self::None,
            other => other,
        }
    }
}

impl MacportsClang {
    /// Version tag substituted into `libexec/llvm-<tag>`, `None` for the
    /// system compiler.
    pub fn version_tag(self) -> Option<&'static str> {
        match self {
            Self::No => None,
            other => Some(other.as_str()),
        }
    }
}

/// Resolved values of every build option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Build intent
    pub target: TargetMode,
    /// Optimization goal
    pub optimize: OptimizeMode,
    /// Requested architecture, checked against the supported set by the resolver
    pub arch: String,
    /// Add debugging symbols to release/release_debug builds
    pub debug_symbols: bool,
    /// Create a separate file containing debugging symbols
    pub separate_debug_symbols: bool,
    /// Undefined behavior sanitizer
    pub use_ubsan: bool,
    /// Address sanitizer
    pub use_asan: bool,
    /// Thread sanitizer
    pub use_tsan: bool,
    /// Instrumentation for code coverage
    pub use_coverage: bool,
    /// Requested LTO mode, normalized by the resolver
    pub lto: LtoMode,
    /// osxcross SDK identifier, e.g. `darwin16`
    pub osxcross_sdk: String,
    /// Explicit macOS SDK path, detected with xcrun when unset
    pub macos_sdk_path: Option<PathBuf>,
    /// Explicit Vulkan SDK path, searched under `~/VulkanSDK` when unset
    pub vulkan_sdk_path: Option<PathBuf>,
    /// Alternate clang distribution for native builds
    pub macports_clang: MacportsClang,
    /// OpenGL ES 3 backend
    pub opengl3: bool,
    /// Vulkan backend (through MoltenVK)
    pub vulkan: bool,
    /// Load Vulkan at runtime through volk instead of linking MoltenVK
    pub use_volk: bool,
    /// Build the bundled libtheora
    pub builtin_libtheora: bool,
}

impl BuildOptions {
    /// Whether any of the three sanitizers is enabled
    pub fn any_sanitizer(&self) -> bool {
        self.use_ubsan || self.use_asan || self.use_tsan
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            target: TargetMode::Debug,
            optimize: OptimizeMode::Speed,
            arch: Architecture::host()
                .unwrap_or(Architecture::X86_64)
                .as_str()
                .to_string(),
            debug_symbols: true,
            separate_debug_symbols: false,
            use_ubsan: false,
            use_asan: false,
            use_tsan: false,
            use_coverage: false,
            lto: LtoMode::Auto,
            osxcross_sdk: "darwin16".to_string(),
            macos_sdk_path: None,
            vulkan_sdk_path: None,
            macports_clang: MacportsClang::No,
            opengl3: true,
            vulkan: true,
            use_volk: false,
            builtin_libtheora: true,
        }
    }
}
