//! Compiler toolchain selection
//!
//! Three toolchains are possible:
//! - the system clang (`clang`/`clang++`, other tools left to the build driver)
//! - a MacPorts clang under `<prefix>/libexec/llvm-<tag>/bin`
//! - an osxcross toolchain under `$OSXCROSS_ROOT/target/bin`, with binaries
//!   prefixed by the target triple, e.g. `arm64-apple-darwin16-cc`
//!
//! osxcross ships no ccache wrappers, so when `CCACHE` is set its command is
//! put in front of the cross compilers.

use crate::arch::Architecture;
use crate::host::{CCACHE, Host, MACPORTS_PREFIX, OSXCROSS_ROOT};
use crate::options::MacportsClang;
use crate::sink::{EnvironmentSink, Tool};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// MacPorts install prefix when `MACPORTS_PREFIX` is unset.
pub const DEFAULT_MACPORTS_PREFIX: &str = "/opt/local";

/// Which toolchain was chosen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolchainKind {
    /// System clang
    Native,
    /// Clang from MacPorts
    Macports {
        /// MacPorts install prefix
        prefix: String,
        /// llvm version tag
        version: String,
    },
    /// osxcross cross toolchain
    Osxcross {
        /// osxcross install root
        root: String,
        /// Binary name prefix including the trailing `-`
        prefix: String,
    },
}

/// Resolved toolchain commands.
///
/// `None` leaves the build driver's default in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainPaths {
    /// How the commands were chosen
    pub kind: ToolchainKind,
    /// C compiler command
    pub cc: String,
    /// C++ compiler command
    pub cxx: String,
    /// Archiver
    pub ar: Option<String>,
    /// Archive indexer
    pub ranlib: Option<String>,
    /// Assembler
    pub assembler: Option<String>,
}

impl ToolchainPaths {
    /// Whether this is a cross-compilation toolchain
    pub fn is_cross(&self) -> bool {
        matches!(self.kind, ToolchainKind::Osxcross { .. })
    }

    /// All configured commands, compilers first
    pub fn commands(&self) -> Vec<(Tool, &str)> {
        let mut commands = vec![(Tool::Cc, self.cc.as_str()), (Tool::Cxx, self.cxx.as_str())];
        let optional = [
            (Tool::Ar, &self.ar),
            (Tool::Ranlib, &self.ranlib),
            (Tool::As, &self.assembler),
        ];
        commands.extend(
            optional
                .into_iter()
                .filter_map(|(tool, cmd)| cmd.as_deref().map(|c| (tool, c))),
        );
        commands
    }

    /// Write the commands into `sink`
    pub fn apply(&self, sink: &mut dyn EnvironmentSink) {
        for (tool, command) in self.commands() {
            sink.set_tool(tool, command);
        }
    }
}

/// Chooses the toolchain from options and host environment.
#[derive(Debug, Clone)]
pub struct ToolchainSelector<'a> {
    arch: Architecture,
    macports_clang: MacportsClang,
    osxcross_sdk: &'a str,
}

impl<'a> ToolchainSelector<'a> {
    /// Selector for a validated architecture
    pub fn new(arch: Architecture, macports_clang: MacportsClang, osxcross_sdk: &'a str) -> Self {
        Self {
            arch,
            macports_clang,
            osxcross_sdk,
        }
    }

    /// Pick the toolchain for `host`. The presence of `OSXCROSS_ROOT` (even
    /// empty) selects osxcross.
    pub fn select(&self, host: &dyn Host) -> ToolchainPaths {
        match host.var(OSXCROSS_ROOT) {
            Some(root) => self.osxcross(&root, host.var(CCACHE)),
            None => match self.macports_clang.version_tag() {
                Some(tag) => {
                    let prefix = host
                        .var(MACPORTS_PREFIX)
                        .unwrap_or_else(|| DEFAULT_MACPORTS_PREFIX.to_string());
                    Self::macports(&prefix, tag)
                }
                None => Self::native(),
            },
        }
    }

    fn native() -> ToolchainPaths {
        debug!("Using system clang");
        ToolchainPaths {
            kind: ToolchainKind::Native,
            cc: "clang".to_string(),
            cxx: "clang++".to_string(),
            ar: None,
            ranlib: None,
            assembler: None,
        }
    }

    fn macports(prefix: &str, tag: &str) -> ToolchainPaths {
        let bin = format!("{prefix}/libexec/llvm-{tag}/bin/");
        info!("Using MacPorts clang from {}", bin);
        ToolchainPaths {
            kind: ToolchainKind::Macports {
                prefix: prefix.to_string(),
                version: tag.to_string(),
            },
            cc: format!("{bin}clang"),
            cxx: format!("{bin}clang++"),
            ar: Some(format!("{bin}llvm-ar")),
            ranlib: Some(format!("{bin}llvm-ranlib")),
            assembler: Some(format!("{bin}llvm-as")),
        }
    }

    fn osxcross(&self, root: &str, ccache: Option<String>) -> ToolchainPaths {
        let prefix = format!("{}{}-", self.arch.triple_prefix(), self.osxcross_sdk);
        let basecmd = format!("{root}/target/bin/{prefix}");
        info!("Using osxcross toolchain {}*", basecmd);

        let wrap = |cmd: String| match &ccache {
            Some(ccache) => format!("{ccache} {cmd}"),
            None => cmd,
        };

        ToolchainPaths {
            kind: ToolchainKind::Osxcross {
                root: root.to_string(),
                prefix,
            },
            cc: wrap(format!("{basecmd}cc")),
            cxx: wrap(format!("{basecmd}c++")),
            ar: Some(format!("{basecmd}ar")),
            ranlib: Some(format!("{basecmd}ranlib")),
            assembler: Some(format!("{basecmd}as")),
        }
    }
}
