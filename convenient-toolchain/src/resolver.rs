//! Build configuration resolution
//!
//! Runs the resolution steps in order: architecture validation, toolchain
//! selection, macOS SDK lookup for native builds, flag composition. The result
//! is a value; nothing is written anywhere until
//! [`ResolvedConfiguration::apply`] is called.

use crate::arch::{self, Architecture, SUPPORTED_ARCHITECTURES};
use crate::error::{ResolveError, ResolveResult};
use crate::flags::{FlagComposer, FlagPlan, FlagSet};
use crate::host::Host;
use crate::options::{BuildOptions, LtoMode};
use crate::sink::EnvironmentSink;
use crate::toolchain::{ToolchainPaths, ToolchainSelector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// Flag name telling downstream steps that the osxcross toolchain is active
pub const FLAG_OSXCROSS: &str = "osxcross";

/// Flag name enabling the GCC-style x86 optimizations of the bundled libtheora
pub const FLAG_LIBTHEORA_X86_OPT: &str = "x86_libtheora_opt_gcc";

/// Apple SDK name passed to xcrun for native builds
pub const MACOS_SDK: &str = "macosx";

/// Everything a resolution run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedConfiguration {
    /// Validated architecture
    pub architecture: Architecture,
    /// LTO mode after normalization, never `auto`
    pub lto: LtoMode,
    /// Whether the cross toolchain is active
    pub cross_compile: bool,
    /// macOS SDK used as sysroot (native builds)
    pub sysroot: Option<PathBuf>,
    /// Toolchain commands
    pub toolchain: ToolchainPaths,
    /// Ordered flag mutations
    pub plan: FlagPlan,
    /// Named booleans for downstream build steps
    pub flags: BTreeMap<String, bool>,
}

impl ResolvedConfiguration {
    /// Flag lists folded onto empty lists
    pub fn flag_set(&self) -> FlagSet {
        self.plan.flag_set()
    }

    /// Binary name suffix
    pub fn suffix(&self) -> &str {
        &self.plan.suffix
    }

    /// Write the configuration into `sink`
    pub fn apply(&self, sink: &mut dyn EnvironmentSink) {
        for (name, value) in &self.flags {
            sink.set_flag(name, *value);
        }
        self.plan.apply(sink);
        self.toolchain.apply(sink);
    }
}

/// Resolves [`BuildOptions`] against a [`Host`].
pub struct ConfigurationResolver<'h> {
    host: &'h dyn Host,
}

impl<'h> ConfigurationResolver<'h> {
    /// Resolver reading environment and SDKs from `host`
    pub fn new(host: &'h dyn Host) -> Self {
        Self { host }
    }

    /// Resolve `options` into a configuration.
    ///
    /// Fails on an unsupported architecture before anything else is looked at,
    /// and on a required SDK that cannot be found.
    pub fn resolve(&self, options: &BuildOptions) -> ResolveResult<ResolvedConfiguration> {
        arch::validate(&options.arch, SUPPORTED_ARCHITECTURES)?;
        let architecture: Architecture = options.arch.parse()?;

        let toolchain =
            ToolchainSelector::new(architecture, options.macports_clang, &options.osxcross_sdk).select(self.host);
        let cross_compile = toolchain.is_cross();

        let sysroot = if cross_compile {
            None
        } else {
            Some(self.macos_sdk_path(options)?)
        };

        let composer = FlagComposer::new(options, architecture).with_sysroot(sysroot.clone());
        let lto = composer.lto();
        let plan = composer.compose(self.host)?;

        let mut flags = BTreeMap::new();
        let _ = flags.insert(FLAG_OSXCROSS.to_string(), cross_compile);
        if options.builtin_libtheora && architecture == Architecture::X86_64 {
            let _ = flags.insert(FLAG_LIBTHEORA_X86_OPT.to_string(), true);
        }

        info!(
            "Resolved {} {} configuration ({} toolchain, lto={})",
            architecture,
            options.target,
            if cross_compile { "osxcross" } else { "native" },
            lto
        );

        Ok(ResolvedConfiguration {
            architecture,
            lto,
            cross_compile,
            sysroot,
            toolchain,
            plan,
            flags,
        })
    }

    /// Explicit `macos_sdk_path`, or whatever xcrun reports.
    fn macos_sdk_path(&self, options: &BuildOptions) -> ResolveResult<PathBuf> {
        if let Some(path) = &options.macos_sdk_path {
            return Ok(self.host.expand_user(path));
        }

        let path = self
            .host
            .sdk_path(MACOS_SDK)
            .ok_or_else(|| ResolveError::MacosSdkNotFound {
                sdk: MACOS_SDK.to_string(),
            })?;
        debug!("Detected macOS SDK at {:?}", path);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{OSXCROSS_ROOT, StaticHost};
    use crate::options::{OptimizeMode, TargetMode};
    use crate::sink::{BuildEnvironment, ConfigVar, Tool};
    use tracing_test::traced_test;

    fn options(arch: &str) -> BuildOptions {
        BuildOptions {
            target: TargetMode::Release,
            optimize: OptimizeMode::Speed,
            arch: arch.to_string(),
            opengl3: false,
            vulkan: false,
            ..Default::default()
        }
    }

    fn native_host() -> StaticHost {
        StaticHost::new().with_sdk(MACOS_SDK, "/Library/Developer/MacOSX.sdk")
    }

    #[test]
    fn test_unsupported_architecture() {
        let host = native_host();
        let err = ConfigurationResolver::new(&host)
            .resolve(&options("armv7"))
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnsupportedArchitecture { ref requested, .. } if requested == "armv7"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_validation_precedes_discovery() {
        // No SDK anywhere, but the architecture error must win.
        let host = StaticHost::new();
        let opts = BuildOptions {
            vulkan: true,
            ..options("ppc")
        };
        let err = ConfigurationResolver::new(&host).resolve(&opts).unwrap_err();
        assert!(!err.is_discovery_failure());
    }

    #[traced_test]
    #[test]
    fn test_native_resolution() {
        let host = native_host();
        let config = ConfigurationResolver::new(&host).resolve(&options("arm64")).unwrap();

        assert!(!config.cross_compile);
        assert_eq!(config.flags.get(FLAG_OSXCROSS), Some(&false));
        assert_eq!(config.toolchain.cc, "clang");
        assert_eq!(config.sysroot, Some(PathBuf::from("/Library/Developer/MacOSX.sdk")));
        assert_eq!(config.lto, LtoMode::None);
        assert!(config.flag_set().cc_flags.contains(&"-isysroot".to_string()));
        assert!(logs_contain("Building for macOS 11.0+."));
    }

    #[test]
    fn test_native_without_sdk_fails() {
        let host = StaticHost::new();
        let err = ConfigurationResolver::new(&host)
            .resolve(&options("arm64"))
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::MacosSdkNotFound {
                sdk: MACOS_SDK.to_string()
            }
        );
        assert_eq!(err.exit_code(), 255);
    }

    #[test]
    fn test_macos_sdk_override() {
        let host = StaticHost::new().with_home("/Users/dev");
        let opts = BuildOptions {
            macos_sdk_path: Some(PathBuf::from("~/SDKs/MacOSX14.sdk")),
            ..options("x86_64")
        };
        let config = ConfigurationResolver::new(&host).resolve(&opts).unwrap();
        assert_eq!(config.sysroot, Some(PathBuf::from("/Users/dev/SDKs/MacOSX14.sdk")));
        assert_eq!(config.flags.get(FLAG_LIBTHEORA_X86_OPT), Some(&true));
    }

    #[test]
    fn test_cross_resolution_skips_sysroot() {
        let host = StaticHost::new().with_var(OSXCROSS_ROOT, "/opt/osxcross");
        let config = ConfigurationResolver::new(&host).resolve(&options("arm64")).unwrap();

        assert!(config.cross_compile);
        assert_eq!(config.sysroot, None);
        assert_eq!(config.toolchain.cc, "/opt/osxcross/target/bin/arm64-apple-darwin16-cc");
        assert!(!config.flag_set().cc_flags.contains(&"-isysroot".to_string()));
        assert_eq!(config.flags.get(FLAG_LIBTHEORA_X86_OPT), None);
    }

    #[test]
    fn test_apply_to_sink() {
        let host = StaticHost::new().with_var(OSXCROSS_ROOT, "/osx");
        let opts = BuildOptions {
            use_asan: true,
            ..options("x86_64")
        };
        let config = ConfigurationResolver::new(&host).resolve(&opts).unwrap();

        let mut env = BuildEnvironment::new();
        env.append(ConfigVar::CcFlags, &["-Werror".to_string()]);
        config.apply(&mut env);

        let cc_flags = env.get(ConfigVar::CcFlags);
        assert_eq!(cc_flags[0], "-g2");
        assert!(cc_flags.iter().position(|f| f == "-Werror") < cc_flags.iter().position(|f| f == "-arch"));
        assert_eq!(env.flag(FLAG_OSXCROSS), Some(true));
        assert_eq!(env.suffix(), ".san");
        assert_eq!(env.tool(Tool::Ar), Some("/osx/target/bin/x86_64-apple-darwin16-ar"));
    }
}
