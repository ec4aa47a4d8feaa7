//! Compiler, linker and preprocessor flag composition
//!
//! The composer emits an ordered [`FlagPlan`]: a list of append/prepend
//! mutations on named lists. Target-mode base flags are prepended so they end
//! up in front of anything the build driver already has; every other group is
//! appended afterwards, in this order:
//!
//! 1. `-arch`/`-mmacosx-version-min` for assembler, compiler and linker
//! 2. `-fobjc-arc`
//! 3. `-isysroot` for native builds
//! 4. LTO
//! 5. sanitizers
//! 6. coverage
//! 7. platform defines, frameworks and libraries, then the OpenGL and Vulkan
//!    blocks when enabled
//!
//! Order matters: compilers apply flags left to right and the last `-O` wins.

use crate::arch::Architecture;
use crate::error::{ResolveError, ResolveResult};
use crate::host::Host;
use crate::options::{BuildOptions, LtoMode, OptimizeMode, TargetMode};
use crate::sdk::{MOLTENVK_LIB, locate_moltenvk, moltenvk_dir};
use crate::sink::{BuildEnvironment, ConfigVar, EnvironmentSink};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Binary suffix marker for sanitizer builds
pub const SANITIZER_SUFFIX: &str = ".san";

/// Define added once when any sanitizer is enabled
pub const SANITIZERS_ENABLED: &str = "SANITIZERS_ENABLED";

const UBSAN_CC_FLAGS: &[&str] = &[
    "-fsanitize=undefined,shift,shift-exponent,integer-divide-by-zero,unreachable,vla-bound,null,return,signed-integer-overflow,bounds,float-divide-by-zero,float-cast-overflow,nonnull-attribute,returns-nonnull-attribute,bool,enum,vptr,pointer-overflow,builtin",
    "-fsanitize=nullability-return,nullability-arg,function,nullability-assign",
];
const UBSAN_LINK_FLAGS: &[&str] = &["-fsanitize=undefined"];
const ASAN_CC_FLAGS: &[&str] = &["-fsanitize=address,pointer-subtract,pointer-compare"];
const ASAN_LINK_FLAGS: &[&str] = &["-fsanitize=address"];
const TSAN_CC_FLAGS: &[&str] = &["-fsanitize=thread"];
const TSAN_LINK_FLAGS: &[&str] = &["-fsanitize=thread"];

const COVERAGE_FLAGS: &[&str] = &["-ftest-coverage", "-fprofile-arcs"];

const PLATFORM_DEFINES: &[&str] = &[
    "MACOS_ENABLED",
    "UNIX_ENABLED",
    "COREAUDIO_ENABLED",
    "COREMIDI_ENABLED",
];

const PLATFORM_FRAMEWORKS: &[&str] = &[
    "Cocoa",
    "Carbon",
    "AudioUnit",
    "CoreAudio",
    "CoreMIDI",
    "IOKit",
    "ForceFeedback",
    "CoreVideo",
    "AVFoundation",
    "CoreMedia",
];

const PLATFORM_LIBS: &[&str] = &["pthread", "z"];

const RPATH_FLAGS: &[&str] = &[
    "-rpath",
    "@executable_path/../Frameworks",
    "-rpath",
    "@executable_path",
];

const VULKAN_FRAMEWORKS: &[&str] = &["Metal", "QuartzCore", "IOSurface"];

/// How a mutation combines with the existing list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationOp {
    /// After existing values
    Append,
    /// Before existing values
    Prepend,
}

/// One ordered change to a flag list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mutation {
    /// Target list
    pub var: ConfigVar,
    /// Append or prepend
    pub op: MutationOp,
    /// Tokens, kept in this order
    pub values: Vec<String>,
}

/// Ordered mutations produced by the composer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagPlan {
    /// Mutations in emission order
    pub mutations: Vec<Mutation>,
    /// Binary name suffix
    pub suffix: String,
}

impl FlagPlan {
    fn push<S: AsRef<str>>(&mut self, var: ConfigVar, op: MutationOp, values: &[S]) {
        self.mutations.push(Mutation {
            var,
            op,
            values: values.iter().map(|v| v.as_ref().to_string()).collect(),
        });
    }

    /// Append `values` to `var`
    pub fn append<S: AsRef<str>>(&mut self, var: ConfigVar, values: &[S]) {
        self.push(var, MutationOp::Append, values);
    }

    /// Prepend `values` to `var`
    pub fn prepend<S: AsRef<str>>(&mut self, var: ConfigVar, values: &[S]) {
        self.push(var, MutationOp::Prepend, values);
    }

    /// Replay the plan into `sink`
    pub fn apply(&self, sink: &mut dyn EnvironmentSink) {
        for mutation in &self.mutations {
            match mutation.op {
                MutationOp::Append => sink.append(mutation.var, &mutation.values),
                MutationOp::Prepend => sink.prepend(mutation.var, &mutation.values),
            }
        }
        if !self.suffix.is_empty() {
            sink.add_suffix(&self.suffix);
        }
    }

    /// Fold the plan onto empty lists
    pub fn flag_set(&self) -> FlagSet {
        let mut env = BuildEnvironment::new();
        self.apply(&mut env);
        FlagSet {
            cc_flags: env.get(ConfigVar::CcFlags).to_vec(),
            link_flags: env.get(ConfigVar::LinkFlags).to_vec(),
            as_flags: env.get(ConfigVar::AsFlags).to_vec(),
            defines: env.get(ConfigVar::CppDefines).to_vec(),
            include_paths: env.get(ConfigVar::CppPath).to_vec(),
            libs: env.get(ConfigVar::Libs).to_vec(),
        }
    }
}

/// Final flag lists of a resolution run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagSet {
    /// Compiler flags
    pub cc_flags: Vec<String>,
    /// Linker flags
    pub link_flags: Vec<String>,
    /// Assembler flags
    pub as_flags: Vec<String>,
    /// Preprocessor defines
    pub defines: Vec<String>,
    /// Include search paths
    pub include_paths: Vec<String>,
    /// Libraries
    pub libs: Vec<String>,
}

/// Builds the [`FlagPlan`] for one resolved build variant.
#[derive(Debug, Clone)]
pub struct FlagComposer<'a> {
    options: &'a BuildOptions,
    arch: Architecture,
    lto: LtoMode,
    sysroot: Option<PathBuf>,
}

impl<'a> FlagComposer<'a> {
    /// Composer for validated options. `auto` LTO is normalized here.
    pub fn new(options: &'a BuildOptions, arch: Architecture) -> Self {
        Self {
            options,
            arch,
            lto: options.lto.normalize(),
            sysroot: None,
        }
    }

    /// macOS SDK to pass as `-isysroot` (native builds only)
    #[must_use]
    pub fn with_sysroot(mut self, sysroot: Option<PathBuf>) -> Self {
        self.sysroot = sysroot;
        self
    }

    /// LTO mode after normalization
    pub fn lto(&self) -> LtoMode {
        self.lto
    }

    /// Compose the full plan. Fails only when an enabled subsystem needs an
    /// external library that cannot be found.
    pub fn compose(&self, host: &dyn Host) -> ResolveResult<FlagPlan> {
        let mut plan = FlagPlan::default();

        self.target_flags(&mut plan);
        self.arch_flags(&mut plan);
        plan.append(ConfigVar::CcFlags, &["-fobjc-arc"]);
        if let Some(sysroot) = &self.sysroot {
            let sysroot = sysroot.to_string_lossy().into_owned();
            plan.append(ConfigVar::CcFlags, &["-isysroot", sysroot.as_str()]);
            plan.append(ConfigVar::LinkFlags, &["-isysroot", sysroot.as_str()]);
        }
        self.lto_flags(&mut plan);
        self.sanitizer_flags(&mut plan);
        if self.options.use_coverage {
            plan.append(ConfigVar::CcFlags, COVERAGE_FLAGS);
            plan.append(ConfigVar::LinkFlags, COVERAGE_FLAGS);
        }
        self.platform_flags(&mut plan, host)?;

        debug!("Composed {} flag mutations", plan.mutations.len());
        Ok(plan)
    }

    fn target_flags(&self, plan: &mut FlagPlan) {
        let options = self.options;
        match options.target {
            TargetMode::Release => {
                match options.optimize {
                    OptimizeMode::Speed => plan.prepend(
                        ConfigVar::CcFlags,
                        &["-O3", "-fomit-frame-pointer", "-ftree-vectorize"],
                    ),
                    OptimizeMode::Size => plan.prepend(ConfigVar::CcFlags, &["-Os", "-ftree-vectorize"]),
                }
                if self.arch != Architecture::Arm64 {
                    plan.prepend(ConfigVar::CcFlags, &["-msse2"]);
                }
                if options.debug_symbols {
                    plan.prepend(ConfigVar::CcFlags, &["-g2"]);
                }
            }
            TargetMode::ReleaseDebug => {
                match options.optimize {
                    OptimizeMode::Speed => plan.prepend(ConfigVar::CcFlags, &["-O2"]),
                    OptimizeMode::Size => plan.prepend(ConfigVar::CcFlags, &["-Os"]),
                }
                if options.debug_symbols {
                    plan.prepend(ConfigVar::CcFlags, &["-g2"]);
                }
            }
            TargetMode::Debug => {
                plan.prepend(ConfigVar::CcFlags, &["-g3"]);
                plan.prepend(ConfigVar::LinkFlags, &["-Xlinker", "-no_deduplicate"]);
            }
        }
    }

    fn arch_flags(&self, plan: &mut FlagPlan) {
        let min_version = self.arch.macos_min_version();
        info!("Building for macOS {}+.", min_version);

        let version_flag = format!("-mmacosx-version-min={min_version}");
        let flags = ["-arch", self.arch.as_str(), version_flag.as_str()];
        plan.append(ConfigVar::AsFlags, &flags);
        plan.append(ConfigVar::CcFlags, &flags);
        plan.append(ConfigVar::LinkFlags, &flags);
    }

    fn lto_flags(&self, plan: &mut FlagPlan) {
        let flag = match self.lto {
            LtoMode::None | LtoMode::Auto => return,
            LtoMode::Thin => "-flto=thin",
            LtoMode::Full => "-flto",
        };
        plan.append(ConfigVar::CcFlags, &[flag]);
        plan.append(ConfigVar::LinkFlags, &[flag]);
    }

    fn sanitizer_flags(&self, plan: &mut FlagPlan) {
        let options = self.options;
        if !options.any_sanitizer() {
            return;
        }

        plan.suffix.push_str(SANITIZER_SUFFIX);
        plan.append(ConfigVar::CppDefines, &[SANITIZERS_ENABLED]);

        if options.use_ubsan {
            plan.append(ConfigVar::CcFlags, &UBSAN_CC_FLAGS[..1]);
            plan.append(ConfigVar::LinkFlags, UBSAN_LINK_FLAGS);
            plan.append(ConfigVar::CcFlags, &UBSAN_CC_FLAGS[1..]);
        }
        if options.use_asan {
            plan.append(ConfigVar::CcFlags, ASAN_CC_FLAGS);
            plan.append(ConfigVar::LinkFlags, ASAN_LINK_FLAGS);
        }
        if options.use_tsan {
            plan.append(ConfigVar::CcFlags, TSAN_CC_FLAGS);
            plan.append(ConfigVar::LinkFlags, TSAN_LINK_FLAGS);
        }
    }

    fn platform_flags(&self, plan: &mut FlagPlan, host: &dyn Host) -> ResolveResult<()> {
        let options = self.options;

        plan.prepend(ConfigVar::CppPath, &["#platform/macos"]);
        plan.append(ConfigVar::CppDefines, PLATFORM_DEFINES);
        plan.append(ConfigVar::LinkFlags, &frameworks(PLATFORM_FRAMEWORKS));
        plan.append(ConfigVar::Libs, PLATFORM_LIBS);

        if options.opengl3 {
            plan.append(ConfigVar::CppDefines, &["GLES_ENABLED", "GLES3_ENABLED"]);
            plan.append(ConfigVar::CcFlags, &["-Wno-deprecated-declarations"]);
            plan.append(ConfigVar::LinkFlags, &frameworks(&["OpenGL"]));
        }

        plan.append(ConfigVar::LinkFlags, RPATH_FLAGS);

        if options.vulkan {
            plan.append(ConfigVar::CppDefines, &["VULKAN_ENABLED"]);
            plan.append(ConfigVar::LinkFlags, &frameworks(VULKAN_FRAMEWORKS));
            if !options.use_volk {
                plan.append(ConfigVar::LinkFlags, &["-lMoltenVK"]);
                let dir = self.moltenvk_lib_dir(host)?;
                plan.append(ConfigVar::LinkFlags, &[format!("-L{}", dir.display())]);
            }
        }

        Ok(())
    }

    /// MoltenVK from `vulkan_sdk_path` if it has one, else the newest SDK in
    /// `~/VulkanSDK`.
    fn moltenvk_lib_dir(&self, host: &dyn Host) -> ResolveResult<PathBuf> {
        if let Some(sdk) = &self.options.vulkan_sdk_path {
            let dir = moltenvk_dir(&host.expand_user(sdk));
            if has_moltenvk(&dir) {
                debug!("Using MoltenVK from vulkan_sdk_path: {:?}", dir);
                return Ok(dir);
            }
            warn!("No {} in {:?}, searching installed SDKs", MOLTENVK_LIB, dir);
        }

        host.home_dir()
            .and_then(|home| locate_moltenvk(&home))
            .filter(|dir| has_moltenvk(dir))
            .ok_or(ResolveError::MoltenVkNotFound)
    }
}

fn has_moltenvk(dir: &Path) -> bool {
    dir.join(MOLTENVK_LIB).is_file()
}

fn frameworks(names: &[&str]) -> Vec<String> {
    names
        .iter()
        .flat_map(|name| ["-framework".to_string(), (*name).to_string()])
        .collect()
}
