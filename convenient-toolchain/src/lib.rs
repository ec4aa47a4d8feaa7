//! Toolchain configuration resolver for macOS builds.
//!
//! Turns a declarative set of build options (target mode, optimization goal,
//! CPU architecture, sanitizers, LTO, cross-compilation) into a concrete
//! toolchain configuration: compiler and linker commands plus ordered compile
//! flags, link flags, defines and library lists.
//!
//! # Pipeline
//!
//! 1. [`OptionRegistry`] validates raw `name=value` strings into [`BuildOptions`]
//! 2. [`ConfigurationResolver`] checks the architecture, picks a toolchain with
//!    [`ToolchainSelector`], finds the macOS SDK and composes flags with
//!    [`FlagComposer`]
//! 3. The [`ResolvedConfiguration`] is written into an [`EnvironmentSink`]
//!
//! The Vulkan backend links MoltenVK, which [`SdkLocator`] finds by scanning
//! `~/VulkanSDK/<version>` directories.
//!
//! # Example
//!
//! ```
//! use convenient_toolchain::{
//!     BuildEnvironment, BuildOptions, ConfigVar, ConfigurationResolver, StaticHost, TargetMode,
//! };
//!
//! let host = StaticHost::new().with_var("OSXCROSS_ROOT", "/opt/osxcross");
//! let options = BuildOptions {
//!     target: TargetMode::Release,
//!     arch: "arm64".to_string(),
//!     vulkan: false,
//!     ..Default::default()
//! };
//!
//! let config = ConfigurationResolver::new(&host).resolve(&options).unwrap();
//! assert_eq!(config.toolchain.cc, "/opt/osxcross/target/bin/arm64-apple-darwin16-cc");
//!
//! let mut env = BuildEnvironment::new();
//! config.apply(&mut env);
//! assert!(env.get(ConfigVar::CcFlags).contains(&"-fobjc-arc".to_string()));
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(unused_results)]

pub mod arch;
pub mod error;
pub mod flags;
pub mod host;
pub mod options;
pub mod registry;
pub mod resolver;
pub mod sdk;
pub mod sink;
pub mod toolchain;
pub mod version;

pub use arch::{Architecture, SUPPORTED_ARCHITECTURES};
pub use error::{OptionError, OptionResult, ResolveError, ResolveResult};
pub use flags::{FlagComposer, FlagPlan, FlagSet, Mutation, MutationOp};
pub use host::{Host, StaticHost, SystemHost};
pub use options::{BuildOptions, LtoMode, MacportsClang, OptimizeMode, TargetMode};
pub use registry::{OptionDecl, OptionKind, OptionRegistry, load_options_file, parse_assignment};
pub use resolver::{ConfigurationResolver, ResolvedConfiguration};
pub use sdk::{SdkCandidate, SdkLocator};
pub use sink::{BuildEnvironment, ConfigVar, EnvironmentSink, Tool};
pub use toolchain::{ToolchainKind, ToolchainPaths, ToolchainSelector};
pub use version::VersionTuple;
