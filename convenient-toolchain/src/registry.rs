//! Option declarations and boundary validation
//!
//! The registry knows every option's name, help text, default and kind. It
//! turns raw `name=value` strings (from the command line or a YAML options
//! file) into a [`BuildOptions`], rejecting anything it does not recognise.

use crate::arch::Architecture;
use crate::error::{OptionError, OptionResult};
use crate::options::{BuildOptions, LtoMode, MacportsClang, OptimizeMode, TargetMode};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Value kind of a declared option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// yes/no style toggle
    Bool,
    /// One of a fixed set of values
    Enum(&'static [&'static str]),
    /// Free-form string; an empty value means unset
    Str,
}

/// A declared option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDecl {
    /// Option name
    pub name: &'static str,
    /// One-line description
    pub help: &'static str,
    /// Default value in option syntax
    pub default: String,
    /// Value kind
    pub kind: OptionKind,
    /// Alternative spellings accepted for this option
    pub aliases: &'static [&'static str],
}

impl OptionDecl {
    fn new(name: &'static str, help: &'static str, default: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name,
            help,
            default: default.into(),
            kind,
            aliases: &[],
        }
    }

    fn with_aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    /// Whether `name` is this option's name or one of its aliases
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.contains(&name)
    }

    fn boolean(name: &'static str, help: &'static str, default: bool) -> Self {
        Self::new(name, help, if default { "yes" } else { "no" }, OptionKind::Bool)
    }
}

/// Parsed option value
#[derive(Debug, Clone, PartialEq, Eq)]
enum OptionValue {
    Bool(bool),
    Text(String),
}

/// Registry of every option understood by the macOS resolver.
#[derive(Debug, Clone)]
pub struct OptionRegistry {
    decls: Vec<OptionDecl>,
}

impl Default for OptionRegistry {
    fn default() -> Self {
        Self::macos()
    }
}

impl OptionRegistry {
    /// Declarations for macOS builds
    pub fn macos() -> Self {
        let host_arch = Architecture::host().unwrap_or(Architecture::X86_64);
        let decls = vec![
            OptionDecl::new("target", "Compilation target", "debug", OptionKind::Enum(TargetMode::VALUES)),
            OptionDecl::new(
                "optimize",
                "Optimization type",
                "speed",
                OptionKind::Enum(OptimizeMode::VALUES),
            ),
            OptionDecl::new("arch", "CPU architecture", host_arch.as_str(), OptionKind::Str),
            OptionDecl::new("lto", "Link-time optimization", "auto", OptionKind::Enum(LtoMode::VALUES)),
            OptionDecl::new("osxcross_sdk", "OSXCross SDK version", "darwin16", OptionKind::Str),
            OptionDecl::new("macos_sdk_path", "Path to the macOS SDK", "", OptionKind::Str)
                .with_aliases(&["MACOS_SDK_PATH"]),
            OptionDecl::new("vulkan_sdk_path", "Path to the Vulkan SDK", "", OptionKind::Str),
            OptionDecl::new(
                "macports_clang",
                "Build using Clang from MacPorts",
                "no",
                OptionKind::Enum(MacportsClang::VALUES),
            ),
            OptionDecl::boolean(
                "debug_symbols",
                "Add debugging symbols to release/release_debug builds",
                true,
            ),
            OptionDecl::boolean(
                "separate_debug_symbols",
                "Create a separate file containing debugging symbols",
                false,
            ),
            OptionDecl::boolean("use_ubsan", "Use LLVM compiler undefined behavior sanitizer (UBSAN)", false),
            OptionDecl::boolean("use_asan", "Use LLVM compiler address sanitizer (ASAN)", false),
            OptionDecl::boolean("use_tsan", "Use LLVM compiler thread sanitizer (TSAN)", false),
            OptionDecl::boolean(
                "use_coverage",
                "Use instrumentation codes in the binary (e.g. for code coverage)",
                false,
            ),
            OptionDecl::boolean("opengl3", "Enable the OpenGL/GLES3 rendering driver", true),
            OptionDecl::boolean("vulkan", "Enable the Vulkan rendering driver", true),
            OptionDecl::boolean("use_volk", "Use the volk library to load the Vulkan loader dynamically", false),
            OptionDecl::boolean("builtin_libtheora", "Use the built-in libtheora library", true),
        ];
        Self { decls }
    }

    /// All declarations in registration order
    pub fn declarations(&self) -> &[OptionDecl] {
        &self.decls
    }

    /// Look up a declaration by name or alias
    pub fn get(&self, name: &str) -> Option<&OptionDecl> {
        self.decls.iter().find(|d| d.answers_to(name))
    }

    /// Validate `assignments` and build the typed options. Unassigned options
    /// take their declared default. When both the name and an alias are
    /// assigned, the name wins.
    pub fn build_options(&self, assignments: &HashMap<String, String>) -> OptionResult<BuildOptions> {
        if let Some(unknown) = assignments.keys().find(|k| self.get(k).is_none()) {
            return Err(OptionError::Unknown(unknown.clone()));
        }

        let mut values: HashMap<&str, OptionValue> = HashMap::new();
        for decl in &self.decls {
            let raw = std::iter::once(decl.name)
                .chain(decl.aliases.iter().copied())
                .find_map(|name| assignments.get(name))
                .unwrap_or(&decl.default);
            let value = parse_value(decl, raw)?;
            let _ = values.insert(decl.name, value);
        }

        let flag = |name: &str| matches!(values.get(name), Some(OptionValue::Bool(true)));
        let text = |name: &str| match values.get(name) {
            Some(OptionValue::Text(s)) => s.clone(),
            _ => String::new(),
        };
        let path = |name: &str| {
            let s = text(name);
            (!s.is_empty()).then(|| PathBuf::from(s))
        };

        // Enum values were checked by parse_value, so these lookups succeed.
        let options = BuildOptions {
            target: TargetMode::from_value(&text("target")).unwrap_or(TargetMode::Debug),
            optimize: OptimizeMode::from_value(&text("optimize")).unwrap_or(OptimizeMode::Speed),
            arch: text("arch"),
            debug_symbols: flag("debug_symbols"),
            separate_debug_symbols: flag("separate_debug_symbols"),
            use_ubsan: flag("use_ubsan"),
            use_asan: flag("use_asan"),
            use_tsan: flag("use_tsan"),
            use_coverage: flag("use_coverage"),
            lto: LtoMode::from_value(&text("lto")).unwrap_or(LtoMode::Auto),
            osxcross_sdk: text("osxcross_sdk"),
            macos_sdk_path: path("macos_sdk_path"),
            vulkan_sdk_path: path("vulkan_sdk_path"),
            macports_clang: MacportsClang::from_value(&text("macports_clang")).unwrap_or(MacportsClang::No),
            opengl3: flag("opengl3"),
            vulkan: flag("vulkan"),
            use_volk: flag("use_volk"),
            builtin_libtheora: flag("builtin_libtheora"),
        };

        debug!("Validated build options: {:?}", options);
        Ok(options)
    }
}

fn parse_value(decl: &OptionDecl, raw: &str) -> OptionResult<OptionValue> {
    match decl.kind {
        OptionKind::Bool => parse_bool(raw)
            .map(OptionValue::Bool)
            .ok_or_else(|| OptionError::InvalidBool {
                name: decl.name.to_string(),
                value: raw.to_string(),
            }),
        OptionKind::Enum(allowed) => {
            if allowed.contains(&raw) {
                Ok(OptionValue::Text(raw.to_string()))
            } else {
                Err(OptionError::InvalidChoice {
                    name: decl.name.to_string(),
                    value: raw.to_string(),
                    allowed: allowed.iter().map(|s| (*s).to_string()).collect(),
                })
            }
        }
        OptionKind::Str => Ok(OptionValue::Text(raw.to_string())),
    }
}

/// Parse a boolean option value the way SCons-style option files spell them.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "1" | "on" => Some(true),
        "n" | "no" | "f" | "false" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Split a `key=value` command-line assignment.
pub fn parse_assignment(arg: &str) -> OptionResult<(String, String)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(OptionError::MalformedAssignment(arg.to_string())),
    }
}

/// Load a YAML options file: a mapping of option name to scalar value.
pub fn load_options_file(path: impl AsRef<Path>) -> OptionResult<HashMap<String, String>> {
    let path = path.as_ref();
    info!("Loading options from {:?}", path);

    let content = std::fs::read_to_string(path)
        .map_err(|e| OptionError::Io(path.to_path_buf(), e.to_string()))?;
    parse_options_yaml(&content).map_err(|e| OptionError::Parse(path.to_path_buf(), e))
}

fn parse_options_yaml(content: &str) -> Result<HashMap<String, String>, String> {
    if content.trim().is_empty() {
        return Ok(HashMap::new());
    }

    let raw: BTreeMap<String, serde_yaml::Value> =
        serde_yaml::from_str(content).map_err(|e| e.to_string())?;

    raw.into_iter()
        .map(|(key, value)| {
            let value = match value {
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Null => String::new(),
                _ => return Err(format!("option '{key}' must be a scalar")),
            };
            Ok((key, value))
        })
        .collect()
}
