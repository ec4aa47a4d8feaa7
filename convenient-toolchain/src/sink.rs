//! Environment sink receiving the resolved configuration
//!
//! Resolution output is written as ordered append/prepend mutations on named
//! flag lists, plus tool commands and named booleans. [`BuildEnvironment`] is
//! an in-memory sink; build drivers implement [`EnvironmentSink`] on their own
//! environment type.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Ordered token lists a configuration writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConfigVar {
    /// Compiler flags
    CcFlags,
    /// Linker flags
    LinkFlags,
    /// Assembler flags
    AsFlags,
    /// Preprocessor defines
    CppDefines,
    /// Include search paths
    CppPath,
    /// Libraries to link
    Libs,
}

impl ConfigVar {
    /// Variable name as build drivers know it
    pub fn name(self) -> &'static str {
        match self {
            Self::CcFlags => "CCFLAGS",
            Self::LinkFlags => "LINKFLAGS",
            Self::AsFlags => "ASFLAGS",
            Self::CppDefines => "CPPDEFINES",
            Self::CppPath => "CPPPATH",
            Self::Libs => "LIBS",
        }
    }
}

impl fmt::Display for ConfigVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Toolchain commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tool {
    /// C compiler
    Cc,
    /// C++ compiler
    Cxx,
    /// Archiver
    Ar,
    /// Archive indexer
    Ranlib,
    /// Assembler
    As,
}

impl Tool {
    /// Variable name as build drivers know it
    pub fn name(self) -> &'static str {
        match self {
            Self::Cc => "CC",
            Self::Cxx => "CXX",
            Self::Ar => "AR",
            Self::Ranlib => "RANLIB",
            Self::As => "AS",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Receiver of a resolved configuration.
pub trait EnvironmentSink {
    /// Add `values` after the current contents of `var`
    fn append(&mut self, var: ConfigVar, values: &[String]);

    /// Add `values` before the current contents of `var`, keeping their order
    fn prepend(&mut self, var: ConfigVar, values: &[String]);

    /// Set the command used for `tool`
    fn set_tool(&mut self, tool: Tool, command: &str);

    /// Set a named boolean for downstream build steps
    fn set_flag(&mut self, name: &str, value: bool);

    /// Extend the binary name suffix
    fn add_suffix(&mut self, suffix: &str);
}

/// In-memory [`EnvironmentSink`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildEnvironment {
    vars: BTreeMap<ConfigVar, Vec<String>>,
    tools: BTreeMap<Tool, String>,
    flags: BTreeMap<String, bool>,
    suffix: String,
}

impl BuildEnvironment {
    /// Empty environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents of `var`
    pub fn get(&self, var: ConfigVar) -> &[String] {
        self.vars.get(&var).map(Vec::as_slice).unwrap_or_default()
    }

    /// Command configured for `tool`
    pub fn tool(&self, tool: Tool) -> Option<&str> {
        self.tools.get(&tool).map(String::as_str)
    }

    /// Value of a named boolean
    pub fn flag(&self, name: &str) -> Option<bool> {
        self.flags.get(name).copied()
    }

    /// Accumulated binary suffix
    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl EnvironmentSink for BuildEnvironment {
    fn append(&mut self, var: ConfigVar, values: &[String]) {
        self.vars.entry(var).or_default().extend_from_slice(values);
    }

    fn prepend(&mut self, var: ConfigVar, values: &[String]) {
        let list = self.vars.entry(var).or_default();
        let _ = list.splice(0..0, values.iter().cloned());
    }

    fn set_tool(&mut self, tool: Tool, command: &str) {
        let _ = self.tools.insert(tool, command.to_string());
    }

    fn set_flag(&mut self, name: &str, value: bool) {
        let _ = self.flags.insert(name.to_string(), value);
    }

    fn add_suffix(&mut self, suffix: &str) {
        self.suffix.push_str(suffix);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_append_and_prepend_order() {
        let mut env = BuildEnvironment::new();
        env.append(ConfigVar::CcFlags, &strings(&["-Wall"]));
        env.prepend(ConfigVar::CcFlags, &strings(&["-O3", "-ftree-vectorize"]));
        env.prepend(ConfigVar::CcFlags, &strings(&["-g2"]));
        env.append(ConfigVar::CcFlags, &strings(&["-fobjc-arc"]));

        assert_eq!(
            env.get(ConfigVar::CcFlags),
            strings(&["-g2", "-O3", "-ftree-vectorize", "-Wall", "-fobjc-arc"])
        );
        assert!(env.get(ConfigVar::LinkFlags).is_empty());
    }

    #[test]
    fn test_tools_flags_suffix() {
        let mut env = BuildEnvironment::new();
        env.set_tool(Tool::Cc, "clang");
        env.set_flag("osxcross", true);
        env.add_suffix(".san");

        assert_eq!(env.tool(Tool::Cc), Some("clang"));
        assert_eq!(env.tool(Tool::Ar), None);
        assert_eq!(env.flag("osxcross"), Some(true));
        assert_eq!(env.suffix(), ".san");
    }
}
