//! Resolve options and print the configuration

use super::{CliError, OutputFormat};
use convenient_toolchain::{
    BuildEnvironment, ConfigVar, ConfigurationResolver, OptionRegistry, ResolvedConfiguration,
    SystemHost, Tool, load_options_file, parse_assignment,
};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Resolve against the real host environment and print the result
pub fn execute(
    options_file: Option<&Path>,
    assignments: &[String],
    format: OutputFormat,
) -> Result<(), CliError> {
    let mut values = match options_file {
        Some(path) => load_options_file(path)?,
        None => HashMap::new(),
    };
    for arg in assignments {
        let (key, value) = parse_assignment(arg)?;
        debug!("Option from command line: {}={}", key, value);
        let _ = values.insert(key, value);
    }

    let options = OptionRegistry::macos().build_options(&values)?;
    let host = SystemHost;
    let config = ConfigurationResolver::new(&host).resolve(&options)?;

    println!("{}", render(&config, format)?);
    Ok(())
}

/// Render a configuration in the requested format
pub fn render(config: &ResolvedConfiguration, format: OutputFormat) -> Result<String, CliError> {
    let mut env = BuildEnvironment::new();
    config.apply(&mut env);

    let out = match format {
        OutputFormat::Json => serde_json::to_string_pretty(config)?,
        OutputFormat::Shell => render_shell(&env),
        OutputFormat::Text => render_text(config, &env),
    };
    Ok(out)
}

const VARS: [ConfigVar; 6] = [
    ConfigVar::CcFlags,
    ConfigVar::LinkFlags,
    ConfigVar::AsFlags,
    ConfigVar::CppDefines,
    ConfigVar::CppPath,
    ConfigVar::Libs,
];

const TOOLS: [Tool; 5] = [Tool::Cc, Tool::Cxx, Tool::Ar, Tool::Ranlib, Tool::As];

fn render_text(config: &ResolvedConfiguration, env: &BuildEnvironment) -> String {
    let mut lines = vec![
        "📋 Configuration:".to_string(),
        format!("  Architecture:  {}", config.architecture),
        format!("  LTO:           {}", config.lto),
        format!("  Cross-compile: {}", config.cross_compile),
    ];
    if let Some(sysroot) = &config.sysroot {
        lines.push(format!("  Sysroot:       {}", sysroot.display()));
    }
    if !env.suffix().is_empty() {
        lines.push(format!("  Suffix:        {}", env.suffix()));
    }

    lines.push(String::new());
    lines.push("🔧 Toolchain:".to_string());
    for tool in TOOLS {
        if let Some(cmd) = env.tool(tool) {
            lines.push(format!("  {:<8}{}", tool.name(), cmd));
        }
    }

    lines.push(String::new());
    lines.push("🚩 Flags:".to_string());
    for var in VARS {
        lines.push(format!("  {:<11}{}", var.name(), env.get(var).join(" ")));
    }
    lines.join("\n")
}

fn render_shell(env: &BuildEnvironment) -> String {
    let tools = TOOLS
        .iter()
        .filter_map(|tool| env.tool(*tool).map(|cmd| format!("{}={}", tool.name(), shell_quote(cmd))));
    let vars = VARS
        .iter()
        .map(|var| format!("{}={}", var.name(), shell_quote(&env.get(*var).join(" "))));
    tools.chain(vars).collect::<Vec<_>>().join("\n")
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
