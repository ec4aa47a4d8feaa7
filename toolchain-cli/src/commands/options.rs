//! List declared options

use super::CliError;
use convenient_toolchain::{OptionKind, OptionRegistry};

/// Print every option with kind and default
pub fn list() -> Result<(), CliError> {
    let registry = OptionRegistry::macos();
    for decl in registry.declarations() {
        let kind = match decl.kind {
            OptionKind::Bool => "yes|no".to_string(),
            OptionKind::Enum(values) => values.join("|"),
            OptionKind::Str => "string".to_string(),
        };
        println!("{:<24} {:<32} default: {:?}", decl.name, kind, decl.default);
        println!("{:<24} {}", "", decl.help);
        if !decl.aliases.is_empty() {
            println!("{:<24} aliases: {}", "", decl.aliases.join(", "));
        }
    }
    Ok(())
}
