//! Command-line interface
//!
//! - `resolve`: resolve options and print the configuration
//! - `options`: list every option with its default
//! - `locate-sdk`: show which Vulkan SDK MoltenVK would be taken from

use clap::{Parser, Subcommand, ValueEnum};
use convenient_toolchain::{OptionError, ResolveError};
use std::path::PathBuf;
use thiserror::Error;

pub mod options;
pub mod resolve;
pub mod sdk;

/// Resolve macOS build options into compiler commands and flags
#[derive(Parser)]
#[command(name = "toolchain")]
#[command(about = "Resolve macOS build options into a toolchain configuration")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve options and print the configuration
    Resolve {
        /// YAML file mapping option names to values
        #[arg(short = 'f', long, env = "TOOLCHAIN_OPTIONS_FILE")]
        options_file: Option<PathBuf>,

        /// Option assignments, e.g. target=release arch=arm64
        assignments: Vec<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List declared options and their defaults
    Options,

    /// Show the Vulkan SDK that would provide MoltenVK
    LocateSdk {
        /// Directory holding version-named SDK installs (default: ~/VulkanSDK)
        base_dir: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing
    Text,
    /// Resolved configuration as JSON
    Json,
    /// Folded flag lists as shell variable assignments
    Shell,
}

/// Errors surfaced to the user
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Options(#[from] OptionError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Failed to render configuration: {0}")]
    Render(#[from] serde_json::Error),

    #[error("No SDK with {0} found")]
    SdkNotFound(String),
}

impl CliError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Resolve(e) => e.exit_code(),
            Self::Options(_) => 2,
            Self::Render(_) => 1,
            Self::SdkNotFound(_) => convenient_toolchain::error::EXIT_DISCOVERY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_resolve() {
        let cli = Cli::try_parse_from([
            "toolchain",
            "resolve",
            "--format",
            "json",
            "target=release",
            "arch=arm64",
        ])
        .unwrap();

        match cli.command {
            Commands::Resolve {
                assignments, format, ..
            } => {
                assert_eq!(assignments, vec!["target=release", "arch=arm64"]);
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("expected resolve"),
        }
    }

    #[test]
    fn test_exit_codes() {
        let unsupported: CliError = ResolveError::UnsupportedArchitecture {
            requested: "armv7".to_string(),
            supported: vec!["x86_64".to_string(), "arm64".to_string()],
        }
        .into();
        assert_eq!(unsupported.exit_code(), 1);
        assert_eq!(CliError::from(ResolveError::MoltenVkNotFound).exit_code(), 255);
        assert_eq!(
            CliError::from(OptionError::Unknown("x".to_string())).exit_code(),
            2
        );
    }
}
