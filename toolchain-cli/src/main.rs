//! toolchain - resolve macOS build options into a toolchain configuration
//!
//! Reads `key=value` option assignments (optionally on top of a YAML options
//! file), resolves them against the host and prints the compiler commands and
//! ordered flag lists. Fatal resolution errors map to exit statuses:
//! 1 for an unsupported architecture, 255 for a missing SDK, 2 for bad options.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{Cli, Commands};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "toolchain=info,convenient_toolchain=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Resolve {
            options_file,
            assignments,
            format,
        } => commands::resolve::execute(options_file.as_deref(), &assignments, format),
        Commands::Options => commands::options::list(),
        Commands::LocateSdk { base_dir } => commands::sdk::locate(base_dir.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("❌ {e}");
        std::process::exit(e.exit_code());
    }
}
