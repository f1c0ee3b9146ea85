use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Show debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true, default_value = "false")]
    verbose: bool,

    /// The command to execute
    #[command(subcommand)]
    command: CaprefCommand,
}

#[derive(Parser)]
struct BuildArgs {
    /// The path to the configuration file
    #[arg(short, long, default_value = "capref.yaml")]
    config_file: Option<PathBuf>,
}

#[derive(Parser)]
struct CleanArgs {
    /// The path to the configuration file
    #[arg(short, long, default_value = "capref.yaml")]
    config_file: Option<PathBuf>,

    /// Only print what would be deleted
    #[arg(long, default_value = "false")]
    dry_run: bool,
}

#[derive(Subcommand)]
enum CaprefCommand {
    /// Build the site, numbering captions and filling cross-references
    Build(BuildArgs),

    /// Delete the generated site
    Clean(CleanArgs),
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        CaprefCommand::Build(args) => {
            commands::build::run(&args)?;
        }
        CaprefCommand::Clean(args) => {
            commands::clean::run(&args)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
