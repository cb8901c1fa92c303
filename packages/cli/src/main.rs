mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{diff, inspect, patterns, DiffArgs, InspectArgs, PatternsArgs};

/// Neo Page Builder CLI - offline tools over rendered page markup
#[derive(Parser, Debug)]
#[command(name = "npb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rebuild a rendered page and check its invariants
    Inspect(InspectArgs),

    /// Show the view patches between two rendered pages
    Diff(DiffArgs),

    /// List the patterns known to the registry
    Patterns(PatternsArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| {
            let cwd = cwd.display().to_string();
            match cli.command {
                Command::Inspect(args) => inspect(args, &cwd),
                Command::Diff(args) => diff(args, &cwd),
                Command::Patterns(args) => patterns(args, &cwd),
            }
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
