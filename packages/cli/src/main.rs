mod commands;
mod config;
mod project;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{extract, init, lint, ExtractArgs, InitArgs, LintArgs};

/// devup-ui CLI - zero-runtime styles extracted at build time
#[derive(Parser, Debug)]
#[command(name = "devup-ui")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new devup-ui project
    Init(InitArgs),

    /// Extract styles and rewrite modules into the output directory
    Extract(ExtractArgs),

    /// Check style sites without extracting
    Lint(LintArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| match cli.command {
            Command::Init(args) => init(args, &cwd),
            Command::Extract(args) => extract(args, &cwd),
            Command::Lint(args) => lint(args, &cwd),
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
