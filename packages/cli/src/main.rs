use clap::{Parser, Subcommand};
use colored::Colorize;
use pagecraft_cli::commands::{check, inspect, resolve, styles, CheckArgs, InspectArgs, ResolveArgs, StylesArgs};

/// Pagecraft CLI - inspect and check page builder documents
#[derive(Parser, Debug)]
#[command(name = "pagecraft")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the block tree
    Inspect(InspectArgs),

    /// Print the resolved styles of a block, item or item field
    Resolve(ResolveArgs),

    /// Validate a document
    Check(CheckArgs),

    /// List shared styles and the blocks bound to them
    Styles(StylesArgs),
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

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.display().to_string(),
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Inspect(args) => inspect(args, &cwd),
        Command::Resolve(args) => resolve(args, &cwd),
        Command::Check(args) => check(args, &cwd),
        Command::Styles(args) => styles(args, &cwd),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
