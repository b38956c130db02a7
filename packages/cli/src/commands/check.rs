use super::open_session;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use pagecraft_editor::{validate_document, Diagnostic, DiagnosticLevel, Document};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Page document (.json)
    pub input: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn check(args: CheckArgs, cwd: &str) -> Result<()> {
    let diagnostics = diagnose(&args.input, cwd)?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&diagnostics)?);
    } else {
        println!("🔍 {} {}", "Checking".green().bold(), args.input.display());
        println!();

        for diagnostic in &diagnostics {
            let level = match diagnostic.level {
                DiagnosticLevel::Error => "error".red().bold(),
                DiagnosticLevel::Warning => "warning".yellow().bold(),
            };
            let location = diagnostic
                .block_id
                .as_deref()
                .map(|id| format!(" [{}]", id))
                .unwrap_or_default();
            println!(
                "   {}{}: {} {}",
                level,
                location.dimmed(),
                diagnostic.message,
                format!("({})", diagnostic.rule).dimmed()
            );
        }

        if diagnostics.is_empty() {
            println!("   {} No problems found", "✓".green());
        }
    }

    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    if errors > 0 {
        return Err(anyhow::anyhow!("{} error(s) found", errors));
    }
    Ok(())
}

/// Validate a document file with the configuration found in `cwd`
pub fn diagnose(input: &Path, cwd: &str) -> Result<Vec<Diagnostic>> {
    // Dangling shared style links are cleared on open, so validate the raw
    // file rather than the repaired document
    let source = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let raw = Document::from_json(&source)?;
    let session = open_session(input, cwd)?;

    Ok(validate_document(&raw, session.config()))
}
