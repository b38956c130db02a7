use super::open_session;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct StylesArgs {
    /// Page document (.json)
    pub input: PathBuf,
}

pub fn styles(args: StylesArgs, cwd: &str) -> Result<()> {
    let session = open_session(&args.input, cwd)?;
    let shared = session.shared_styles();

    if shared.is_empty() {
        println!("   No shared styles");
        return Ok(());
    }

    for style in shared {
        println!(
            "{} {} {}",
            style.name.bold(),
            style.id.dimmed(),
            format!("({})", style.block_type).cyan()
        );
        println!(
            "   {} {}",
            "updated".dimmed(),
            style.updated_at.format("%Y-%m-%d %H:%M")
        );

        let blocks = session.blocks_using_style(&style.id);
        if blocks.is_empty() {
            println!("   {}", "unused".yellow());
        }
        for block_id in blocks {
            let overridden = session.overridden_properties(&block_id);
            if overridden.is_empty() {
                println!("   {} {}", "•".green(), block_id);
            } else {
                println!(
                    "   {} {} {}",
                    "•".yellow(),
                    block_id,
                    format!("overrides {}", overridden.join(", ")).yellow()
                );
            }
        }
        println!();
    }
    Ok(())
}
