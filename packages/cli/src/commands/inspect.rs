use super::open_session;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pagecraft_editor::model::block_item_ids;
use pagecraft_editor::{Block, EditSession};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Page document (.json)
    pub input: PathBuf,

    /// Also list item ids of repeating content
    #[arg(short, long)]
    pub items: bool,
}

pub fn inspect(args: InspectArgs, cwd: &str) -> Result<()> {
    let session = open_session(&args.input, cwd)?;
    let doc = session.document();

    println!("📄 {}", args.input.display().to_string().bold());
    println!();

    for block in &doc.blocks {
        print_block(&session, block, 0, args.items);
    }

    println!();
    println!(
        "   {} blocks, {} shared styles",
        doc.block_count(),
        doc.page_settings.shared_styles.len()
    );
    Ok(())
}

fn print_block(session: &EditSession, block: &Block, depth: usize, show_items: bool) {
    let indent = "  ".repeat(depth + 1);
    let mut line = format!(
        "{}{} {} {}",
        indent,
        block.block_type.to_string().cyan(),
        block.id,
        format!("({})", block.variant).dimmed()
    );

    if let Some(style) = block
        .shared_style_id
        .as_deref()
        .and_then(|id| session.shared_style(id))
    {
        line.push_str(&format!(" {}", format!("⟶ {}", style.name).magenta()));
        if session.has_overrides(&block.id) {
            line.push_str(&format!(" {}", "overridden".yellow()));
        }
    }
    if session.is_protected(&block.id) {
        line.push_str(&format!(" {}", "protected".red()));
    }
    println!("{}", line);

    if show_items {
        for item_id in block_item_ids(block) {
            println!("{}  • {}", indent, item_id.dimmed());
        }
    }

    for child in &block.children {
        print_block(session, child, depth + 1, show_items);
    }
}
