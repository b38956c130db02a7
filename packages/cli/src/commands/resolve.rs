use super::open_session;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use pagecraft_editor::StyleTarget;
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Page document (.json)
    pub input: PathBuf,

    /// Block id
    pub block: String,

    /// Resolve for the item at this index
    #[arg(short, long)]
    pub item: Option<usize>,

    /// Resolve for a field of the item (requires --item)
    #[arg(short, long, requires = "item")]
    pub field: Option<String>,

    /// Show which cascade level each property came from
    #[arg(short, long)]
    pub explain: bool,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    pub format: String,
}

pub fn resolve(args: ResolveArgs, cwd: &str) -> Result<()> {
    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&resolve_json(&args, cwd)?)?);
        return Ok(());
    }

    let mut session = open_session(&args.input, cwd)?;
    let target = target_of(&args);

    if args.explain {
        let explained = session
            .explain_style(&args.block, &target)
            .ok_or_else(|| not_found(&args.block, &target))?;
        for (key, property) in explained {
            println!(
                "   {}: {} {}",
                key.cyan(),
                property.value,
                format!("[{}]", property.level).dimmed()
            );
        }
        return Ok(());
    }

    let styles = session
        .resolve_style(&args.block, &target)
        .ok_or_else(|| not_found(&args.block, &target))?;
    for (key, value) in styles {
        println!("   {}: {}", key.cyan(), value);
    }
    Ok(())
}

/// JSON form of the `resolve` output. With `--explain` every property maps
/// to `{ value, level }`, otherwise to its resolved string.
pub fn resolve_json(args: &ResolveArgs, cwd: &str) -> Result<Value> {
    let mut session = open_session(&args.input, cwd)?;
    let target = target_of(args);

    if args.explain {
        let explained = session
            .explain_style(&args.block, &target)
            .ok_or_else(|| not_found(&args.block, &target))?;
        let json: serde_json::Map<String, Value> = explained
            .into_iter()
            .map(|(key, property)| {
                (
                    key,
                    json!({
                        "value": property.value,
                        "level": property.level.to_string(),
                    }),
                )
            })
            .collect();
        return Ok(Value::Object(json));
    }

    let styles = session
        .resolve_style(&args.block, &target)
        .ok_or_else(|| not_found(&args.block, &target))?;
    Ok(serde_json::to_value(styles)?)
}

fn target_of(args: &ResolveArgs) -> StyleTarget {
    match (args.item, &args.field) {
        (Some(item), Some(field)) => StyleTarget::field(item, field.clone()),
        (Some(item), None) => StyleTarget::Item(item),
        (None, _) => StyleTarget::Block,
    }
}

fn not_found(block: &str, target: &StyleTarget) -> anyhow::Error {
    match target {
        StyleTarget::Block => anyhow!("Block not found: {}", block),
        StyleTarget::Item(index) | StyleTarget::Field { item: index, .. } => {
            anyhow!("Block {} has no item {}", block, index)
        }
    }
}
