use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use arbor_merge::{diff_identity, merge, IdentityChange, IdentityDiff};
use arbor_store::{read_commands, Store, StoreConfig, StoreEvent};
use arbor_types::Value;
use colored::Colorize;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Merge(args) => cmd_merge(args, cli.format),
        Command::Replay(args) => cmd_replay(args, cli.format),
        Command::Diff(args) => cmd_diff(args, cli.format),
    }
}

fn cmd_merge(args: MergeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let target = read_document(&args.target, args.tagged)?;
    let source = read_document(&args.source, args.tagged)?;
    let merged = merge(&target, &source);

    if args.changes {
        let diff = diff_identity(&target, &merged);
        match format {
            OutputFormat::Text => print_changes(&diff),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&diff)?),
        }
    } else {
        println!("{}", merged.to_json_pretty()?);
    }
    Ok(())
}

fn cmd_replay(args: ReplayArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("loading store config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    let (store, events) = replay(&args.commands, config)?;
    let changed = events.iter().filter(|e| e.changed).count();

    match format {
        OutputFormat::Text => {
            println!(
                "{} Replayed {} commands ({} changed the state)",
                "✓".green().bold(),
                events.len().to_string().bold(),
                changed
            );
            println!("  Revision: {}", store.revision().to_string().yellow());
            println!("{}", store.state().to_json_pretty()?);
        }
        OutputFormat::Json => {
            let report = serde_json::json!({
                "revision": store.revision(),
                "changed": changed,
                "state": serde_json::Value::from(&store.state()),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn cmd_diff(args: DiffArgs, format: OutputFormat) -> anyhow::Result<()> {
    let before = read_document(&args.before, args.tagged)?;
    let after = read_document(&args.after, args.tagged)?;
    let merged = merge(&before, &after);
    let diff = diff_identity(&before, &merged);

    match format {
        OutputFormat::Text => {
            if diff.is_empty() {
                println!("{} No changes: the merged document is the original.", "✓".green());
                return Ok(());
            }
            print_changes(&diff);
            println!(
                "\n{} shared, {} replaced, {} added",
                diff.shared().count().to_string().green(),
                diff.replacements().to_string().yellow(),
                diff.additions().to_string().cyan()
            );
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&diff)?),
    }
    Ok(())
}

/// Read a JSON document, optionally recognising `$type` records.
fn read_document(path: &Path, tagged: bool) -> anyhow::Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let value = if tagged {
        let json: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        Value::from_json_tagged(json)
    } else {
        Value::from_json_str(&text).with_context(|| format!("parsing {}", path.display()))?
    };
    Ok(value)
}

/// Apply every command in the log at `path` to a fresh store.
fn replay(path: &Path, config: StoreConfig) -> anyhow::Result<(Store, Vec<StoreEvent>)> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let commands = read_commands(BufReader::new(file))
        .with_context(|| format!("reading commands from {}", path.display()))?;
    let store = Store::new(config)?;
    let events = store.dispatch_all(commands)?;
    Ok((store, events))
}

fn print_changes(diff: &IdentityDiff) {
    for change in &diff.changes {
        match change {
            IdentityChange::Shared { path } => {
                println!("  {} {}", "shared".green(), path);
            }
            IdentityChange::Replaced { path, before, after } => {
                println!("  {} {} ({} -> {})", "replaced".yellow(), path, before, after);
            }
            IdentityChange::Added { path, kind } => {
                println!("  {} {} ({})", "added".cyan(), path, kind);
            }
            IdentityChange::Removed { path, kind } => {
                println!("  {} {} ({})", "removed".red(), path, kind);
            }
        }
    }
}
