//! Show command - print one session's data.

use anyhow::Result;
use clap::Args;
use console::Style;

use super::Context;

/// Arguments for the show command.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Session identifier
    pub id: String,
}

/// Run the show command.
pub fn run(args: ShowArgs, ctx: &Context) -> Result<()> {
    let store = ctx.store(ctx.backend()?);
    let blob = store.read(&args.id)?;

    if blob.is_empty() {
        if ctx.json_output {
            println!("null");
        } else {
            println!("No session {}", args.id);
        }
        return Ok(());
    }

    let map = hearth_session::decode_map(&blob)?;
    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!("Session {}", args.id);
    println!("{}", dim.apply_to("─".repeat(40)));
    for (key, value) in &map {
        println!("  {} {}", dim.apply_to(format!("{key}:")), serde_json::to_string(value)?);
    }
    if ctx.verbose {
        println!("{}", dim.apply_to(format!("{} key(s), {} bytes", map.len(), blob.len())));
    }
    Ok(())
}
