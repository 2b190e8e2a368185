//! Purge command - delete one session.

use anyhow::Result;
use clap::Args;

use super::Context;

/// Arguments for the purge command.
#[derive(Args, Debug)]
pub struct PurgeArgs {
    /// Session identifier
    pub id: String,
}

/// Run the purge command.
pub fn run(args: PurgeArgs, ctx: &Context) -> Result<()> {
    let store = ctx.store(ctx.backend()?);
    store.destroy(&args.id)?;

    if ctx.json_output {
        println!("{}", serde_json::json!({ "purged": args.id }));
    } else {
        println!("Purged session {}", args.id);
    }
    Ok(())
}
