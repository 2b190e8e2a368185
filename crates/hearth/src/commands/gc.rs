//! Gc command - sweep expired sessions.

use anyhow::Result;
use clap::Args;
use console::style;
use serde::Serialize;

use super::Context;

/// Arguments for the gc command.
#[derive(Args, Debug)]
pub struct GcArgs {
    /// Idle seconds after which a session is expired
    #[arg(long, default_value = "7200")]
    pub max_lifetime: i64,
}

#[derive(Debug, Serialize)]
struct GcOutput {
    deleted: usize,
    max_lifetime: i64,
}

/// Run the gc command.
pub fn run(args: GcArgs, ctx: &Context) -> Result<()> {
    let store = ctx.store(ctx.backend()?);
    let deleted = store.gc(args.max_lifetime)?;
    tracing::info!(deleted, max_lifetime = args.max_lifetime, "Session sweep finished");

    if ctx.json_output {
        let output = GcOutput {
            deleted,
            max_lifetime: args.max_lifetime,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!(
            "Deleted {} expired session(s)",
            style(deleted).bold()
        );
    }
    Ok(())
}
