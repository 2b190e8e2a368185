//! hearth - administer server-side session tables
//!
//! Main entry point for the hearth CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{count, gc, purge, show};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// hearth - administer server-side session tables
#[derive(Parser)]
#[command(name = "hearth")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to the session database
    #[arg(long, global = true, env = "HEARTH_DB", default_value = "sessions.db")]
    pub db: PathBuf,

    /// Session table name
    #[arg(long, global = true, env = "HEARTH_TABLE", default_value = "sessions")]
    pub table: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Delete sessions idle longer than the max lifetime
    Gc(gc::GcArgs),

    /// Show the stored data of one session
    Show(show::ShowArgs),

    /// Delete one session
    Purge(purge::PurgeArgs),

    /// Count stored sessions
    Count,
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "hearth=debug,hearth_session=debug,warn"
    } else {
        "hearth=info,hearth_session=info,warn"
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let ctx = commands::Context {
        db: cli.db,
        table: cli.table,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Gc(args) => gc::run(args, &ctx),
        Commands::Show(args) => show::run(args, &ctx),
        Commands::Purge(args) => purge::run(args, &ctx),
        Commands::Count => count::run(&ctx),
    }
}
