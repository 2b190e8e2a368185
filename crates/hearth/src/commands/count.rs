//! Count command - number of stored sessions.

use anyhow::Result;

use super::Context;

/// Run the count command.
pub fn run(ctx: &Context) -> Result<()> {
    let count = ctx.backend()?.count(&ctx.table)?;

    if ctx.json_output {
        println!("{}", serde_json::json!({ "count": count }));
    } else {
        println!("{count}");
    }
    Ok(())
}
