//! Rebuild command - regenerates the authorized_keys file from the store.

use super::CommandResult;
use crate::backend::{manager, open_store};
use crate::cli::{Format, GlobalArgs};
use crate::output::print_json;

pub async fn run(args: &GlobalArgs) -> CommandResult {
    let store = open_store(args).await?;
    let manager = manager(args, &store);

    let keys = manager.rebuild_authorized_keys().await?;
    let path = manager.authorized_keys().path().display().to_string();

    match args.format {
        Format::Human => println!("Wrote {keys} key(s) to {path}"),
        Format::Json => print_json(&serde_json::json!({ "path": path, "keys": keys }))?,
    }
    Ok(())
}
