//! Key commands.

use gatehouse::Key;

use super::{CommandResult, persisted};
use crate::backend::{manager, open_store};
use crate::cli::{Format, GlobalArgs, KeyCommand};
use crate::output::print_json;

pub async fn run(args: &GlobalArgs, command: &KeyCommand) -> CommandResult {
    let store = open_store(args).await?;
    let manager = manager(args, &store);

    match command {
        KeyCommand::Add {
            user,
            name,
            content,
        } => {
            let key = Key::new(name.as_str(), content.as_str());
            persisted(&store, manager.add_key(user, key).await).await?;
            match args.format {
                Format::Human => println!("Added key {name} to user {user}"),
                Format::Json => print_json(&serde_json::json!({ "user": user, "added": name }))?,
            }
        }
        KeyCommand::Remove { user, name } => {
            persisted(&store, manager.remove_key(user, name).await).await?;
            match args.format {
                Format::Human => println!("Removed key {name} from user {user}"),
                Format::Json => {
                    print_json(&serde_json::json!({ "user": user, "removed": name }))?
                }
            }
        }
    }
    Ok(())
}
