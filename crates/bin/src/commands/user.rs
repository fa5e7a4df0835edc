//! User commands: create, remove, show and list.

use gatehouse::Key;

use super::{CommandResult, persisted};
use crate::backend::{manager, open_store};
use crate::cli::{Format, GlobalArgs, UserCommand};
use crate::output::{abbreviate, print_json, print_table};

pub async fn run(args: &GlobalArgs, command: &UserCommand) -> CommandResult {
    match command {
        UserCommand::Create { name, keys } => create(args, name, keys).await,
        UserCommand::Remove { name } => remove(args, name).await,
        UserCommand::Show { name } => show(args, name).await,
        UserCommand::List => list(args).await,
    }
}

async fn create(args: &GlobalArgs, name: &str, keys: &[(String, String)]) -> CommandResult {
    let store = open_store(args).await?;
    let manager = manager(args, &store);

    let keys = keys
        .iter()
        .map(|(name, content)| Key::new(name.as_str(), content.as_str()))
        .collect();
    let user = persisted(&store, manager.create_user(name, keys).await).await?;

    match args.format {
        Format::Human => println!("Created user {} with {} key(s)", user.name, user.keys.len()),
        Format::Json => print_json(&user)?,
    }
    Ok(())
}

async fn remove(args: &GlobalArgs, name: &str) -> CommandResult {
    let store = open_store(args).await?;
    let manager = manager(args, &store);

    persisted(&store, manager.remove_user(name).await).await?;

    match args.format {
        Format::Human => println!("Removed user {name}"),
        Format::Json => print_json(&serde_json::json!({ "removed": name }))?,
    }
    Ok(())
}

async fn show(args: &GlobalArgs, name: &str) -> CommandResult {
    let store = open_store(args).await?;
    let manager = manager(args, &store);

    let user = manager.get_user(name).await?;
    let repositories: Vec<String> = manager
        .store()
        .find_repositories_by_user(name)
        .await
        .map_err(gatehouse::Error::from)?
        .into_iter()
        .map(|repository| repository.name)
        .collect();

    match args.format {
        Format::Human => {
            println!("User:          {}", user.name);
            println!("Repositories:  {}", repositories.join(", "));
            println!();
            if user.keys.is_empty() {
                println!("No keys.");
            } else {
                let rows: Vec<Vec<String>> = user
                    .keys
                    .iter()
                    .map(|key| vec![key.name.clone(), abbreviate(&key.content, 60)])
                    .collect();
                print_table(&["KEY", "CONTENT"], &rows);
            }
        }
        Format::Json => print_json(&serde_json::json!({
            "name": user.name,
            "keys": user.keys,
            "repositories": repositories,
        }))?,
    }
    Ok(())
}

async fn list(args: &GlobalArgs) -> CommandResult {
    let store = open_store(args).await?;
    let users = manager(args, &store).list_users().await?;

    match args.format {
        Format::Human => {
            if users.is_empty() {
                println!("No users found.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = users
                .iter()
                .map(|user| vec![user.name.clone(), user.keys.len().to_string()])
                .collect();
            print_table(&["NAME", "KEYS"], &rows);
        }
        Format::Json => print_json(&users)?,
    }
    Ok(())
}
