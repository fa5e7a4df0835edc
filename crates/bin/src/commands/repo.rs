//! Repository commands.
//!
//! Repositories are only ever created with at least one grantee, and every
//! grantee must be an existing user.

use gatehouse::{Repository, UserManager};

use super::CommandResult;
use crate::backend::{OpenStore, manager, open_store};
use crate::cli::{Format, GlobalArgs, RepoCommand};
use crate::output::{print_json, print_table};

pub async fn run(args: &GlobalArgs, command: &RepoCommand) -> CommandResult {
    let store = open_store(args).await?;
    let manager = manager(args, &store);

    match command {
        RepoCommand::Create { name, users } => create(args, &store, &manager, name, users).await,
        RepoCommand::Grant { repository, user } => {
            grant(args, &store, &manager, repository, user).await
        }
        RepoCommand::List => list(args, &manager).await,
    }
}

async fn create(
    args: &GlobalArgs,
    store: &OpenStore,
    manager: &UserManager,
    name: &str,
    users: &[String],
) -> CommandResult {
    for user in users {
        manager.get_user(user).await?;
    }

    let repository = Repository::new(name, users.iter().map(String::as_str));
    manager
        .store()
        .insert_repository(repository.clone())
        .await
        .map_err(gatehouse::Error::from)?;
    store.persist().await?;
    tracing::info!(repository = %name, users = users.len(), "Created repository");

    match args.format {
        Format::Human => println!("Created repository {name} for {}", users.join(", ")),
        Format::Json => print_json(&repository)?,
    }
    Ok(())
}

async fn grant(
    args: &GlobalArgs,
    store: &OpenStore,
    manager: &UserManager,
    name: &str,
    user: &str,
) -> CommandResult {
    manager.get_user(user).await?;
    let mut repository = manager
        .store()
        .find_repository(name)
        .await
        .map_err(gatehouse::Error::from)?;

    let granted = !repository.grants(user);
    if granted {
        repository.users.push(user.to_string());
        manager
            .store()
            .update_repository_users(name, repository.users.clone())
            .await
            .map_err(gatehouse::Error::from)?;
        store.persist().await?;
        tracing::info!(repository = %name, user = %user, "Granted repository access");
    }

    match args.format {
        Format::Human if granted => println!("Granted {user} access to {name}"),
        Format::Human => println!("{user} already has access to {name}"),
        Format::Json => print_json(&repository)?,
    }
    Ok(())
}

async fn list(args: &GlobalArgs, manager: &UserManager) -> CommandResult {
    let repositories = manager
        .store()
        .list_repositories()
        .await
        .map_err(gatehouse::Error::from)?;

    match args.format {
        Format::Human => {
            if repositories.is_empty() {
                println!("No repositories found.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = repositories
                .iter()
                .map(|repository| vec![repository.name.clone(), repository.users.join(", ")])
                .collect();
            print_table(&["NAME", "USERS"], &rows);
        }
        Format::Json => print_json(&repositories)?,
    }
    Ok(())
}
