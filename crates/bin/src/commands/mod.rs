//! Command implementations.

pub mod key;
pub mod rebuild;
pub mod repo;
pub mod user;

use crate::backend::OpenStore;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Persist the store, then hand back the outcome of a mutating operation.
///
/// The store is saved even when the operation failed, since a failure in
/// the authorized_keys stage still leaves a committed store change behind.
async fn persisted<T>(
    store: &OpenStore,
    result: gatehouse::Result<T>,
) -> Result<T, Box<dyn std::error::Error>> {
    store.persist().await?;
    Ok(result?)
}
