//! Revocation of a user's repository grants.
//!
//! Removing a user must never leave a repository without grantees. The work
//! is split in two phases:
//!
//! 1. [`RevocationPlan::classify`] inspects every repository that grants the
//!    user and sorts it into *blocking* (the user is its only grantee) or
//!    *revocable* (other grantees remain). This step is pure.
//! 2. [`RevocationPlan::apply`] refuses if anything is blocking, and
//!    otherwise writes the reduced grantee lists back to the store.
//!
//! Because nothing is written until classification is complete, a blocked
//! revocation leaves every repository untouched.

pub mod errors;

use tracing::{debug, info};

pub use errors::AccessError;

use crate::store::{IdentityStore, Repository};

/// A pending grantee-list update for one repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Revocation {
    pub repository: String,
    /// Grantees left once the user is removed, in their original order
    pub remaining: Vec<String>,
}

/// Outcome of classifying a user's repositories.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevocationPlan {
    username: String,
    revocations: Vec<Revocation>,
    blocking: Vec<String>,
}

impl RevocationPlan {
    /// Classify `repositories` for revoking `username`.
    ///
    /// Repositories that do not grant the user are ignored. A user listed
    /// more than once in the same repository counts as a single grant.
    pub fn classify(username: &str, repositories: &[Repository]) -> Self {
        let mut revocations = Vec::new();
        let mut blocking = Vec::new();

        for repository in repositories.iter().filter(|r| r.grants(username)) {
            let remaining: Vec<String> = repository
                .users
                .iter()
                .filter(|user| user.as_str() != username)
                .cloned()
                .collect();

            if remaining.is_empty() {
                blocking.push(repository.name.clone());
            } else {
                revocations.push(Revocation {
                    repository: repository.name.clone(),
                    remaining,
                });
            }
        }

        Self {
            username: username.to_string(),
            revocations,
            blocking,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Updates that will be written if the plan is applied.
    pub fn revocations(&self) -> &[Revocation] {
        &self.revocations
    }

    /// Repositories where the user is the only grantee.
    pub fn blocking(&self) -> &[String] {
        &self.blocking
    }

    pub fn is_blocked(&self) -> bool {
        !self.blocking.is_empty()
    }

    /// Write the planned updates to `store`.
    ///
    /// Returns the names of the repositories that were updated. A blocked
    /// plan fails with [`AccessError::SoleGrantee`] without writing anything.
    /// Updates are applied one repository at a time; the first failure stops
    /// the loop and is reported together with the repositories already done.
    pub async fn apply(self, store: &dyn IdentityStore) -> Result<Vec<String>, AccessError> {
        if self.is_blocked() {
            return Err(AccessError::SoleGrantee {
                username: self.username,
                repositories: self.blocking,
            });
        }

        let mut revoked = Vec::with_capacity(self.revocations.len());
        for revocation in self.revocations {
            if let Err(source) = store
                .update_repository_users(&revocation.repository, revocation.remaining)
                .await
            {
                return Err(AccessError::RevocationIncomplete {
                    username: self.username,
                    revoked,
                    repository: revocation.repository,
                    source,
                });
            }
            debug!(
                user = %self.username,
                repository = %revocation.repository,
                "Revoked repository access"
            );
            revoked.push(revocation.repository);
        }

        if !revoked.is_empty() {
            info!(user = %self.username, count = revoked.len(), "Revoked repository access");
        }
        Ok(revoked)
    }
}

/// Look up every repository granting `username` and classify them.
pub async fn plan_revocation(
    store: &dyn IdentityStore,
    username: &str,
) -> Result<RevocationPlan, AccessError> {
    let repositories = store.find_repositories_by_user(username).await?;
    Ok(RevocationPlan::classify(username, &repositories))
}

/// Revoke `username` from all their repositories, or from none of them.
pub async fn revoke_access(
    store: &dyn IdentityStore,
    username: &str,
) -> Result<Vec<String>, AccessError> {
    plan_revocation(store, username).await?.apply(store).await
}
