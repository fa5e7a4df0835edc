//! Error types for access revocation.

use thiserror::Error;

use crate::store::StoreError;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AccessError {
    /// Revoking the user would leave at least one repository without grantees.
    ///
    /// Raised before any repository is modified.
    #[error("user is the only one with access to at least one of its repositories")]
    SoleGrantee {
        username: String,
        /// Every repository where the user is the only grantee
        repositories: Vec<String>,
    },

    /// A repository update failed part way through revocation.
    ///
    /// Repositories listed in `revoked` were already updated and stay that way.
    #[error("revoked access for {username} to {revoked:?} but failed on repository {repository}")]
    RevocationIncomplete {
        username: String,
        revoked: Vec<String>,
        repository: String,
        #[source]
        source: StoreError,
    },

    /// Repositories could not be read.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AccessError {
    /// Check if this error means the revocation was refused outright.
    pub fn is_blocked(&self) -> bool {
        matches!(self, AccessError::SoleGrantee { .. })
    }

    /// Repositories that blocked the revocation, if any.
    pub fn blocking_repositories(&self) -> &[String] {
        match self {
            AccessError::SoleGrantee { repositories, .. } => repositories,
            _ => &[],
        }
    }
}

impl From<AccessError> for crate::Error {
    fn from(err: AccessError) -> Self {
        crate::Error::Access(err)
    }
}
