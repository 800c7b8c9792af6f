// ABOUTME: Password and public-key credential checks against the directory.
// ABOUTME: Every failure collapses to AuthDecision::Rejected with no detail for the caller.

use crate::directory::{Directory, UserRecord};
use sshhook_keys::AuthorizedKey;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of a credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    Accepted {
        identity: String,
        metadata: BTreeMap<String, String>,
    },
    Rejected,
}

impl AuthDecision {
    pub(crate) fn accept(user: &UserRecord) -> Self {
        Self::Accepted {
            identity: user.username.clone(),
            metadata: user.metadata.clone(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn identity(&self) -> Option<&str> {
        match self {
            Self::Accepted { identity, .. } => Some(identity),
            Self::Rejected => None,
        }
    }

    pub fn metadata(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Accepted { metadata, .. } => Some(metadata),
            Self::Rejected => None,
        }
    }
}

/// Credential checks over a shared, read-only [`Directory`].
#[derive(Debug, Clone)]
pub struct Validator {
    directory: Arc<Directory>,
}

impl Validator {
    pub fn new(directory: Arc<Directory>) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Check an already-decoded password.
    pub fn validate_password(&self, username: &str, supplied: &[u8]) -> AuthDecision {
        let Some(user) = self.directory.find_user(username) else {
            info!(%username, "Password auth rejected: user not found");
            return AuthDecision::Rejected;
        };

        if !self.password_matches(&user.password, supplied) {
            info!(%username, "Password auth rejected: invalid password");
            return AuthDecision::Rejected;
        }

        AuthDecision::accept(user)
    }

    /// Check a public key offered in authorized-key format.
    pub fn validate_public_key(&self, username: &str, supplied: &str) -> AuthDecision {
        let Some(user) = self.directory.find_user(username) else {
            info!(%username, "Public key auth rejected: user not found");
            return AuthDecision::Rejected;
        };

        let Some(configured) = user.public_key.as_deref() else {
            info!(%username, "Public key auth rejected: no public key configured");
            return AuthDecision::Rejected;
        };

        let offered = match AuthorizedKey::parse(supplied) {
            Ok(key) => key,
            Err(error) => {
                info!(%username, %error, "Public key auth rejected: client key does not parse");
                return AuthDecision::Rejected;
            }
        };

        let expected = match AuthorizedKey::parse(configured) {
            Ok(key) => key,
            Err(error) => {
                info!(%username, %error, "Public key auth rejected: configured key does not parse");
                return AuthDecision::Rejected;
            }
        };

        if !offered.matches(&expected) {
            info!(
                %username,
                fingerprint = %offered.fingerprint(),
                "Public key auth rejected: key mismatch"
            );
            return AuthDecision::Rejected;
        }

        debug!(%username, fingerprint = %offered.fingerprint(), "Public key matched");
        AuthDecision::accept(user)
    }

    // Plaintext byte equality. Swap this for a constant-time or hashed
    // comparison to harden password checks.
    fn password_matches(&self, stored: &str, supplied: &[u8]) -> bool {
        stored.as_bytes() == supplied
    }
}
