// ABOUTME: Error types for configuration loading and target resolution.
// ABOUTME: LoadError aborts startup; ResolveError is reported per config callback.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that prevent the service from starting.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("user #{index} has an empty username")]
    EmptyUsername { index: usize },

    #[error("duplicate user: {0}")]
    DuplicateUser(String),

    #[error("cluster #{index} has an empty name")]
    EmptyClusterName { index: usize },

    #[error("duplicate cluster: {0}")]
    DuplicateCluster(String),
}

/// Errors deriving a backend target for an authenticated user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("user not found: {0}")]
    UnknownUser(String),

    #[error("connection is not authenticated")]
    NotAuthenticated,

    #[error("missing cluster configuration for user {0}")]
    MissingClusterName(String),

    #[error("cluster not found: {0}")]
    ClusterNotFound(String),

    #[error("missing pod configuration for user {0}")]
    MissingPodSpec(String),
}

pub type Result<T> = std::result::Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io;

    #[test]
    fn test_read_error_display() {
        let err = LoadError::Read {
            path: PathBuf::from("/etc/sshhook/webhook.yaml"),
            source: io::Error::new(io::ErrorKind::NotFound, "file not found"),
        };
        let display = err.to_string();
        assert!(display.contains("failed to read config file"));
        assert!(display.contains("/etc/sshhook/webhook.yaml"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_duplicate_user_display() {
        let err = LoadError::DuplicateUser("alice".to_string());
        assert_eq!(err.to_string(), "duplicate user: alice");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_resolve_error_display() {
        assert_eq!(
            ResolveError::ClusterNotFound("prod".to_string()).to_string(),
            "cluster not found: prod"
        );
        assert_eq!(
            ResolveError::MissingPodSpec("alice".to_string()).to_string(),
            "missing pod configuration for user alice"
        );
    }
}
