// ABOUTME: Error types for public-key operations using thiserror.
// ABOUTME: Distinguishes empty input, unparseable key text and encoding failures.

use thiserror::Error;

/// Errors that can occur while handling an authorized-key line.
#[derive(Error, Debug)]
pub enum KeyError {
    /// The input contained no key line at all (only blanks or `#` comments).
    #[error("no public key found in input")]
    Empty,

    /// The key line could not be parsed.
    #[error("failed to parse public key: {0}")]
    Parse(#[source] ssh_key::Error),

    /// The parsed key could not be re-encoded to wire format.
    #[error("failed to encode public key: {0}")]
    Encode(#[source] ssh_key::Error),
}

/// Result type alias using KeyError.
pub type Result<T> = std::result::Result<T, KeyError>;
