// ABOUTME: Authorized-key line parsing and canonical comparison.
// ABOUTME: Two keys match when their SSH wire encodings are byte-identical.

use crate::error::{KeyError, Result};
use crate::fingerprint::fingerprint_bytes;
use ssh_key::PublicKey;

/// A public key parsed from the single-line authorized-key format
/// (`[options] algorithm base64-material [comment]`).
///
/// The canonical form is the SSH wire encoding of the key data. It excludes
/// the comment and any options, so equality on it is independent of how the
/// key happened to be written down.
#[derive(Debug, Clone)]
pub struct AuthorizedKey {
    public_key: PublicKey,
    canonical: Vec<u8>,
}

impl AuthorizedKey {
    /// Parse the first usable key line in `input`.
    ///
    /// Blank lines and `#` comment lines are skipped, as are lines that do
    /// not hold a valid key. Runs of spaces or tabs between fields are
    /// accepted, and a leading option list (`no-pty,from="10.0.0.1"`) is
    /// ignored.
    ///
    /// # Errors
    /// Returns `KeyError::Empty` if there is no key line, or
    /// `KeyError::Parse` with the last failure if no line is a valid key.
    pub fn parse(input: &str) -> Result<Self> {
        let mut last_error = None;
        for line in input.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_line(line) {
                Ok(public_key) => return Self::from_public_key(public_key),
                Err(error) => last_error = Some(error),
            }
        }
        Err(last_error.map_or(KeyError::Empty, KeyError::Parse))
    }

    /// Wrap an already-parsed public key.
    ///
    /// # Errors
    /// Returns `KeyError::Encode` if the key cannot be wire-encoded.
    pub fn from_public_key(public_key: PublicKey) -> Result<Self> {
        let canonical = public_key.to_bytes().map_err(KeyError::Encode)?;
        Ok(Self {
            public_key,
            canonical,
        })
    }

    /// The SSH wire encoding of the key data.
    pub fn canonical_bytes(&self) -> &[u8] {
        &self.canonical
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Lowercase hex SHA256 of the canonical bytes.
    pub fn fingerprint(&self) -> String {
        fingerprint_bytes(&self.canonical)
    }

    /// Byte-exact comparison of canonical key material.
    pub fn matches(&self, other: &AuthorizedKey) -> bool {
        self.canonical == other.canonical
    }
}

/// Try the line as a bare key first, then with a leading option list removed.
fn parse_line(line: &str) -> std::result::Result<PublicKey, ssh_key::Error> {
    match parse_key_fields(line) {
        Ok(public_key) => Ok(public_key),
        Err(error) => match strip_options(line) {
            Some(rest) => parse_key_fields(rest),
            None => Err(error),
        },
    }
}

fn parse_key_fields(text: &str) -> std::result::Result<PublicKey, ssh_key::Error> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    PublicKey::from_openssh(&normalized)
}

/// Everything after the option list, or `None` if nothing follows it.
///
/// Options end at the first unquoted space or tab. Double quotes may be
/// escaped with a backslash.
fn strip_options(line: &str) -> Option<&str> {
    let mut in_quote = false;
    let mut previous = None;
    for (index, c) in line.char_indices() {
        if !in_quote && (c == ' ' || c == '\t') {
            let rest = line[index..].trim_start_matches([' ', '\t']);
            return (!rest.is_empty()).then_some(rest);
        }
        if c == '"' && previous != Some('\\') {
            in_quote = !in_quote;
        }
        previous = Some(c);
    }
    None
}
