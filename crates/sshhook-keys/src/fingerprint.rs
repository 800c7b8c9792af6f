// ABOUTME: SSH public key fingerprint computation.
// ABOUTME: SHA256 over the wire encoding, hex encoded, matching OpenSSH's digest.

use sha2::{Digest, Sha256};

/// SHA256 of SSH wire-encoded key data, lowercase hex.
///
/// This is the same input OpenSSH hashes for its `SHA256:` fingerprints, so
/// the digest works for any key algorithm.
pub(crate) fn fingerprint_bytes(wire_data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(wire_data);
    hex::encode(hasher.finalize())
}
