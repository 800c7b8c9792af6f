// ABOUTME: Public-key handling for the sshhook callback service.
// ABOUTME: Parses authorized-key lines and compares keys by canonical wire bytes.

pub mod authorized;
pub mod error;
mod fingerprint;

pub use authorized::AuthorizedKey;
pub use error::{KeyError, Result};
