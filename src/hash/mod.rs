//! Hash algorithms exposed by the crate.
//!
//! Two digest algorithms are implemented, both pure Rust with no external
//! crate dependency: SHA-256 (the default used by new callers) and SHA-1
//! (kept for compatibility with legacy message digests consumed by the
//! discrete-log signing layer, see [`crate::dlpk::dsa`]).

pub mod sha1;
pub mod sha256;

/// Re-export of the SHA-256 convenience function.
pub use sha256::core::sha256;

/// Re-export of the SHA-1 convenience function.
pub use sha1::core::sha1;

/// Uniform digest/hash-function handle consumed by the DSA signing layer
/// and by cipher key expansion.
///
/// Mirrors an external hash-context contract (`reset`/`update`/`final`)
/// but is expressed as a single one-shot `digest` call, since neither
/// consumer in this crate needs incremental hashing.
pub trait Hash {
    /// Length of the digest this hash function produces, in bytes.
    const DIGEST_LENGTH: usize;

    /// Hashes `input` in one call and returns the digest.
    fn digest(input: &[u8]) -> Vec<u8>;
}

/// SHA-256 as a [`Hash`] implementation.
pub struct Sha256;

impl Hash for Sha256 {
    const DIGEST_LENGTH: usize = 32;

    fn digest(input: &[u8]) -> Vec<u8> {
        sha256(input).to_be_bytes().to_vec()
    }
}

/// SHA-1 as a [`Hash`] implementation.
pub struct Sha1;

impl Hash for Sha1 {
    const DIGEST_LENGTH: usize = 20;

    fn digest(input: &[u8]) -> Vec<u8> {
        sha1(input).to_vec()
    }
}
